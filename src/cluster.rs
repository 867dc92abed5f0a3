use std::fmt;
use std::io::{Cursor, Read};

use bitreader::BitReader;
use byteorder::{LittleEndian, ReadBytesExt};
use tracing::debug;
use xz2::read::XzDecoder;

use crate::errors::{Error, Result};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None = 0,
    LZMA2 = 4,
}

impl Compression {
    pub fn from_raw(raw: u8) -> Result<Compression> {
        match raw {
            0 | 1 => Ok(Compression::None),
            4 => Ok(Compression::LZMA2),
            other => Err(Error::UnknownCompression(other)),
        }
    }
}

/// A cluster of blobs
///
/// Within an ZIM archive, clusters contain several blobs of data that are all
/// compressed together. Each blob is the data for one directory entry.
///
/// A cluster is fully materialized on construction: compressed bodies are
/// decompressed once into an owned buffer, raw bodies keep only their file
/// range and are re-sliced from the master view on each read. Either way the
/// value is immutable afterwards, which is what lets the archive share
/// clusters out of its cache.
pub struct Cluster {
    compression: Compression,
    extended: bool,
    /// file offset of the first body byte (right after the info byte)
    body_start: u64,
    /// file offset one past the cluster
    end: u64,
    /// blob offsets relative to the body start; the last entry is the end of
    /// the final blob, so `blob_offsets.len() - 1` blobs are addressable
    blob_offsets: Vec<u64>,
    decompressed: Option<Vec<u8>>,
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("compression", &self.compression)
            .field("extended", &self.extended)
            .field("body_start", &self.body_start)
            .field("end", &self.end)
            .field("blob_count", &self.blob_count())
            .field(
                "decompressed len",
                &self.decompressed.as_ref().map(|d| d.len()),
            )
            .finish()
    }
}

impl Cluster {
    /// Decodes the cluster at `cluster_list[idx]`.
    ///
    /// The cluster's extent runs to the next cluster's offset, or to
    /// `checksum_pos` for the last one.
    pub fn new(
        master: &[u8],
        cluster_list: &[u64],
        idx: u32,
        checksum_pos: u64,
        major_version: u16,
    ) -> Result<Cluster> {
        let idx = idx as usize;
        let start = cluster_list[idx];
        let end = if idx < cluster_list.len() - 1 {
            cluster_list[idx + 1]
        } else {
            checksum_pos
        };

        if end <= start {
            return Err(Error::OutOfBounds);
        }
        let view = master
            .get(start as usize..end as usize)
            .ok_or(Error::OutOfBounds)?;

        let (extended, compression) = parse_details(*view.first().ok_or(Error::OutOfBounds)?)?;

        // extended clusters are only allowed in version 6
        if extended && major_version != 6 {
            return Err(Error::InvalidClusterExtension);
        }

        let decompressed = match compression {
            Compression::LZMA2 => {
                debug!(cluster = idx, "decompressing cluster");
                let mut decoder = XzDecoder::new(&view[1..]);
                let mut body = Vec::with_capacity(view.len());
                decoder.read_to_end(&mut body)?;
                Some(body)
            }
            Compression::None => None,
        };

        let blob_offsets = match &decompressed {
            Some(body) => parse_blob_list(Cursor::new(body.as_slice()), extended)?,
            None => parse_blob_list(Cursor::new(&view[1..]), extended)?,
        };

        Ok(Cluster {
            compression,
            extended,
            body_start: start + 1,
            end,
            blob_offsets,
            decompressed,
        })
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Number of addressable blobs in this cluster.
    pub fn blob_count(&self) -> u32 {
        (self.blob_offsets.len().saturating_sub(1)) as u32
    }

    /// Returns the bytes of blob `idx`.
    ///
    /// `master` must be the same full-file view the cluster was built from;
    /// raw clusters slice their blobs straight out of it.
    pub fn get_blob<'a>(&'a self, master: &'a [u8], idx: u32) -> Result<&'a [u8]> {
        // compare the untrusted index as-is; arithmetic on it could wrap
        if idx >= self.blob_count() {
            return Err(Error::BlobOutOfRange {
                blob: idx,
                count: self.blob_count(),
            });
        }

        let start = self.blob_offsets[idx as usize] as usize;
        let end = self.blob_offsets[idx as usize + 1] as usize;

        match &self.decompressed {
            Some(body) => body.get(start..end).ok_or(Error::OutOfBounds),
            None => {
                let body_start = self.body_start as usize;
                let limit = self.end as usize;
                let range = body_start + start..body_start + end;
                if range.end > limit {
                    return Err(Error::OutOfBounds);
                }
                master.get(range).ok_or(Error::OutOfBounds)
            }
        }
    }
}

/// Parses the cluster information byte.
///
/// Four low bits:
///   - 0: default (no compression),
///   - 1: none (inherited from Zeno),
///   - 4: LZMA2 compressed
/// Fifth bit from the right:
///   - 0: normal (OFFSET_SIZE=4)
///   - 1: extended (OFFSET_SIZE=8)
fn parse_details(details: u8) -> Result<(bool, Compression)> {
    let slice = &[details];
    let mut reader = BitReader::new(slice);
    // skip first three bits
    reader.skip(3)?;

    Ok((
        reader.read_bool()?,
        Compression::from_raw(reader.read_u8(4)?)?,
    ))
}

/// Reads the blob offset table at the start of a cluster body.
///
/// The first offset points past the table itself, so it also encodes how
/// many offsets there are: `first / 4` (or `/ 8` for extended clusters).
/// That count includes the trailing end-of-last-blob offset, so the cluster
/// holds one blob fewer than the table has entries.
fn parse_blob_list<T: ReadBytesExt>(mut cur: T, extended: bool) -> Result<Vec<u64>> {
    let first = if extended {
        cur.read_u64::<LittleEndian>()?
    } else {
        u64::from(cur.read_u32::<LittleEndian>()?)
    };

    let count = if extended { first / 8 } else { first / 4 };
    if count == 0 {
        return Err(Error::OutOfBounds);
    }

    let mut blob_offsets = Vec::with_capacity(count as usize);
    blob_offsets.push(first);

    for _ in 0..(count as usize - 1) {
        if extended {
            blob_offsets.push(cur.read_u64::<LittleEndian>()?);
        } else {
            blob_offsets.push(u64::from(cur.read_u32::<LittleEndian>()?));
        }
    }

    Ok(blob_offsets)
}
