use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, Cursor};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, Mutex};

use byteorder::{LittleEndian, ReadBytesExt};
use encoding_rs::Encoding;
use lru::LruCache;
use memmap::Mmap;
use tracing::debug;

use crate::cluster::Cluster;
use crate::directory_entry::DirectoryEntry;
use crate::directory_iterator::{ArticleIterator, DirectoryIterator};
use crate::errors::{Error, Result};
use crate::header::ZimHeader;
use crate::mime_type::MimeType;
use crate::namespace::Namespace;
use crate::target::Target;

/// How many decoded clusters are kept around. Blobs requested together
/// (a page and its images) usually live in the same few clusters.
const CLUSTER_CACHE_SIZE: usize = 32;

/// Redirect chains longer than this are treated as cycles.
pub const MAX_REDIRECT_DEPTH: usize = 16;

/// What a content lookup produced.
///
/// `Content` carries the entry's bytes together with its namespace and
/// resolved mimetype string. `Redirect` is only returned when the caller
/// asked not to follow redirects; it carries the target's directory index
/// instead of bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Article {
    Content {
        data: Vec<u8>,
        namespace: Namespace,
        mime_type: String,
    },
    Redirect {
        namespace: Namespace,
        redirect_index: u32,
    },
}

impl Article {
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Article::Content { data, .. } => Some(data),
            Article::Redirect { .. } => None,
        }
    }

    pub fn namespace(&self) -> Namespace {
        match self {
            Article::Content { namespace, .. } => *namespace,
            Article::Redirect { namespace, .. } => *namespace,
        }
    }

    pub fn mime_type(&self) -> Option<&str> {
        match self {
            Article::Content { mime_type, .. } => Some(mime_type),
            Article::Redirect { .. } => None,
        }
    }

    pub fn redirect_index(&self) -> Option<u32> {
        match self {
            Article::Content { .. } => None,
            Article::Redirect { redirect_index, .. } => Some(*redirect_index),
        }
    }
}

/// Represents a ZIM file
///
/// The value is immutable after construction and safe to share across
/// threads; the only internal mutation is the cluster cache, which is
/// mutex-guarded. The file mapping is released when the value is dropped.
pub struct Zim {
    pub header: ZimHeader,

    /// List of mimetypes used in this ZIM archive
    pub mime_table: Vec<String>,

    encoding: &'static Encoding,
    master: Mmap,
    url_list: Vec<u64>,
    title_list: Vec<u32>,
    cluster_list: Vec<u64>,
    cluster_cache: Mutex<LruCache<u64, Arc<Cluster>>>,
}

impl Zim {
    /// Loads a ZIM file, decoding text fields as UTF-8.
    ///
    /// Parses the header and the url, title, and cluster offset tables. The
    /// rest of the data isn't parsed until it's needed, so this should be
    /// fairly quick.
    pub fn new<P: AsRef<Path>>(p: P) -> Result<Zim> {
        Zim::with_encoding(p, encoding_rs::UTF_8)
    }

    /// Loads a ZIM file whose text fields use the given encoding.
    ///
    /// Malformed sequences are replaced during decoding, never reported.
    pub fn with_encoding<P: AsRef<Path>>(p: P, encoding: &'static Encoding) -> Result<Zim> {
        let f = File::open(p)?;
        let master = unsafe { Mmap::map(&f)? };

        let header = ZimHeader::parse(&master)?;

        let mime_table = parse_mime_table(
            master
                .get(header.mime_list_pos as usize..)
                .ok_or(Error::OutOfBounds)?,
            encoding,
        )?;

        let url_list = read_u64_table(&master, header.url_ptr_pos, header.article_count)?;
        let title_list = read_u32_table(&master, header.title_ptr_pos, header.article_count)?;
        let cluster_list = read_u64_table(&master, header.cluster_ptr_pos, header.cluster_count)?;

        Ok(Zim {
            header,
            mime_table,
            encoding,
            master,
            url_list,
            title_list,
            cluster_list,
            cluster_cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(CLUSTER_CACHE_SIZE).expect("nonzero cache size"),
            )),
        })
    }

    /// Number of directory entries in the archive.
    pub fn article_count(&self) -> u32 {
        self.header.article_count
    }

    pub fn len(&self) -> usize {
        self.header.article_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.header.article_count == 0
    }

    /// Byte offset of directory entry `idx`, from the URL pointer table.
    pub fn url_offset(&self, idx: u32) -> Option<u64> {
        self.url_list.get(idx as usize).copied()
    }

    /// Entry index at position `idx` of the by-title ordering.
    pub fn title_offset(&self, idx: u32) -> Option<u32> {
        self.title_list.get(idx as usize).copied()
    }

    /// Byte offset of cluster `idx`, from the cluster pointer table.
    pub fn cluster_offset(&self, idx: u32) -> Option<u64> {
        self.cluster_list.get(idx as usize).copied()
    }

    /// Indexes into the ZIM mime_table.
    pub fn get_mimetype(&self, id: u16) -> Result<MimeType> {
        MimeType::from_id(id, &self.mime_table)
    }

    /// Returns the `DirectoryEntry` for the entry at the given URL index.
    pub fn get_by_url_index(&self, idx: u32) -> Result<DirectoryEntry> {
        let offset = self.url_offset(idx).ok_or(Error::IndexOutOfRange {
            index: idx,
            count: self.header.article_count,
        })? as usize;

        let slice = self.master.get(offset..).ok_or(Error::OutOfBounds)?;
        DirectoryEntry::parse(slice, &self.mime_table, self.encoding)
    }

    /// Returns the decoded cluster `idx`, from the cache when possible.
    ///
    /// Cache hits hand out the same `Arc`, so a cluster is decompressed at
    /// most once while it stays resident.
    pub fn get_cluster(&self, idx: u32) -> Result<Arc<Cluster>> {
        let offset = self.cluster_offset(idx).ok_or(Error::IndexOutOfRange {
            index: idx,
            count: self.header.cluster_count,
        })?;

        if let Some(cluster) = self.cluster_cache.lock().unwrap().get(&offset) {
            return Ok(Arc::clone(cluster));
        }

        debug!(cluster = idx, offset, "materializing cluster");
        let cluster = Arc::new(Cluster::new(
            &self.master,
            &self.cluster_list,
            idx,
            self.header.checksum_pos,
            self.header.major_version(),
        )?);
        self.cluster_cache
            .lock()
            .unwrap()
            .put(offset, Arc::clone(&cluster));

        Ok(cluster)
    }

    /// Returns the bytes of blob `blob_idx` inside cluster `cluster_idx`.
    pub fn read_blob(&self, cluster_idx: u32, blob_idx: u32) -> Result<Vec<u8>> {
        let cluster = self.get_cluster(cluster_idx)?;
        Ok(cluster.get_blob(&self.master, blob_idx)?.to_vec())
    }

    /// Resolves directory entry `index` to its content.
    ///
    /// Redirect entries are chased iteratively (up to [`MAX_REDIRECT_DEPTH`]
    /// hops) when `follow_redirect` is set; otherwise the redirect's target
    /// index is returned in place of content.
    pub fn get_article_by_index(&self, index: u32, follow_redirect: bool) -> Result<Article> {
        let mut idx = index;
        for _ in 0..MAX_REDIRECT_DEPTH {
            let entry = self.get_by_url_index(idx)?;
            match entry.target {
                Some(Target::Blob { cluster, blob }) => {
                    let mime_type = match entry.mime_type {
                        MimeType::Type(name) => name,
                        // sentinel mimetypes never carry a cluster target
                        _ => return Err(Error::MissingTarget),
                    };
                    let data = self.read_blob(cluster, blob)?;
                    return Ok(Article::Content {
                        data,
                        namespace: entry.namespace,
                        mime_type,
                    });
                }
                Some(Target::Redirect(target)) => {
                    if !follow_redirect {
                        return Ok(Article::Redirect {
                            namespace: entry.namespace,
                            redirect_index: target,
                        });
                    }
                    debug!(from = idx, to = target, "following redirect");
                    idx = target;
                }
                None => return Err(Error::MissingTarget),
            }
        }

        Err(Error::RedirectCycle(MAX_REDIRECT_DEPTH))
    }

    /// Finds the entry with the given namespace and url, along with its
    /// directory index. Returns `None` when the archive has no such entry.
    ///
    /// Entries are ordered by `namespace/url`, so this is a binary search
    /// over the URL pointer list: one pointer read and one entry decode per
    /// probe.
    pub fn get_entry_by_url(
        &self,
        namespace: Namespace,
        url: &str,
    ) -> Result<Option<(DirectoryEntry, u32)>> {
        let key = format!("{}/{}", namespace, url);

        let mut front = 0u32;
        let mut end = self.header.article_count;
        debug!(%key, front, end, "binary search");

        while front < end {
            let middle = front + (end - front) / 2;
            let entry = self.get_by_url_index(middle)?;
            match entry.full_url().as_str().cmp(key.as_str()) {
                std::cmp::Ordering::Equal => return Ok(Some((entry, middle))),
                std::cmp::Ordering::Less => front = middle + 1,
                std::cmp::Ordering::Greater => end = middle,
            }
        }

        Ok(None)
    }

    /// Finds and resolves the content at `namespace/url`. Returns `None`
    /// when the archive has no such entry.
    pub fn get_article_by_url(
        &self,
        namespace: Namespace,
        url: &str,
        follow_redirect: bool,
    ) -> Result<Option<Article>> {
        match self.get_entry_by_url(namespace, url)? {
            Some((_, idx)) => Ok(Some(self.get_article_by_index(idx, follow_redirect)?)),
            None => Ok(None),
        }
    }

    /// The article the archive designates as its main page, if any.
    pub fn get_main_page(&self) -> Result<Option<Article>> {
        match self.header.main_page {
            Some(idx) => Ok(Some(self.get_article_by_index(idx, true)?)),
            None => Ok(None),
        }
    }

    /// All metadata entries, keyed by their lowercased url.
    ///
    /// Metadata lives in the `M` namespace at the tail of the url-ordered
    /// directory, so this walks backwards from the end and stops at the
    /// first entry that is not metadata.
    pub fn metadata(&self) -> Result<HashMap<String, Vec<u8>>> {
        let mut metadata = HashMap::new();
        for idx in (0..self.header.article_count).rev() {
            let entry = self.get_by_url_index(idx)?;
            if entry.namespace != Namespace::Metadata {
                break;
            }
            let key = entry.url.to_lowercase();
            if let Article::Content { data, .. } = self.get_article_by_index(idx, true)? {
                metadata.insert(key, data);
            }
        }
        Ok(metadata)
    }

    /// Iterates over all directory entries, sorted by URL.
    pub fn iterate_by_urls(&self) -> DirectoryIterator<'_> {
        DirectoryIterator::new(self)
    }

    /// Iterates over the entries in the article namespace, yielding their
    /// full url, display title and directory index.
    pub fn articles(&self) -> ArticleIterator<'_> {
        ArticleIterator::new(self)
    }
}

/// Reads zero-terminated strings until the empty-string sentinel; the
/// sentinel itself is not included.
fn parse_mime_table(bytes: &[u8], encoding: &'static Encoding) -> Result<Vec<String>> {
    let mut cur = Cursor::new(bytes);
    let mut mime_table = Vec::new();
    loop {
        let mut buf = Vec::new();
        let size = cur.read_until(0, &mut buf)?;
        if size <= 1 {
            break;
        }
        buf.truncate(size - 1);
        let (decoded, _) = encoding.decode_without_bom_handling(&buf);
        mime_table.push(decoded.into_owned());
    }
    Ok(mime_table)
}

fn read_u64_table(master: &[u8], pos: u64, count: u32) -> Result<Vec<u64>> {
    let start = pos as usize;
    let len = count as usize * 8;
    let slice = master
        .get(start..start + len)
        .ok_or(Error::OutOfBounds)?;
    let mut cur = Cursor::new(slice);
    (0..count)
        .map(|_| cur.read_u64::<LittleEndian>().map_err(Error::from))
        .collect()
}

fn read_u32_table(master: &[u8], pos: u64, count: u32) -> Result<Vec<u32>> {
    let start = pos as usize;
    let len = count as usize * 4;
    let slice = master
        .get(start..start + len)
        .ok_or(Error::OutOfBounds)?;
    let mut cur = Cursor::new(slice);
    (0..count)
        .map(|_| cur.read_u32::<LittleEndian>().map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_table_stops_at_the_empty_sentinel() {
        let bytes = b"text/html\0image/png\0\0ignored\0";
        let table = parse_mime_table(bytes, encoding_rs::UTF_8).unwrap();
        assert_eq!(table, vec!["text/html".to_string(), "image/png".to_string()]);
    }

    #[test]
    fn mime_table_of_empty_input() {
        let table = parse_mime_table(b"\0", encoding_rs::UTF_8).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn tables_read_little_endian() {
        let mut bytes = vec![0u8; 4];
        bytes.extend_from_slice(&1u64.to_le_bytes());
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        assert_eq!(read_u64_table(&bytes, 4, 2).unwrap(), vec![1, u64::MAX]);
        assert!(read_u64_table(&bytes, 4, 3).is_err());

        let bytes = 7u32.to_le_bytes();
        assert_eq!(read_u32_table(&bytes, 0, 1).unwrap(), vec![7]);
    }

    #[test]
    fn archive_handle_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Zim>();
        assert_send_sync::<Article>();
    }
}
