use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::errors::{Error, Result};
use crate::uuid::Uuid;

/// Magic number to recognise the file format, must be 72173914
pub const ZIM_MAGIC_NUMBER: u32 = 72_173_914;

/// Size of the fixed header at the start of every archive.
pub const HEADER_SIZE: usize = 80;

/// A ZIM file starts with a header.
#[derive(Debug)]
pub struct ZimHeader {
    /// bytes 1-2: major, bytes 3-4: minor version of the ZIM file format
    pub version: u32,
    /// unique id of this zim file
    pub uuid: Uuid,
    /// total number of directory entries
    pub article_count: u32,
    /// total number of clusters
    pub cluster_count: u32,
    /// position of the directory pointerlist ordered by URL
    pub url_ptr_pos: u64,
    /// position of the directory pointerlist ordered by Title
    pub title_ptr_pos: u64,
    /// position of the cluster pointer list
    pub cluster_ptr_pos: u64,
    /// position of the MIME type list (also header size)
    pub mime_list_pos: u64,
    /// main page, or `None` if the archive declares none
    pub main_page: Option<u32>,
    /// layout page, or `None` if the archive declares none
    pub layout_page: Option<u32>,
    /// pointer to the md5 checksum of this file, 16 bytes before the end
    pub checksum_pos: u64,
}

impl ZimHeader {
    /// Decodes the fixed header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<ZimHeader> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::MalformedHeader);
        }

        let mut cur = Cursor::new(bytes);
        let magic = cur.read_u32::<LittleEndian>()?;
        if magic != ZIM_MAGIC_NUMBER {
            return Err(Error::MalformedHeader);
        }

        let version = cur.read_u32::<LittleEndian>()?;
        let mut uuid = [0u8; 16];
        for byte in uuid.iter_mut() {
            *byte = cur.read_u8()?;
        }
        let article_count = cur.read_u32::<LittleEndian>()?;
        let cluster_count = cur.read_u32::<LittleEndian>()?;
        let url_ptr_pos = cur.read_u64::<LittleEndian>()?;
        let title_ptr_pos = cur.read_u64::<LittleEndian>()?;
        let cluster_ptr_pos = cur.read_u64::<LittleEndian>()?;
        let mime_list_pos = cur.read_u64::<LittleEndian>()?;
        let main_page = cur.read_u32::<LittleEndian>()?;
        let layout_page = cur.read_u32::<LittleEndian>()?;
        let checksum_pos = cur.read_u64::<LittleEndian>()?;

        debug_assert_eq!(cur.position(), HEADER_SIZE as u64);

        Ok(ZimHeader {
            version,
            uuid: Uuid::new(uuid),
            article_count,
            cluster_count,
            url_ptr_pos,
            title_ptr_pos,
            cluster_ptr_pos,
            mime_list_pos,
            main_page: is_defined(main_page),
            layout_page: is_defined(layout_page),
            checksum_pos,
        })
    }

    /// The major format version, stored in the low half of `version`.
    pub fn major_version(&self) -> u16 {
        (self.version & 0xffff) as u16
    }
}

fn is_defined(val: u32) -> Option<u32> {
    if val == 0xffff_ffff {
        None
    } else {
        Some(val)
    }
}
