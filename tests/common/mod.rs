#![allow(dead_code)]

//! A tiny ZIM writer used to fabricate archives for the tests.
//!
//! It produces the subset of the format the reader consumes: the fixed
//! header, the mime list, url/title/cluster pointer tables, article and
//! redirect directory entries, and a single cluster (raw or LZMA2) holding
//! every blob.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use tempfile::NamedTempFile;

const MAGIC: u32 = 72_173_914;

enum EntrySpec {
    Article {
        namespace: char,
        url: String,
        title: String,
        mime: u16,
        data: Vec<u8>,
    },
    Redirect {
        namespace: char,
        url: String,
        title: String,
        target: (char, String),
    },
}

impl EntrySpec {
    fn key(&self) -> String {
        match self {
            EntrySpec::Article { namespace, url, .. } => format!("{}/{}", namespace, url),
            EntrySpec::Redirect { namespace, url, .. } => format!("{}/{}", namespace, url),
        }
    }

    fn title(&self) -> &str {
        match self {
            EntrySpec::Article { title, .. } => title,
            EntrySpec::Redirect { title, .. } => title,
        }
    }
}

pub struct ZimBuilder {
    mime_types: Vec<String>,
    entries: Vec<EntrySpec>,
    main_page: Option<(char, String)>,
    compressed: bool,
}

impl ZimBuilder {
    pub fn new() -> Self {
        ZimBuilder {
            mime_types: vec![
                "text/html".to_string(),
                "image/png".to_string(),
                "text/plain".to_string(),
            ],
            entries: Vec::new(),
            main_page: None,
            compressed: false,
        }
    }

    pub fn article(mut self, namespace: char, url: &str, title: &str, mime: u16, data: &[u8]) -> Self {
        self.entries.push(EntrySpec::Article {
            namespace,
            url: url.to_string(),
            title: title.to_string(),
            mime,
            data: data.to_vec(),
        });
        self
    }

    pub fn redirect(
        mut self,
        namespace: char,
        url: &str,
        title: &str,
        target_namespace: char,
        target_url: &str,
    ) -> Self {
        self.entries.push(EntrySpec::Redirect {
            namespace,
            url: url.to_string(),
            title: title.to_string(),
            target: (target_namespace, target_url.to_string()),
        });
        self
    }

    pub fn main_page(mut self, namespace: char, url: &str) -> Self {
        self.main_page = Some((namespace, url.to_string()));
        self
    }

    /// Store the cluster LZMA2-compressed instead of raw.
    pub fn compressed(mut self) -> Self {
        self.compressed = true;
        self
    }

    pub fn build(mut self) -> TestArchive {
        // the reader relies on entries being ordered by namespace/url
        self.entries.sort_by_key(|e| e.key());
        let keys: Vec<String> = self.entries.iter().map(|e| e.key()).collect();
        let index_of = |namespace: char, url: &str| -> u32 {
            let key = format!("{}/{}", namespace, url);
            keys.iter()
                .position(|k| *k == key)
                .unwrap_or_else(|| panic!("no such entry: {}", key)) as u32
        };

        // blobs are assigned in entry order within the single cluster
        let mut blobs: Vec<&[u8]> = Vec::new();
        let mut serialized_entries: Vec<Vec<u8>> = Vec::new();
        for entry in &self.entries {
            let mut buf = Vec::new();
            match entry {
                EntrySpec::Article {
                    namespace,
                    url,
                    title,
                    mime,
                    data,
                } => {
                    buf.write_u16::<LittleEndian>(*mime).unwrap();
                    buf.write_u8(0).unwrap(); // parameter_len
                    buf.write_u8(*namespace as u8).unwrap();
                    buf.write_u32::<LittleEndian>(0).unwrap(); // revision
                    buf.write_u32::<LittleEndian>(0).unwrap(); // cluster_number
                    buf.write_u32::<LittleEndian>(blobs.len() as u32).unwrap();
                    buf.extend_from_slice(url.as_bytes());
                    buf.push(0);
                    buf.extend_from_slice(title.as_bytes());
                    buf.push(0);
                    blobs.push(data);
                }
                EntrySpec::Redirect {
                    namespace,
                    url,
                    title,
                    target,
                } => {
                    buf.write_u16::<LittleEndian>(0xffff).unwrap();
                    buf.write_u8(0).unwrap();
                    buf.write_u8(*namespace as u8).unwrap();
                    buf.write_u32::<LittleEndian>(0).unwrap();
                    buf.write_u32::<LittleEndian>(index_of(target.0, &target.1))
                        .unwrap();
                    buf.extend_from_slice(url.as_bytes());
                    buf.push(0);
                    buf.extend_from_slice(title.as_bytes());
                    buf.push(0);
                }
            }
            serialized_entries.push(buf);
        }

        let cluster = build_cluster(&blobs, self.compressed);

        // title pointer list: entry indices ordered by title
        let mut by_title: Vec<u32> = (0..self.entries.len() as u32).collect();
        by_title.sort_by_key(|&i| self.entries[i as usize].title().to_string());

        let mime_list: Vec<u8> = {
            let mut buf = Vec::new();
            for mime in &self.mime_types {
                buf.extend_from_slice(mime.as_bytes());
                buf.push(0);
            }
            buf.push(0);
            buf
        };

        let count = self.entries.len() as u32;
        let mime_list_pos = 80u64;
        let url_ptr_pos = mime_list_pos + mime_list.len() as u64;
        let title_ptr_pos = url_ptr_pos + u64::from(count) * 8;
        let entries_pos = title_ptr_pos + u64::from(count) * 4;
        let entries_len: u64 = serialized_entries.iter().map(|e| e.len() as u64).sum();
        let cluster_ptr_pos = entries_pos + entries_len;
        let cluster_pos = cluster_ptr_pos + 8;
        let checksum_pos = cluster_pos + cluster.len() as u64;

        let mut file = Vec::new();

        // header
        file.write_u32::<LittleEndian>(MAGIC).unwrap();
        file.write_u32::<LittleEndian>(5).unwrap();
        file.extend_from_slice(&[0xab; 16]); // uuid
        file.write_u32::<LittleEndian>(count).unwrap();
        file.write_u32::<LittleEndian>(1).unwrap(); // cluster_count
        file.write_u64::<LittleEndian>(url_ptr_pos).unwrap();
        file.write_u64::<LittleEndian>(title_ptr_pos).unwrap();
        file.write_u64::<LittleEndian>(cluster_ptr_pos).unwrap();
        file.write_u64::<LittleEndian>(mime_list_pos).unwrap();
        let main_page = match &self.main_page {
            Some((ns, url)) => index_of(*ns, url),
            None => 0xffff_ffff,
        };
        file.write_u32::<LittleEndian>(main_page).unwrap();
        file.write_u32::<LittleEndian>(0xffff_ffff).unwrap(); // layout_page
        file.write_u64::<LittleEndian>(checksum_pos).unwrap();
        assert_eq!(file.len(), 80);

        file.extend_from_slice(&mime_list);

        // url pointer table
        let mut entry_offset = entries_pos;
        for entry in &serialized_entries {
            file.write_u64::<LittleEndian>(entry_offset).unwrap();
            entry_offset += entry.len() as u64;
        }

        // title pointer table
        for idx in &by_title {
            file.write_u32::<LittleEndian>(*idx).unwrap();
        }

        for entry in &serialized_entries {
            file.extend_from_slice(entry);
        }

        // cluster pointer table, then the cluster itself
        file.write_u64::<LittleEndian>(cluster_pos).unwrap();
        file.extend_from_slice(&cluster);

        // md5 footer, never validated
        file.extend_from_slice(&[0u8; 16]);

        let mut tmp = NamedTempFile::new().expect("failed to create temp file");
        tmp.write_all(&file).expect("failed to write archive");
        tmp.flush().expect("failed to flush archive");

        TestArchive { file: tmp, keys }
    }
}

fn build_cluster(blobs: &[&[u8]], compressed: bool) -> Vec<u8> {
    let mut body = Vec::new();
    let table_size = 4 * (blobs.len() as u32 + 1);
    let mut offset = table_size;
    body.write_u32::<LittleEndian>(offset).unwrap();
    for blob in blobs {
        offset += blob.len() as u32;
        body.write_u32::<LittleEndian>(offset).unwrap();
    }
    for blob in blobs {
        body.extend_from_slice(blob);
    }

    if compressed {
        let mut cluster = vec![4u8];
        let mut encoder = xz2::write::XzEncoder::new(&mut cluster, 6);
        encoder.write_all(&body).unwrap();
        encoder.finish().unwrap();
        cluster
    } else {
        let mut cluster = vec![1u8];
        cluster.extend_from_slice(&body);
        cluster
    }
}

pub struct TestArchive {
    pub file: NamedTempFile,
    keys: Vec<String>,
}

impl TestArchive {
    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }

    /// Directory index of the entry with the given namespace and url.
    pub fn index_of(&self, namespace: char, url: &str) -> u32 {
        let key = format!("{}/{}", namespace, url);
        self.keys
            .iter()
            .position(|k| *k == key)
            .unwrap_or_else(|| panic!("no such entry: {}", key)) as u32
    }
}
