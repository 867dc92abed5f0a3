use std::io::{BufRead, Cursor};

use byteorder::{LittleEndian, ReadBytesExt};
use encoding_rs::Encoding;

use crate::errors::Result;
use crate::mime_type::{MimeType, REDIRECT_SENTINEL};
use crate::namespace::Namespace;
use crate::target::Target;

/// Holds metadata about a single directory entry.
///
/// The two on-disk shapes (article entry and redirect entry) share their
/// leading fields and differ only in the payload, captured here as
/// [`Target`].
#[derive(Debug)]
pub struct DirectoryEntry {
    /// MIME type as defined in the MIME type list
    pub mime_type: MimeType,
    /// the raw mimetype id this entry was decoded from
    pub mime_id: u16,
    /// defines to which namespace this directory entry belongs
    pub namespace: Namespace,
    /// identifies a revision of the contents of this directory entry
    pub revision: u32,
    /// the URL as refered in the URL pointer list
    pub url: String,
    /// title as refered in the Title pointer list or empty; in case it is
    /// empty, the URL is used as title
    pub title: String,
    /// where the entry's bytes live, or where it redirects to; `None` for
    /// link targets and deleted entries
    pub target: Option<Target>,
}

impl DirectoryEntry {
    /// Decodes an entry from `s`, which must start at the entry's first byte.
    ///
    /// The sentinel mimetype `0xffff` selects the redirect shape; anything
    /// else is an article entry. `url` and `title` follow as zero-terminated
    /// strings in the archive's declared `encoding`, decoded with
    /// replacement.
    pub fn parse(s: &[u8], mime_table: &[String], encoding: &'static Encoding) -> Result<Self> {
        let mut cur = Cursor::new(s);
        let mime_id = cur.read_u16::<LittleEndian>()?;
        let mime_type = MimeType::from_id(mime_id, mime_table)?;
        let _parameter_len = cur.read_u8()?;
        let namespace = Namespace::from(cur.read_u8()?);
        let revision = cur.read_u32::<LittleEndian>()?;

        let target = if mime_id == REDIRECT_SENTINEL {
            // this is an index into the URL pointer list
            Some(Target::Redirect(cur.read_u32::<LittleEndian>()?))
        } else if mime_type == MimeType::LinkTarget || mime_type == MimeType::DeletedEntry {
            None
        } else {
            let cluster = cur.read_u32::<LittleEndian>()?;
            let blob = cur.read_u32::<LittleEndian>()?;
            Some(Target::Blob { cluster, blob })
        };

        let url = read_zero_terminated(&mut cur, encoding)?;
        let title = read_zero_terminated(&mut cur, encoding)?;

        Ok(DirectoryEntry {
            mime_type,
            mime_id,
            namespace,
            revision,
            url,
            title,
            target,
        })
    }

    /// The canonical `namespace/url` identifier, which is also the archive's
    /// sort key.
    pub fn full_url(&self) -> String {
        format!("{}/{}", self.namespace, self.url)
    }

    /// The title, falling back to the URL when the stored title is empty.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.url
        } else {
            &self.title
        }
    }
}

/// Consumes bytes up to (and including) the next zero byte and decodes them
/// with `encoding`, replacing malformed sequences.
fn read_zero_terminated(
    cur: &mut Cursor<&[u8]>,
    encoding: &'static Encoding,
) -> Result<String> {
    let mut buf = Vec::new();
    let size = cur.read_until(0, &mut buf)?;
    if buf.last() == Some(&0) {
        buf.truncate(size - 1);
    }
    let (decoded, _) = encoding.decode_without_bom_handling(&buf);
    Ok(decoded.into_owned())
}
