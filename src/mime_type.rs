use crate::errors::{Error, Result};

/// Sentinel mimetype id marking a redirect entry.
pub const REDIRECT_SENTINEL: u16 = 0xffff;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimeType {
    /// A special "MimeType" that represents a redirection
    Redirect,
    LinkTarget,
    DeletedEntry,
    Type(String),
}

impl MimeType {
    /// Resolves a raw mimetype id against the archive's mime list.
    pub fn from_id(id: u16, mime_table: &[String]) -> Result<MimeType> {
        match id {
            0xffff => Ok(MimeType::Redirect),
            0xfffe => Ok(MimeType::LinkTarget),
            0xfffd => Ok(MimeType::DeletedEntry),
            id => mime_table
                .get(id as usize)
                .map(|name| MimeType::Type(name.clone()))
                .ok_or(Error::UnknownMimeType(id)),
        }
    }
}
