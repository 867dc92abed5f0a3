use std::io;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while reading an archive or its title index.
///
/// Lookup misses are not errors; the lookup functions return `Option` for
/// those. An `Error` always means the file (or the index) could not be
/// decoded as requested.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The file is too short for the fixed header, or the magic number does
    /// not identify a ZIM archive.
    #[error("not a ZIM archive or header truncated")]
    MalformedHeader,

    /// A read ran past the end of the file or of a decoded cluster.
    #[error("unexpected end of data")]
    OutOfBounds,

    /// A cluster declares a compression type other than none or LZMA2.
    #[error("unsupported cluster compression type {0}")]
    UnknownCompression(u8),

    /// Extended (64-bit offset) clusters are only valid in major version 6.
    #[error("extended cluster in a pre-version-6 archive")]
    InvalidClusterExtension,

    /// A directory index at or past `article_count`.
    #[error("directory index {index} out of range, archive has {count} entries")]
    IndexOutOfRange { index: u32, count: u32 },

    /// A blob index at or past the cluster's blob count.
    #[error("blob index {blob} out of range, cluster has {count} blobs")]
    BlobOutOfRange { blob: u32, count: u32 },

    /// A redirect chain that did not terminate within the bounded depth.
    #[error("redirect chain exceeded {0} hops")]
    RedirectCycle(usize),

    /// An article entry whose mimetype id does not name a mime list entry.
    #[error("mimetype id {0} not present in the mime list")]
    UnknownMimeType(u16),

    /// A link target or deleted entry; such entries carry no content.
    #[error("directory entry has no content target")]
    MissingTarget,

    #[error("cluster info byte: {0}")]
    Bits(#[from] bitreader::BitReaderError),

    #[error("title index: {0}")]
    Index(#[from] tantivy::TantivyError),

    /// An existing title index whose schema does not match ours.
    #[error("title index schema mismatch")]
    IndexSchema,
}
