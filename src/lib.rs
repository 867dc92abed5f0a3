//! This crate provides a pure-rust library for reading ZIM files and
//! searching them by title.
//!
//! ZIM files are a format used primarily to store wikis (such as Wikipedia
//! and others based on MediaWiki) for offline use. [`Zim`] reads an archive:
//! header, directory lookups by index or by `namespace/url`, cluster
//! decompression with a small LRU cache, redirect resolution, and metadata.
//! [`TitleIndex`] sits on top of it: a persistent full-text index over
//! article titles whose candidates are re-ranked with [`Bm25`].
//!
//! For more on the format, see the [OpenZIM website](https://www.openzim.org/wiki/OpenZIM).

mod cluster;
mod directory_entry;
mod directory_iterator;
mod errors;
mod header;
mod language;
mod mime_type;
mod namespace;
mod ranking;
mod target;
mod title_index;
mod uuid;
mod zim;

pub use crate::cluster::{Cluster, Compression};
pub use crate::directory_entry::DirectoryEntry;
pub use crate::directory_iterator::{ArticleEntry, ArticleIterator, DirectoryIterator};
pub use crate::errors::{Error, Result};
pub use crate::header::{ZimHeader, ZIM_MAGIC_NUMBER};
pub use crate::language::iso639_3_to_1;
pub use crate::mime_type::MimeType;
pub use crate::namespace::Namespace;
pub use crate::ranking::Bm25;
pub use crate::target::Target;
pub use crate::title_index::{SearchHit, TitleIndex};
pub use crate::uuid::Uuid;
pub use crate::zim::{Article, Zim, MAX_REDIRECT_DEPTH};
