use crate::directory_entry::DirectoryEntry;
use crate::errors::Result;
use crate::namespace::Namespace;
use crate::zim::Zim;

/// Iterates over every directory entry in URL order, yielding the entry
/// together with its directory index.
pub struct DirectoryIterator<'a> {
    max: u32,
    next: u32,
    zim: &'a Zim,
}

impl<'a> DirectoryIterator<'a> {
    pub fn new(zim: &'a Zim) -> DirectoryIterator<'a> {
        DirectoryIterator {
            max: zim.article_count(),
            next: 0,
            zim,
        }
    }
}

impl<'a> Iterator for DirectoryIterator<'a> {
    type Item = Result<(u32, DirectoryEntry)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.max {
            return None;
        }

        let idx = self.next;
        self.next += 1;

        Some(self.zim.get_by_url_index(idx).map(|entry| (idx, entry)))
    }
}

/// One entry of the article namespace, as produced by [`ArticleIterator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleEntry {
    /// the canonical `namespace/url` identifier
    pub full_url: String,
    /// the entry's title, or its url when the stored title is empty
    pub title: String,
    /// the entry's directory index
    pub index: u32,
}

/// Iterates over the entries whose namespace is `A`, in URL order.
///
/// The iterator is finite and not restartable; create a fresh one to start
/// over.
pub struct ArticleIterator<'a> {
    inner: DirectoryIterator<'a>,
}

impl<'a> ArticleIterator<'a> {
    pub fn new(zim: &'a Zim) -> ArticleIterator<'a> {
        ArticleIterator {
            inner: DirectoryIterator::new(zim),
        }
    }
}

impl<'a> Iterator for ArticleIterator<'a> {
    type Item = Result<ArticleEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        for item in &mut self.inner {
            match item {
                Ok((idx, entry)) => {
                    if entry.namespace != Namespace::Articles {
                        continue;
                    }
                    return Some(Ok(ArticleEntry {
                        full_url: entry.full_url(),
                        title: entry.display_title().to_string(),
                        index: idx,
                    }));
                }
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }
}
