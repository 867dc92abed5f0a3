use std::fs;
use std::path::Path;

use tantivy::collector::DocSetCollector;
use tantivy::query::{BooleanQuery, Occur, Query, RegexQuery};
use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, INDEXED, STORED,
};
use tantivy::tokenizer::TokenStream;
use tantivy::{Document, Index, IndexReader};
use tracing::{debug, info};

use crate::errors::{Error, Result};
use crate::ranking::Bm25;
use crate::zim::Zim;

/// Tokenizer applied to titles: lowercasing plus English (Porter-style)
/// stemming, so queries match inflected forms.
const TOKENIZER: &str = "en_stem";

const ENTRY_FIELD: &str = "entry";
const TITLE_FIELD: &str = "title";

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// One ranked search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// directory index of the matching entry
    pub index: u32,
    /// the entry's url within the article namespace
    pub url: String,
    /// the entry's display title
    pub title: String,
    /// BM25 relevance, higher is better
    pub score: f64,
}

/// A persistent full-text index over the titles of the article namespace.
///
/// The index maps stemmed title tokens back to directory indices; titles
/// themselves are not stored and are re-read from the archive when needed.
/// An existing index at the given path is trusted and reused as-is; a
/// missing one is built from the archive in one pass.
pub struct TitleIndex {
    index: Index,
    reader: IndexReader,
    entry_field: Field,
    title_field: Field,
}

impl TitleIndex {
    /// Opens the index at `path`, building it from `zim` first if the path
    /// does not exist yet.
    pub fn open_or_build<P: AsRef<Path>>(path: P, zim: &Zim) -> Result<TitleIndex> {
        let path = path.as_ref();

        let index = if path.exists() {
            debug!(path = %path.display(), "opening existing title index");
            Index::open_in_dir(path)?
        } else {
            info!(path = %path.display(), "no title index found, building one");
            fs::create_dir_all(path)?;
            let index = Index::create_in_dir(path, schema())?;
            build(&index, zim)?;
            index
        };

        let schema = index.schema();
        let entry_field = schema.get_field(ENTRY_FIELD).ok_or(Error::IndexSchema)?;
        let title_field = schema.get_field(TITLE_FIELD).ok_or(Error::IndexSchema)?;

        let reader = index.reader()?;

        Ok(TitleIndex {
            index,
            reader,
            entry_field,
            title_field,
        })
    }

    /// Returns the directory indices whose titles match any of the keywords,
    /// in no particular order.
    ///
    /// Every keyword is stemmed and matched as a prefix, so `rail` also
    /// finds `railway`.
    pub fn query<S: AsRef<str>>(&self, keywords: &[S]) -> Result<Vec<u32>> {
        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for keyword in keywords {
            for stem in self.analyze(keyword.as_ref())? {
                let pattern = format!("{}.*", stem);
                let query = RegexQuery::from_pattern(&pattern, self.title_field)?;
                subqueries.push((Occur::Should, Box::new(query)));
            }
        }

        if subqueries.is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let docs = searcher.search(&BooleanQuery::from(subqueries), &DocSetCollector)?;

        let mut indices = Vec::with_capacity(docs.len());
        for address in docs {
            let doc = searcher.doc(address)?;
            let entry = doc
                .get_first(self.entry_field)
                .and_then(|value| value.as_u64())
                .ok_or(Error::IndexSchema)?;
            indices.push(entry as u32);
        }

        Ok(indices)
    }

    /// Runs a full search: candidates from the index, titles from the
    /// archive, BM25 ordering on top. Ties and equal scores keep directory
    /// order.
    pub fn search<S: AsRef<str>>(&self, zim: &Zim, keywords: &[S]) -> Result<Vec<SearchHit>> {
        let mut candidates = self.query(keywords)?;
        candidates.sort_unstable();

        let mut hits = Vec::with_capacity(candidates.len());
        for index in candidates {
            let entry = zim.get_by_url_index(index)?;
            hits.push(SearchHit {
                index,
                url: entry.url.clone(),
                title: entry.display_title().to_string(),
                score: 0.0,
            });
        }

        let titles: Vec<&str> = hits.iter().map(|hit| hit.title.as_str()).collect();
        let keywords: Vec<&str> = keywords.iter().map(|k| k.as_ref()).collect();
        let scores = Bm25::default().scores(&keywords, &titles);
        for (hit, score) in hits.iter_mut().zip(scores) {
            hit.score = score;
        }

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(hits)
    }

    /// Runs `text` through the title field's analyzer, yielding its stems.
    fn analyze(&self, text: &str) -> Result<Vec<String>> {
        let analyzer = self.index.tokenizer_for_field(self.title_field)?;
        let mut stream = analyzer.token_stream(text);
        let mut stems = Vec::new();
        while let Some(token) = stream.next() {
            stems.push(token.text.clone());
        }
        Ok(stems)
    }
}

fn schema() -> Schema {
    let mut builder = Schema::builder();
    builder.add_u64_field(ENTRY_FIELD, INDEXED | STORED);
    builder.add_text_field(
        TITLE_FIELD,
        TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(TOKENIZER)
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        ),
    );
    builder.build()
}

/// One pass over the article namespace: every entry becomes a document of
/// its directory index and display title.
fn build(index: &Index, zim: &Zim) -> Result<()> {
    let schema = index.schema();
    let entry_field = schema.get_field(ENTRY_FIELD).ok_or(Error::IndexSchema)?;
    let title_field = schema.get_field(TITLE_FIELD).ok_or(Error::IndexSchema)?;

    let mut writer = index.writer(WRITER_HEAP_BYTES)?;
    let mut count = 0u64;
    for article in zim.articles() {
        let article = article?;
        let mut doc = Document::new();
        doc.add_u64(entry_field, u64::from(article.index));
        doc.add_text(title_field, &article.title);
        writer.add_document(doc)?;
        count += 1;
    }
    writer.commit()?;

    info!(articles = count, "title index built");
    Ok(())
}
