/// The Okapi BM25 relevance function, used to order title matches.
///
/// Documents here are short title strings, so the statistics are cheap and
/// deliberately coarse: word counts come from counting spaces, and both
/// document frequency and term frequency are substring-based rather than
/// token-based, so a query term of `rail` also counts `railway`.
#[derive(Debug, Clone, Copy)]
pub struct Bm25 {
    k1: f64,
    b: f64,
}

impl Default for Bm25 {
    fn default() -> Self {
        Bm25 { k1: 1.2, b: 0.75 }
    }
}

impl Bm25 {
    pub fn new(k1: f64, b: f64) -> Self {
        Bm25 { k1, b }
    }

    /// Calculates the BM25 score of every document in `corpus` against the
    /// query terms, in corpus order. Higher is better.
    ///
    /// Matching is case-insensitive. The IDF is the non-negative
    /// `ln(1 + (N - df + 0.5) / (df + 0.5))` form, so a document can never
    /// be penalized for matching.
    pub fn scores<Q, D>(&self, query: &[Q], corpus: &[D]) -> Vec<f64>
    where
        Q: AsRef<str>,
        D: AsRef<str>,
    {
        if corpus.is_empty() {
            return Vec::new();
        }

        let corpus_size = corpus.len() as f64;
        let query: Vec<String> = query.iter().map(|t| t.as_ref().to_lowercase()).collect();
        let corpus: Vec<String> = corpus.iter().map(|d| d.as_ref().to_lowercase()).collect();

        let num_words: Vec<f64> = corpus
            .iter()
            .map(|doc| doc.matches(' ').count() as f64 + 1.0)
            .collect();
        let avg_doc_len = num_words.iter().sum::<f64>() / corpus_size;

        let query_terms: Vec<(&String, f64)> = query
            .iter()
            .map(|term| {
                let frequency = corpus.iter().filter(|doc| doc.contains(term.as_str())).count();
                (term, frequency as f64)
            })
            .collect();

        corpus
            .iter()
            .zip(num_words.iter())
            .map(|(document, &num_words_doc)| {
                let mut total_score = 0.0;
                for (term, frequency) in &query_terms {
                    let idf =
                        (1.0 + (corpus_size - frequency + 0.5) / (frequency + 0.5)).ln();

                    let doc_frequency = document.matches(term.as_str()).count() as f64;
                    let doc_k1 = doc_frequency * (self.k1 + 1.0);
                    let doc_b = doc_frequency
                        + self.k1 * (1.0 - self.b + self.b * (num_words_doc / avg_doc_len));
                    total_score += idf * (doc_k1 / doc_b);
                }
                total_score
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Corpus positions ordered best-first, ties broken by position.
    fn ranking(scores: &[f64]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        order
    }

    #[test]
    fn matching_document_outranks_non_matching() {
        let scores = Bm25::default().scores(
            &["fox"],
            &["the quick brown fox", "the slow green turtle"],
        );
        assert!(scores[0] > scores[1]);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn matching_both_terms_outranks_matching_one() {
        let scores = Bm25::default().scores(&["quick", "brown"], &["the quick brown fox", "quickly"]);
        assert!(scores[0] > scores[1]);
        assert!(scores[1] > 0.0);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let scores = Bm25::default().scores(&["Fox"], &["The Quick Brown FOX"]);
        assert!(scores[0] > 0.0);
    }

    #[test]
    fn substring_matches_count() {
        // "rail" hits "railway" twice via containment
        let scores = Bm25::default().scores(&["rail"], &["railway rail", "turtle pond"]);
        assert!(scores[0] > 0.0);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn empty_inputs() {
        let none: Vec<f64> = Bm25::default().scores(&["x"], &[] as &[&str]);
        assert!(none.is_empty());

        let zeros = Bm25::default().scores(&[] as &[&str], &["some title"]);
        assert_eq!(zeros, vec![0.0]);
    }

    proptest! {
        /// Appending a document that matches nothing must not disturb the
        /// relative order of the documents already ranked.
        #[test]
        fn unrelated_document_preserves_order(
            docs in proptest::collection::vec(
                proptest::collection::vec(
                    proptest::sample::select(vec!["alpha", "beta", "gamma", "delta"]),
                    3,
                ),
                2..8,
            ),
            term in proptest::sample::select(vec!["alpha", "beta", "gamma", "delta"]),
        ) {
            let corpus: Vec<String> = docs.iter().map(|words| words.join(" ")).collect();
            let query = [term];

            let before = Bm25::default().scores(&query, &corpus);

            let mut extended = corpus.clone();
            extended.push("zulu yankee xray".to_string());
            let after = Bm25::default().scores(&query, &extended);

            prop_assert_eq!(ranking(&before), ranking(&after[..corpus.len()]));
        }
    }
}
