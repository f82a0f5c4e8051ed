//! Free-text title search: TF-IDF, fuzzy, or a blend of both.

use crate::embedding::{EmbeddingOptions, TextEmbeddingIndex};
use crate::fuzzy::FuzzyMatcher;
use crate::similarity::compare_ranked;
use crate::text::StopWords;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use shelfwise_core::{Book, MatchMethod, ScoredItem, ShelfError, ShelfResult};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

/// Hybrid search widens each method's threshold by this factor before fusion.
pub const HYBRID_THRESHOLD_RELAXATION: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    Tfidf,
    Fuzzy,
    #[default]
    Hybrid,
}

impl SearchMethod {
    pub fn tag(&self) -> MatchMethod {
        match self {
            SearchMethod::Tfidf => MatchMethod::Tfidf,
            SearchMethod::Fuzzy => MatchMethod::Fuzzy,
            SearchMethod::Hybrid => MatchMethod::Hybrid,
        }
    }
}

impl FromStr for SearchMethod {
    type Err = ShelfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tfidf" => Ok(SearchMethod::Tfidf),
            "fuzzy" => Ok(SearchMethod::Fuzzy),
            "hybrid" => Ok(SearchMethod::Hybrid),
            other => Err(ShelfError::InvalidParameter(format!(
                "unknown search method '{other}', expected tfidf, fuzzy or hybrid"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub item_id: String,
    pub score: f64,
    pub method: MatchMethod,
}

impl SearchHit {
    fn scored(&self) -> ScoredItem {
        ScoredItem::new(self.item_id.clone(), self.score)
    }
}

impl From<SearchHit> for ScoredItem {
    fn from(hit: SearchHit) -> Self {
        ScoredItem::new(hit.item_id, hit.score)
    }
}

pub struct TitleSearchEngine {
    item_ids: Vec<String>,
    index: TextEmbeddingIndex,
    fuzzy: FuzzyMatcher,
}

impl TitleSearchEngine {
    /// Index titles alone with unigrams and bigrams. Rows follow `books`.
    pub fn build(books: &[Book], max_terms: usize) -> ShelfResult<Self> {
        let titles: Vec<String> = books.iter().map(|b| b.title.to_lowercase()).collect();
        let index = TextEmbeddingIndex::fit(
            &titles,
            &EmbeddingOptions {
                max_terms: Some(max_terms),
                ngram_range: (1, 2),
                stop_words: StopWords::English,
            },
        )?;
        Ok(Self {
            item_ids: books.iter().map(|b| b.isbn.clone()).collect(),
            index,
            fuzzy: FuzzyMatcher::new(&titles),
        })
    }

    pub fn index(&self) -> &TextEmbeddingIndex {
        &self.index
    }

    /// Rank items against `query`. An empty result means nothing cleared
    /// the threshold; it is not an error.
    pub fn search(
        &self,
        query: &str,
        k: usize,
        threshold: f64,
        method: SearchMethod,
    ) -> Vec<SearchHit> {
        let hits = match method {
            SearchMethod::Tfidf => self.by_tfidf(query, k, threshold),
            SearchMethod::Fuzzy => self.by_fuzzy(query, k, threshold),
            SearchMethod::Hybrid => self.by_hybrid(query, k, threshold),
        };
        if hits.is_empty() {
            debug!(query, threshold, method = ?method, "No titles above threshold");
        }
        hits
    }

    pub fn by_tfidf(&self, query: &str, k: usize, threshold: f64) -> Vec<SearchHit> {
        let scores = self.index.similarity_to_text(query);
        self.select(&scores, k, threshold, MatchMethod::Tfidf)
    }

    pub fn by_fuzzy(&self, query: &str, k: usize, threshold: f64) -> Vec<SearchHit> {
        let scores = self.fuzzy.similarity_to_all(query);
        self.select(&scores, k, threshold, MatchMethod::Fuzzy)
    }

    /// Union of relaxed TF-IDF and fuzzy candidates. Items found by both
    /// methods get the mean of the two scores; items found by one keep
    /// that score.
    pub fn by_hybrid(&self, query: &str, k: usize, threshold: f64) -> Vec<SearchHit> {
        let relaxed = threshold * HYBRID_THRESHOLD_RELAXATION;
        let pool = k.saturating_mul(2);

        let mut fused: BTreeMap<String, (f64, u32)> = BTreeMap::new();
        let candidates = self
            .by_tfidf(query, pool, relaxed)
            .into_iter()
            .chain(self.by_fuzzy(query, pool, relaxed));
        for hit in candidates {
            let entry = fused.entry(hit.item_id).or_insert((0.0, 0));
            entry.0 += hit.score;
            entry.1 += 1;
        }

        let mut hits: Vec<SearchHit> = fused
            .into_iter()
            .map(|(item_id, (sum, count))| SearchHit {
                item_id,
                score: sum / count as f64,
                method: MatchMethod::Hybrid,
            })
            .collect();
        hits.sort_by(|a, b| compare_ranked(&a.scored(), &b.scored()));
        hits.truncate(k);
        hits
    }

    fn select(
        &self,
        scores: &Array1<f64>,
        k: usize,
        threshold: f64,
        method: MatchMethod,
    ) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = scores
            .iter()
            .enumerate()
            .filter(|&(_, &score)| score >= threshold)
            .map(|(row, &score)| SearchHit {
                item_id: self.item_ids[row].clone(),
                score,
                method,
            })
            .collect();
        hits.sort_by(|a, b| compare_ranked(&a.scored(), &b.scored()));
        hits.truncate(k);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(isbn: &str, title: &str) -> Book {
        Book {
            isbn: isbn.to_string(),
            title: title.to_string(),
            author: String::new(),
            year: None,
            image_url: String::new(),
        }
    }

    fn engine() -> TitleSearchEngine {
        TitleSearchEngine::build(
            &[
                book("hp", "Harry Potter"),
                book("ss", "Sorcerer's Stone"),
                book("hc", "Harold and the Crayon"),
            ],
            300,
        )
        .unwrap()
    }

    #[test]
    fn test_hybrid_ranks_exact_word_first() {
        let hits = engine().search("harry", 10, 0.3, SearchMethod::Hybrid);
        assert!(!hits.is_empty());
        assert_eq!(hits[0].item_id, "hp");
        assert!(hits.iter().all(|h| h.method == MatchMethod::Hybrid));
    }

    #[test]
    fn test_hybrid_score_is_mean_when_both_methods_match() {
        let engine = engine();
        let tfidf = engine.by_tfidf("harry", 20, 0.21);
        let fuzzy = engine.by_fuzzy("harry", 20, 0.21);
        let hybrid = engine.by_hybrid("harry", 10, 0.3);

        let t = tfidf.iter().find(|h| h.item_id == "hp").unwrap().score;
        let f = fuzzy.iter().find(|h| h.item_id == "hp").unwrap().score;
        let h = hybrid.iter().find(|h| h.item_id == "hp").unwrap().score;
        assert!((h - (t + f) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_hybrid_single_method_keeps_its_score() {
        let engine = engine();
        // "harold and the crayon" only clears the fuzzy side.
        let tfidf = engine.by_tfidf("harry", 20, 0.21);
        assert!(tfidf.iter().all(|h| h.item_id != "hc"));
        let fuzzy = engine.by_fuzzy("harry", 20, 0.21);
        let f = fuzzy.iter().find(|h| h.item_id == "hc").unwrap().score;
        let hybrid = engine.by_hybrid("harry", 10, 0.3);
        let h = hybrid.iter().find(|h| h.item_id == "hc").unwrap().score;
        assert_eq!(h, f);
    }

    #[test]
    fn test_threshold_one_without_exact_title_is_empty() {
        let engine = engine();
        for method in [SearchMethod::Tfidf, SearchMethod::Fuzzy, SearchMethod::Hybrid] {
            assert!(engine.search("lord of the rings", 10, 1.0, method).is_empty());
        }
    }

    #[test]
    fn test_fuzzy_tolerates_misspelling() {
        let hits = engine().search("hary poter", 1, 0.5, SearchMethod::Fuzzy);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].item_id, "hp");
        assert_eq!(hits[0].method, MatchMethod::Fuzzy);
    }

    #[test]
    fn test_results_sorted_and_truncated() {
        let hits = engine().search("har", 2, 0.0, SearchMethod::Fuzzy);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn test_tfidf_filters_below_threshold() {
        let hits = engine().search("stone", 10, 0.3, SearchMethod::Tfidf);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].item_id, "ss");
        assert_eq!(hits[0].method, MatchMethod::Tfidf);
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("TFIDF".parse::<SearchMethod>().unwrap(), SearchMethod::Tfidf);
        assert_eq!("fuzzy".parse::<SearchMethod>().unwrap(), SearchMethod::Fuzzy);
        assert_eq!(SearchMethod::default(), SearchMethod::Hybrid);
        let err = "bm25".parse::<SearchMethod>().unwrap_err();
        assert_eq!(err.kind(), "invalid_parameter");
    }
}
