//! Item-to-item similarity over title + author text.

use crate::embedding::{EmbeddingOptions, TextEmbeddingIndex};
use crate::search::{SearchHit, SearchMethod, TitleSearchEngine};
use crate::similarity::top_k;
use crate::text::StopWords;
use shelfwise_core::{Book, ScoredItem, ShelfError, ShelfResult};
use std::collections::HashMap;
use tracing::debug;

/// Score forced onto the reference item so it can never rank.
const SELF_SENTINEL: f64 = -1.0;

pub struct ContentEngine {
    item_ids: Vec<String>,
    rows: HashMap<String, usize>,
    index: TextEmbeddingIndex,
}

impl ContentEngine {
    /// Fit the content index on `"title author"`. Rows follow `books`; a
    /// duplicated ISBN resolves to its first row.
    pub fn build(books: &[Book], max_terms: usize) -> ShelfResult<Self> {
        let corpus: Vec<String> = books
            .iter()
            .map(|b| format!("{} {}", b.title, b.author).to_lowercase())
            .collect();
        let index = TextEmbeddingIndex::fit(
            &corpus,
            &EmbeddingOptions {
                max_terms: Some(max_terms),
                ngram_range: (1, 1),
                stop_words: StopWords::English,
            },
        )?;

        let item_ids: Vec<String> = books.iter().map(|b| b.isbn.clone()).collect();
        let mut rows = HashMap::with_capacity(item_ids.len());
        for (row, id) in item_ids.iter().enumerate() {
            rows.entry(id.clone()).or_insert(row);
        }

        Ok(Self {
            item_ids,
            rows,
            index,
        })
    }

    pub fn index(&self) -> &TextEmbeddingIndex {
        &self.index
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.rows.contains_key(item_id)
    }

    /// The `k` items most similar to `item_id`, never including itself.
    pub fn similar_to(&self, item_id: &str, k: usize) -> ShelfResult<Vec<ScoredItem>> {
        let &row = self
            .rows
            .get(item_id)
            .ok_or_else(|| ShelfError::ItemNotFound(item_id.to_string()))?;
        let mut scores = self
            .index
            .similarity_to_row(row)
            .ok_or_else(|| ShelfError::ItemNotFound(item_id.to_string()))?;
        scores[row] = SELF_SENTINEL;

        let candidates = scores
            .iter()
            .enumerate()
            .filter(|&(other, _)| other != row && self.item_ids[other] != item_id)
            .map(|(other, &score)| ScoredItem::new(self.item_ids[other].clone(), score))
            .collect();
        Ok(top_k(candidates, k))
    }

    /// Resolve a free-text title through hybrid search, then recommend
    /// items similar to the best match. The search runs with a pool sized
    /// for `k` hits and keeps the first.
    pub fn similar_to_title(
        &self,
        search: &TitleSearchEngine,
        query: &str,
        k: usize,
        threshold: f64,
    ) -> ShelfResult<(SearchHit, Vec<ScoredItem>)> {
        let reference = search
            .search(query, k.max(1), threshold, SearchMethod::Hybrid)
            .into_iter()
            .next()
            .ok_or_else(|| ShelfError::ItemNotFound(format!("no title matches '{query}'")))?;
        debug!(query, reference = %reference.item_id, "Resolved reference title");
        let similar = self.similar_to(&reference.item_id, k)?;
        Ok((reference, similar))
    }
}
