//! TF-IDF vector space fitted over one text field of the item table.
//!
//! Row `i` of the index always corresponds to document `i` of the corpus it
//! was fitted on. There is no incremental update; a changed item set means
//! fitting a new index.

use crate::similarity::cosine_with_norms;
use crate::text::{Analyzer, StopWords};
use ndarray::Array1;
use shelfwise_core::{ShelfError, ShelfResult};
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Clone)]
pub struct EmbeddingOptions {
    /// Keep only the most frequent terms across the corpus.
    pub max_terms: Option<usize>,
    pub ngram_range: (usize, usize),
    pub stop_words: StopWords,
}

impl Default for EmbeddingOptions {
    fn default() -> Self {
        Self {
            max_terms: None,
            ngram_range: (1, 1),
            stop_words: StopWords::English,
        }
    }
}

/// Sparse term-weight vector, entries sorted by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f32)>,
    norm: f32,
}

impl SparseVector {
    fn from_weights(weights: HashMap<usize, f32>) -> Self {
        let mut entries: Vec<(usize, f32)> = weights.into_iter().collect();
        entries.sort_by_key(|&(col, _)| col);
        let norm = entries.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in entries.iter_mut() {
                *w /= norm;
            }
        }
        let norm = if norm > 0.0 { 1.0 } else { 0.0 };
        Self { entries, norm }
    }

    pub fn entries(&self) -> &[(usize, f32)] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f32 {
        self.norm
    }

    fn dot_dense(&self, dense: &[f32]) -> f32 {
        self.entries.iter().map(|&(col, w)| w * dense[col]).sum()
    }

    fn to_dense(&self, dim: usize) -> Vec<f32> {
        let mut dense = vec![0.0; dim];
        for &(col, w) in &self.entries {
            dense[col] = w;
        }
        dense
    }
}

#[derive(Debug, Clone)]
pub struct TextEmbeddingIndex {
    analyzer: Analyzer,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    rows: Vec<SparseVector>,
}

impl TextEmbeddingIndex {
    /// Fit the vocabulary and IDF weights on `corpus` and embed every
    /// document. Missing text should be passed as the empty string.
    pub fn fit<S: AsRef<str>>(corpus: &[S], options: &EmbeddingOptions) -> ShelfResult<Self> {
        if corpus.is_empty() {
            return Err(ShelfError::EmptyDataset(
                "cannot fit an embedding index on an empty corpus".to_string(),
            ));
        }

        let analyzer = Analyzer::new(options.ngram_range, options.stop_words);
        let documents: Vec<Vec<String>> =
            corpus.iter().map(|doc| analyzer.terms(doc.as_ref())).collect();

        let mut term_freq: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for terms in &documents {
            let mut seen: Vec<&str> = Vec::with_capacity(terms.len());
            for term in terms {
                *term_freq.entry(term.as_str()).or_insert(0) += 1;
                if !seen.contains(&term.as_str()) {
                    seen.push(term.as_str());
                    *doc_freq.entry(term.as_str()).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(&str, usize)> = term_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        if let Some(max_terms) = options.max_terms {
            ranked.truncate(max_terms);
        }
        let mut kept: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
        kept.sort_unstable();

        // Smoothed IDF: ln((1 + n) / (1 + df)) + 1
        let n_docs = documents.len() as f32;
        let idf: Vec<f32> = kept
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or(0) as f32;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        let vocabulary: HashMap<String, usize> = kept
            .iter()
            .enumerate()
            .map(|(col, term)| (term.to_string(), col))
            .collect();

        let mut index = Self {
            analyzer,
            vocabulary,
            idf,
            rows: Vec::new(),
        };
        index.rows = documents.iter().map(|terms| index.embed_terms(terms)).collect();

        info!(
            documents = index.rows.len(),
            terms = index.vocabulary.len(),
            ngram_max = options.ngram_range.1,
            "Embedding index fitted"
        );
        Ok(index)
    }

    fn embed_terms(&self, terms: &[String]) -> SparseVector {
        let mut weights: HashMap<usize, f32> = HashMap::new();
        for term in terms {
            if let Some(&col) = self.vocabulary.get(term) {
                *weights.entry(col).or_insert(0.0) += self.idf[col];
            }
        }
        SparseVector::from_weights(weights)
    }

    /// Embed arbitrary text in this index's space. Unknown terms carry no
    /// weight, so fully out-of-vocabulary text becomes the zero vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        self.embed_terms(&self.analyzer.terms(text))
    }

    /// Cosine of `vector` against every row, aligned with corpus order.
    pub fn similarity_to_vector(&self, vector: &SparseVector) -> Array1<f64> {
        if vector.is_zero() {
            return Array1::zeros(self.rows.len());
        }
        let dense = vector.to_dense(self.vocabulary.len());
        self.rows
            .iter()
            .map(|row| cosine_with_norms(row.dot_dense(&dense), row.norm(), vector.norm()))
            .collect()
    }

    pub fn similarity_to_text(&self, text: &str) -> Array1<f64> {
        self.similarity_to_vector(&self.transform(text))
    }

    /// Cosine of an indexed document against every row.
    pub fn similarity_to_row(&self, row: usize) -> Option<Array1<f64>> {
        self.rows.get(row).map(|v| self.similarity_to_vector(v))
    }

    pub fn row(&self, row: usize) -> Option<&SparseVector> {
        self.rows.get(row)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.vocabulary.len())
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }
}
