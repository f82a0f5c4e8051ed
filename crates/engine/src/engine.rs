//! Immutable engine snapshot plus the copy-then-swap publisher that serves
//! it to concurrent readers.

use crate::collaborative::{CollaborativeEngine, CollaborativeParams};
use crate::content::ContentEngine;
use crate::hybrid::{HybridRecommender, HybridWeights};
use crate::matrix::InteractionMatrixBuilder;
use crate::popularity::PopularityRanker;
use crate::search::{SearchMethod, TitleSearchEngine};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use shelfwise_catalog::Catalog;
use shelfwise_core::config::EngineConfig;
use shelfwise_core::{Book, MatchMethod, Recommendation, ScoredItem, ShelfError, ShelfResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Sizes of everything a snapshot was built from.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub users: usize,
    pub items: usize,
    pub books: usize,
    pub ratings: usize,
    pub matrix_shape: (usize, usize),
    pub content_index_shape: (usize, usize),
    pub title_index_shape: (usize, usize),
    pub content_vocabulary: usize,
    pub title_vocabulary: usize,
    pub built_at: DateTime<Utc>,
}

pub struct EngineSnapshot {
    books: HashMap<String, Book>,
    collaborative: CollaborativeEngine,
    content: ContentEngine,
    search: TitleSearchEngine,
    popularity: PopularityRanker,
    settings: EngineConfig,
    rating_count: usize,
    built_at: DateTime<Utc>,
}

impl EngineSnapshot {
    /// Build every matrix and index from an already-prepared catalog.
    pub fn build(catalog: &Catalog, settings: &EngineConfig) -> ShelfResult<Self> {
        let started = Instant::now();

        let matrix = InteractionMatrixBuilder::build(&catalog.ratings)?;
        let collaborative = CollaborativeEngine::new(matrix, CollaborativeParams::from(settings));
        let content = ContentEngine::build(&catalog.books, settings.content_max_terms)?;
        let search = TitleSearchEngine::build(&catalog.books, settings.title_max_terms)?;
        let popularity = PopularityRanker::build(&catalog.ratings);

        let mut books = HashMap::with_capacity(catalog.books.len());
        for book in &catalog.books {
            books.entry(book.isbn.clone()).or_insert_with(|| book.clone());
        }

        let elapsed = started.elapsed();
        metrics::histogram!("engine.build_ms").record(elapsed.as_secs_f64() * 1000.0);
        info!(
            users = collaborative.matrix().shape().0,
            items = collaborative.matrix().shape().1,
            books = books.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Engine snapshot built"
        );

        Ok(Self {
            books,
            collaborative,
            content,
            search,
            popularity,
            settings: settings.clone(),
            rating_count: catalog.ratings.len(),
            built_at: Utc::now(),
        })
    }

    fn enrich(&self, items: Vec<ScoredItem>, method: MatchMethod) -> Vec<Recommendation> {
        items
            .into_iter()
            .map(|item| {
                let book = self.books.get(&item.item_id);
                Recommendation::from_book(book, item, method)
            })
            .collect()
    }

    pub fn recommend_collaborative(
        &self,
        user_id: u64,
        k: usize,
    ) -> ShelfResult<Vec<Recommendation>> {
        metrics::counter!("engine.collaborative.requests").increment(1);
        let items = self.collaborative.recommend(user_id, k)?;
        Ok(self.enrich(items, MatchMethod::Collaborative))
    }

    /// Hybrid recommendations. `weights` falls back to the configured blend.
    pub fn recommend_hybrid(
        &self,
        user_id: u64,
        k: usize,
        weights: Option<HybridWeights>,
    ) -> ShelfResult<Vec<Recommendation>> {
        metrics::counter!("engine.hybrid.requests").increment(1);
        let weights = weights.unwrap_or(HybridWeights {
            collaborative: self.settings.weight_cf,
            content: self.settings.weight_cb,
        });
        let hybrid = HybridRecommender::new(
            &self.collaborative,
            &self.content,
            self.settings.liked_threshold,
        );
        let items = hybrid.recommend(user_id, k, weights)?;
        Ok(self.enrich(items, MatchMethod::Hybrid))
    }

    pub fn similar_books(&self, isbn: &str, k: usize) -> ShelfResult<Vec<Recommendation>> {
        metrics::counter!("engine.content.requests").increment(1);
        let items = self.content.similar_to(isbn, k)?;
        Ok(self.enrich(items, MatchMethod::ContentBased))
    }

    /// Resolve `title` to a reference book, then return books similar to it.
    pub fn similar_books_by_title(
        &self,
        title: &str,
        k: usize,
    ) -> ShelfResult<(Recommendation, Vec<Recommendation>)> {
        metrics::counter!("engine.content.requests").increment(1);
        let (reference, items) = self.content.similar_to_title(
            &self.search,
            title,
            k,
            self.settings.search_threshold,
        )?;
        let method = reference.method;
        let reference = Recommendation::from_book(
            self.books.get(&reference.item_id),
            reference.into(),
            method,
        );
        Ok((reference, self.enrich(items, MatchMethod::ContentBased)))
    }

    pub fn popular(&self, k: usize) -> Vec<Recommendation> {
        metrics::counter!("engine.popularity.requests").increment(1);
        self.enrich(self.popularity.top(k), MatchMethod::Popularity)
    }

    pub fn search(
        &self,
        query: &str,
        k: usize,
        threshold: f64,
        method: SearchMethod,
    ) -> ShelfResult<Vec<Recommendation>> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ShelfError::InvalidParameter(format!(
                "threshold must be within [0, 1], got {threshold}"
            )));
        }
        metrics::counter!("engine.search.requests").increment(1);
        let hits = self.search.search(query, k, threshold, method);
        if hits.is_empty() {
            metrics::counter!("engine.search.empty").increment(1);
        }
        Ok(self.enrich(
            hits.into_iter().map(ScoredItem::from).collect(),
            method.tag(),
        ))
    }

    pub fn stats(&self) -> EngineStats {
        let matrix = self.collaborative.matrix();
        EngineStats {
            users: matrix.shape().0,
            items: matrix.shape().1,
            books: self.books.len(),
            ratings: self.rating_count,
            matrix_shape: matrix.shape(),
            content_index_shape: self.content.index().shape(),
            title_index_shape: self.search.index().shape(),
            content_vocabulary: self.content.index().vocabulary_size(),
            title_vocabulary: self.search.index().vocabulary_size(),
            built_at: self.built_at,
        }
    }
}

/// Publishes the current [`EngineSnapshot`]. Readers take an `Arc` and
/// keep using it even if a rebuild swaps in a newer one meanwhile.
pub struct Recommender {
    current: RwLock<Arc<EngineSnapshot>>,
    settings: EngineConfig,
    generation: AtomicU64,
}

impl Recommender {
    pub fn build(catalog: &Catalog, settings: &EngineConfig) -> ShelfResult<Self> {
        let snapshot = EngineSnapshot::build(catalog, settings)?;
        metrics::gauge!("engine.generation").set(1.0);
        Ok(Self {
            current: RwLock::new(Arc::new(snapshot)),
            settings: settings.clone(),
            generation: AtomicU64::new(1),
        })
    }

    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        self.current.read().clone()
    }

    /// Build a fresh snapshot and publish it. On failure the previous
    /// snapshot stays live.
    pub fn rebuild(&self, catalog: &Catalog) -> ShelfResult<u64> {
        info!(ratings = catalog.ratings.len(), "Rebuilding engine snapshot");
        let snapshot = match EngineSnapshot::build(catalog, &self.settings) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                metrics::counter!("engine.rebuild_failures").increment(1);
                error!(error = %e, "Engine rebuild failed, keeping previous snapshot");
                return Err(e);
            }
        };

        let mut current = self.current.write();
        *current = Arc::new(snapshot);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        drop(current);

        metrics::gauge!("engine.generation").set(generation as f64);
        info!(generation, "Engine snapshot swapped");
        Ok(generation)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
