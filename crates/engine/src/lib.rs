//! Recommendation and title matching engine: collaborative filtering over
//! the rating matrix, TF-IDF content similarity, fuzzy title search and
//! the hybrid blends built on top of them.

#![warn(clippy::unwrap_used)]

pub mod collaborative;
pub mod content;
pub mod embedding;
pub mod engine;
pub mod fuzzy;
pub mod hybrid;
pub mod matrix;
pub mod popularity;
pub mod search;
pub mod similarity;
pub mod text;

pub use collaborative::{CollaborativeEngine, CollaborativeParams, Neighbor};
pub use content::ContentEngine;
pub use embedding::{EmbeddingOptions, SparseVector, TextEmbeddingIndex};
pub use engine::{EngineSnapshot, EngineStats, Recommender};
pub use fuzzy::FuzzyMatcher;
pub use hybrid::{HybridRecommender, HybridWeights};
pub use matrix::{InteractionMatrix, InteractionMatrixBuilder};
pub use popularity::PopularityRanker;
pub use search::{SearchHit, SearchMethod, TitleSearchEngine};
