//! User-based collaborative filtering over the interaction matrix.

use crate::matrix::InteractionMatrix;
use crate::similarity::{cosine_to_rows, top_k};
use ndarray::Array1;
use shelfwise_core::config::EngineConfig;
use shelfwise_core::{ScoredItem, ShelfError, ShelfResult};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct CollaborativeParams {
    /// Neighbors whose ratings contribute to a prediction.
    pub neighbors: usize,
    /// A neighbor must be strictly more similar than this...
    pub floor: f64,
    /// ...and strictly less similar than this (excludes exact duplicates).
    pub ceiling: f64,
}

impl Default for CollaborativeParams {
    fn default() -> Self {
        Self {
            neighbors: 10,
            floor: 0.1,
            ceiling: 0.99,
        }
    }
}

impl From<&EngineConfig> for CollaborativeParams {
    fn from(config: &EngineConfig) -> Self {
        Self {
            neighbors: config.cf_neighbors,
            floor: config.similarity_floor,
            ceiling: config.similarity_ceiling,
        }
    }
}

/// A user similar to the target, with its cosine similarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub user_id: u64,
    pub similarity: f64,
}

pub struct CollaborativeEngine {
    matrix: InteractionMatrix,
    params: CollaborativeParams,
}

impl CollaborativeEngine {
    pub fn new(matrix: InteractionMatrix, params: CollaborativeParams) -> Self {
        Self { matrix, params }
    }

    pub fn matrix(&self) -> &InteractionMatrix {
        &self.matrix
    }

    pub fn params(&self) -> CollaborativeParams {
        self.params
    }

    /// Cosine similarity of the user's rating vector against every row.
    pub fn similarities(&self, user_id: u64) -> ShelfResult<Array1<f64>> {
        let row = self
            .matrix
            .user_row(user_id)
            .ok_or(ShelfError::ColdStart { user_id })?;
        Ok(cosine_to_rows(
            self.matrix.ratings(),
            self.matrix.row_norms(),
            self.matrix.row(row),
        ))
    }

    /// Top-N most similar other users.
    ///
    /// Fails with `NoSimilarUsers` unless at least one user falls strictly
    /// between the floor and the ceiling. Once that holds, the top-N are
    /// chosen by raw similarity among all other users.
    pub fn neighbors(&self, user_id: u64) -> ShelfResult<Vec<Neighbor>> {
        let target = self
            .matrix
            .user_row(user_id)
            .ok_or(ShelfError::ColdStart { user_id })?;
        let similarities = self.similarities(user_id)?;

        let qualifying = similarities
            .iter()
            .enumerate()
            .filter(|&(row, &sim)| {
                row != target && sim > self.params.floor && sim < self.params.ceiling
            })
            .count();
        if qualifying == 0 {
            debug!(user_id, "No users within the similarity band");
            return Err(ShelfError::NoSimilarUsers { user_id });
        }

        let user_ids = self.matrix.user_ids();
        let mut neighbors: Vec<Neighbor> = similarities
            .iter()
            .enumerate()
            .filter(|&(row, _)| row != target)
            .map(|(row, &similarity)| Neighbor {
                user_id: user_ids[row],
                similarity,
            })
            .collect();
        neighbors.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        neighbors.truncate(self.params.neighbors);

        debug!(
            user_id,
            qualifying,
            neighbors = neighbors.len(),
            "Neighbor set selected"
        );
        Ok(neighbors)
    }

    /// Recommend up to `k` items the user has not rated.
    ///
    /// `score(item) = Σ sim(user, n) * rating(n, item)` over neighbors that
    /// rated the item. Every top-N neighbor makes its rated items candidates,
    /// so a zero-similarity neighbor adds items scored 0.
    pub fn recommend(&self, user_id: u64, k: usize) -> ShelfResult<Vec<ScoredItem>> {
        let neighbors = self.neighbors(user_id)?;
        let target = self
            .matrix
            .user_row(user_id)
            .ok_or(ShelfError::ColdStart { user_id })?;
        let seen = self.matrix.row(target);
        let item_ids = self.matrix.item_ids();

        let mut scores: HashMap<usize, f64> = HashMap::new();
        for neighbor in &neighbors {
            let Some(row) = self.matrix.user_row(neighbor.user_id) else {
                continue;
            };
            for (col, &rating) in self.matrix.row(row).iter().enumerate() {
                if rating > 0.0 && seen[col] == 0.0 {
                    *scores.entry(col).or_insert(0.0) += neighbor.similarity * rating as f64;
                }
            }
        }

        let candidates = scores
            .into_iter()
            .map(|(col, score)| ScoredItem::new(item_ids[col].clone(), score))
            .collect();
        Ok(top_k(candidates, k))
    }
}
