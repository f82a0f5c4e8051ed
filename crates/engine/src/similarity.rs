//! Cosine similarity and deterministic top-k selection shared by the engines.

use ndarray::{Array1, Array2, ArrayView1};
use shelfwise_core::ScoredItem;
use std::cmp::Ordering;

/// Cosine of two dense vectors. Zero vectors score 0 against anything.
pub fn cosine(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f64 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    cosine_with_norms(a.dot(&b), norm_a, norm_b)
}

pub(crate) fn cosine_with_norms(dot: f32, norm_a: f32, norm_b: f32) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot as f64) / (norm_a as f64 * norm_b as f64)
}

/// Cosine of `target` against every row of `matrix`, given precomputed row norms.
pub fn cosine_to_rows(
    matrix: &Array2<f32>,
    row_norms: &Array1<f32>,
    target: ArrayView1<'_, f32>,
) -> Array1<f64> {
    let target_norm = target.dot(&target).sqrt();
    let dots = matrix.dot(&target);
    dots.iter()
        .zip(row_norms.iter())
        .map(|(&dot, &norm)| cosine_with_norms(dot, norm, target_norm))
        .collect()
}

/// Descending by score, ties by item id ascending.
pub fn compare_ranked(a: &ScoredItem, b: &ScoredItem) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.item_id.cmp(&b.item_id))
}

/// Sort and truncate to `k`.
pub fn top_k(mut items: Vec<ScoredItem>, k: usize) -> Vec<ScoredItem> {
    items.sort_by(compare_ranked);
    items.truncate(k);
    items
}
