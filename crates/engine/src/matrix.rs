//! Dense user × item rating matrix pivoted from the interaction table.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use shelfwise_core::{Interaction, ShelfError, ShelfResult};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::info;

/// Ratings indexed by user (rows) and item (columns); absent pairs are 0.
///
/// Rows are ordered by ascending user id and columns by ascending item id,
/// so the same interaction table always yields the same layout.
#[derive(Debug, Clone)]
pub struct InteractionMatrix {
    user_ids: Vec<u64>,
    item_ids: Vec<String>,
    user_rows: HashMap<u64, usize>,
    item_cols: HashMap<String, usize>,
    ratings: Array2<f32>,
    row_norms: Array1<f32>,
    interactions: usize,
}

pub struct InteractionMatrixBuilder;

impl InteractionMatrixBuilder {
    /// Pivot the interaction table. Duplicate (user, item) pairs are averaged.
    pub fn build(interactions: &[Interaction]) -> ShelfResult<InteractionMatrix> {
        if interactions.is_empty() {
            return Err(ShelfError::EmptyDataset(
                "interaction table has no rows".to_string(),
            ));
        }

        let user_ids: Vec<u64> = interactions
            .iter()
            .map(|i| i.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let item_ids: Vec<String> = interactions
            .iter()
            .map(|i| i.isbn.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        let user_rows: HashMap<u64, usize> =
            user_ids.iter().enumerate().map(|(row, &id)| (id, row)).collect();
        let item_cols: HashMap<String, usize> = item_ids
            .iter()
            .enumerate()
            .map(|(col, id)| (id.clone(), col))
            .collect();

        let mut cells: BTreeMap<(usize, usize), (f32, u32)> = BTreeMap::new();
        for interaction in interactions {
            let row = user_rows[&interaction.user_id];
            let col = item_cols[interaction.isbn.as_str()];
            let cell = cells.entry((row, col)).or_insert((0.0, 0));
            cell.0 += interaction.rating;
            cell.1 += 1;
        }

        let mut ratings = Array2::<f32>::zeros((user_ids.len(), item_ids.len()));
        for ((row, col), (sum, count)) in &cells {
            ratings[[*row, *col]] = sum / *count as f32;
        }

        let row_norms = ratings.map_axis(Axis(1), |row| row.dot(&row).sqrt());

        info!(
            users = user_ids.len(),
            items = item_ids.len(),
            interactions = interactions.len(),
            "Interaction matrix built"
        );

        Ok(InteractionMatrix {
            user_ids,
            item_ids,
            user_rows,
            item_cols,
            ratings,
            row_norms,
            interactions: cells.len(),
        })
    }
}

impl InteractionMatrix {
    pub fn shape(&self) -> (usize, usize) {
        self.ratings.dim()
    }

    pub fn user_ids(&self) -> &[u64] {
        &self.user_ids
    }

    pub fn item_ids(&self) -> &[String] {
        &self.item_ids
    }

    /// Number of distinct (user, item) cells that came from the table.
    pub fn interaction_count(&self) -> usize {
        self.interactions
    }

    pub fn user_row(&self, user_id: u64) -> Option<usize> {
        self.user_rows.get(&user_id).copied()
    }

    pub fn item_column(&self, item_id: &str) -> Option<usize> {
        self.item_cols.get(item_id).copied()
    }

    pub fn row(&self, row: usize) -> ArrayView1<'_, f32> {
        self.ratings.row(row)
    }

    pub fn row_norm(&self, row: usize) -> f32 {
        self.row_norms[row]
    }

    pub fn row_norms(&self) -> &Array1<f32> {
        &self.row_norms
    }

    pub fn ratings(&self) -> &Array2<f32> {
        &self.ratings
    }

    pub fn rating(&self, user_id: u64, item_id: &str) -> Option<f32> {
        let row = self.user_row(user_id)?;
        let col = self.item_column(item_id)?;
        Some(self.ratings[[row, col]])
    }

    /// Non-zero ratings of one user as (item id, rating), in column order.
    pub fn user_ratings(&self, user_id: u64) -> Option<Vec<(&str, f32)>> {
        let row = self.user_row(user_id)?;
        Some(
            self.ratings
                .row(row)
                .iter()
                .enumerate()
                .filter(|&(_, &r)| r > 0.0)
                .map(|(col, &r)| (self.item_ids[col].as_str(), r))
                .collect(),
        )
    }
}
