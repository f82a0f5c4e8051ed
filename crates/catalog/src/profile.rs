//! Per-user summaries and catalogue-wide statistics.

use crate::dataset::Catalog;
use serde::{Deserialize, Serialize};
use shelfwise_core::{ShelfError, ShelfResult};

/// Lowest and highest rating on the explicit rating scale.
pub const RATING_RANGE: [u8; 2] = [0, 10];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: u64,
    pub location: Option<String>,
    pub age: Option<u32>,
    pub books_rated: usize,
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStatistics {
    pub total_users: usize,
    pub total_books: usize,
    pub total_ratings: usize,
    pub average_rating: f64,
    pub rating_range: [u8; 2],
}

impl Catalog {
    pub fn user_profile(&self, user_id: u64) -> ShelfResult<UserProfile> {
        let user = self.user(user_id).ok_or(ShelfError::UserNotFound(user_id))?;
        let ratings: Vec<f32> = self.ratings_for_user(user_id).map(|r| r.rating).collect();

        Ok(UserProfile {
            user_id,
            location: user.location.clone(),
            age: user.age,
            books_rated: ratings.len(),
            average_rating: mean(ratings.iter().copied()),
        })
    }

    pub fn statistics(&self) -> CatalogStatistics {
        CatalogStatistics {
            total_users: self.users.len(),
            total_books: self.books.len(),
            total_ratings: self.ratings.len(),
            average_rating: mean(self.ratings.iter().map(|r| r.rating)),
            rating_range: RATING_RANGE,
        }
    }
}

fn mean(values: impl Iterator<Item = f32>) -> f64 {
    let (sum, count) = values.fold((0.0_f64, 0usize), |(s, c), v| (s + v as f64, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
