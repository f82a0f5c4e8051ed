//! Weighted fusion of collaborative and content signal for one user.

use crate::collaborative::CollaborativeEngine;
use crate::content::ContentEngine;
use crate::similarity::top_k;
use shelfwise_core::{ScoredItem, ShelfError, ShelfResult};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridWeights {
    pub collaborative: f64,
    pub content: f64,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            collaborative: 0.4,
            content: 0.6,
        }
    }
}

pub struct HybridRecommender<'a> {
    collaborative: &'a CollaborativeEngine,
    content: &'a ContentEngine,
    liked_threshold: f32,
}

impl<'a> HybridRecommender<'a> {
    pub fn new(
        collaborative: &'a CollaborativeEngine,
        content: &'a ContentEngine,
        liked_threshold: f32,
    ) -> Self {
        Self {
            collaborative,
            content,
            liked_threshold,
        }
    }

    /// The user's highest-rated item above the liked threshold that the
    /// content index knows about. Ties go to the smaller item id.
    pub fn liked_item(&self, user_id: u64) -> ShelfResult<Option<String>> {
        let mut liked: Vec<(&str, f32)> = self
            .collaborative
            .matrix()
            .user_ratings(user_id)
            .ok_or(ShelfError::ColdStart { user_id })?
            .into_iter()
            .filter(|&(_, rating)| rating > self.liked_threshold)
            .collect();
        liked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        Ok(liked
            .into_iter()
            .map(|(item_id, _)| item_id)
            .find(|item_id| self.content.contains(item_id))
            .map(str::to_string))
    }

    /// Every collaboratively recommended item accumulates a flat
    /// `weights.collaborative`; every item similar to the user's liked item
    /// accumulates `weights.content`. Items from both get the sum.
    ///
    /// A user absent from the interaction matrix is a cold start and fails.
    /// A user without qualifying neighbors gets content signal only, and a
    /// user with no liked item gets collaborative signal only.
    pub fn recommend(
        &self,
        user_id: u64,
        k: usize,
        weights: HybridWeights,
    ) -> ShelfResult<Vec<ScoredItem>> {
        let mut scores: HashMap<String, f64> = HashMap::new();

        match self.collaborative.recommend(user_id, k) {
            Ok(items) => {
                for item in items {
                    *scores.entry(item.item_id).or_insert(0.0) += weights.collaborative;
                }
            }
            Err(ShelfError::NoSimilarUsers { .. }) => {
                debug!(user_id, "No collaborative contribution, no similar users");
            }
            Err(e) => return Err(e),
        }

        match self.liked_item(user_id)? {
            Some(liked) => {
                let matrix = self.collaborative.matrix();
                for item in self.content.similar_to(&liked, k)? {
                    let already_rated = matrix
                        .rating(user_id, &item.item_id)
                        .is_some_and(|r| r > 0.0);
                    if already_rated {
                        continue;
                    }
                    *scores.entry(item.item_id).or_insert(0.0) += weights.content;
                }
            }
            None => {
                debug!(
                    user_id,
                    liked_threshold = self.liked_threshold,
                    "No liked item, skipping content contribution"
                );
            }
        }

        let candidates = scores
            .into_iter()
            .map(|(item_id, score)| ScoredItem::new(item_id, score))
            .collect();
        Ok(top_k(candidates, k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborative::CollaborativeParams;
    use crate::matrix::InteractionMatrixBuilder;
    use shelfwise_core::{Book, Interaction};

    fn rating(user_id: u64, isbn: &str, rating: f32) -> Interaction {
        Interaction {
            user_id,
            isbn: isbn.to_string(),
            rating,
        }
    }

    fn book(isbn: &str, title: &str, author: &str) -> Book {
        Book {
            isbn: isbn.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            year: None,
            image_url: String::new(),
        }
    }

    fn books() -> Vec<Book> {
        vec![
            book("A", "Dune", "Frank Herbert"),
            book("B", "Dune Messiah", "Frank Herbert"),
            book("C", "Children of Dune", "Frank Herbert"),
            book("D", "Emma", "Jane Austen"),
            book("E", "Persuasion", "Jane Austen"),
        ]
    }

    fn engines(table: &[Interaction]) -> (CollaborativeEngine, ContentEngine) {
        let cf = CollaborativeEngine::new(
            InteractionMatrixBuilder::build(table).unwrap(),
            CollaborativeParams::default(),
        );
        let cb = ContentEngine::build(&books(), 500).unwrap();
        (cf, cb)
    }

    #[test]
    fn test_item_from_both_signals_gets_summed_weights() {
        // User 1 loves Dune; user 2 is similar and also read Children of Dune.
        let table = vec![
            rating(1, "A", 9.0),
            rating(1, "D", 2.0),
            rating(2, "A", 8.0),
            rating(2, "D", 3.0),
            rating(2, "C", 7.0),
        ];
        let (cf, cb) = engines(&table);
        let hybrid = HybridRecommender::new(&cf, &cb, 3.0);
        let weights = HybridWeights {
            collaborative: 0.4,
            content: 0.6,
        };
        let recs = hybrid.recommend(1, 5, weights).unwrap();

        let c = recs.iter().find(|r| r.item_id == "C").unwrap();
        assert!((c.score - 1.0).abs() < 1e-12);
        assert_eq!(recs[0].item_id, "C");

        let b = recs.iter().find(|r| r.item_id == "B").unwrap();
        assert!((b.score - 0.6).abs() < 1e-12);
        assert!(recs.iter().all(|r| r.item_id != "A" && r.item_id != "D"));
    }

    #[test]
    fn test_no_liked_item_gives_pure_collaborative() {
        let table = vec![
            rating(1, "A", 2.0),
            rating(1, "D", 1.0),
            rating(2, "A", 3.0),
            rating(2, "D", 1.0),
            rating(2, "E", 6.0),
        ];
        let (cf, cb) = engines(&table);
        let hybrid = HybridRecommender::new(&cf, &cb, 3.0);
        assert_eq!(hybrid.liked_item(1).unwrap(), None);

        let recs = hybrid.recommend(1, 5, HybridWeights::default()).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].item_id, "E");
        assert!((recs[0].score - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_cold_start_propagates() {
        let (cf, cb) = engines(&[rating(1, "A", 9.0), rating(2, "A", 9.0)]);
        let hybrid = HybridRecommender::new(&cf, &cb, 3.0);
        assert!(matches!(
            hybrid.recommend(77, 5, HybridWeights::default()),
            Err(ShelfError::ColdStart { user_id: 77 })
        ));
    }

    #[test]
    fn test_no_similar_users_still_gets_content() {
        let table = vec![rating(1, "A", 9.0), rating(2, "E", 8.0)];
        let (cf, cb) = engines(&table);
        let hybrid = HybridRecommender::new(&cf, &cb, 3.0);
        let recs = hybrid.recommend(1, 5, HybridWeights::default()).unwrap();
        assert!(!recs.is_empty());
        assert!(recs.iter().all(|r| (r.score - 0.6).abs() < 1e-12));
        assert!(recs.iter().any(|r| r.item_id == "B"));
    }

    #[test]
    fn test_already_rated_similar_items_are_skipped() {
        // Dune Messiah is the closest title to Dune, but user 1 already rated it.
        let table = vec![
            rating(1, "A", 9.0),
            rating(1, "B", 2.0),
            rating(2, "A", 8.0),
            rating(2, "B", 3.0),
            rating(2, "C", 5.0),
        ];
        let (cf, cb) = engines(&table);
        let similar = cb.similar_to("A", 5).unwrap();
        assert!(similar.iter().any(|s| s.item_id == "B"));

        let hybrid = HybridRecommender::new(&cf, &cb, 3.0);
        assert_eq!(hybrid.liked_item(1).unwrap().as_deref(), Some("A"));
        let recs = hybrid.recommend(1, 5, HybridWeights::default()).unwrap();
        assert!(!recs.is_empty());
        assert!(recs.iter().all(|r| r.item_id != "A" && r.item_id != "B"));
        assert_eq!(recs[0].item_id, "C");
    }

    #[test]
    fn test_liked_item_prefers_highest_rating() {
        let table = vec![rating(1, "A", 5.0), rating(1, "D", 9.0), rating(2, "A", 4.0)];
        let (cf, cb) = engines(&table);
        let hybrid = HybridRecommender::new(&cf, &cb, 3.0);
        assert_eq!(hybrid.liked_item(1).unwrap().as_deref(), Some("D"));
    }
}
