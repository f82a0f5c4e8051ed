//! Most-rated items, used for anonymous traffic and as a cold-start fallback.

use crate::similarity::top_k;
use shelfwise_core::{Interaction, ScoredItem};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct PopularityRanker {
    ranked: Vec<ScoredItem>,
}

impl PopularityRanker {
    /// Count ratings per item. The score of an item is its rating count.
    pub fn build(interactions: &[Interaction]) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for interaction in interactions {
            *counts.entry(interaction.isbn.as_str()).or_default() += 1;
        }
        let items: Vec<ScoredItem> = counts
            .into_iter()
            .map(|(item_id, count)| ScoredItem::new(item_id, count as f64))
            .collect();
        let total = items.len();
        Self {
            ranked: top_k(items, total),
        }
    }

    pub fn top(&self, k: usize) -> Vec<ScoredItem> {
        self.ranked.iter().take(k).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(user_id: u64, isbn: &str) -> Interaction {
        Interaction {
            user_id,
            isbn: isbn.to_string(),
            rating: 5.0,
        }
    }

    #[test]
    fn test_ranked_by_count_then_id() {
        let ranker = PopularityRanker::build(&[
            rating(1, "b"),
            rating(2, "b"),
            rating(1, "c"),
            rating(2, "c"),
            rating(3, "a"),
            rating(3, "c"),
        ]);
        let top = ranker.top(10);
        let ids: Vec<_> = top.iter().map(|s| s.item_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
        assert_eq!(top[0].score, 3.0);
        assert_eq!(ranker.top(1).len(), 1);
    }

    #[test]
    fn test_empty_ratings() {
        let ranker = PopularityRanker::build(&[]);
        assert!(ranker.is_empty());
        assert!(ranker.top(5).is_empty());
    }
}
