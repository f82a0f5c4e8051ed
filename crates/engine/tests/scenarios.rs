//! End-to-end behaviour of the engine through its public API.

use shelfwise_catalog::Catalog;
use shelfwise_core::config::EngineConfig;
use shelfwise_core::{Book, Interaction, MatchMethod, ShelfError};
use shelfwise_engine::{
    CollaborativeEngine, CollaborativeParams, ContentEngine, HybridRecommender, HybridWeights,
    InteractionMatrixBuilder, Recommender, SearchMethod, TitleSearchEngine,
};

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

fn three_user_table() -> Vec<Interaction> {
    vec![
        rating(1, "A", 9.0),
        rating(1, "B", 8.0),
        rating(2, "A", 9.0),
        rating(2, "B", 7.0),
        rating(2, "C", 2.0),
        rating(3, "C", 10.0),
    ]
}

fn library() -> Vec<Book> {
    vec![
        book("0439708184", "Harry Potter and the Sorcerer's Stone", "J. K. Rowling"),
        book("0439064872", "Harry Potter and the Chamber of Secrets", "J. K. Rowling"),
        book("0439136350", "Harry Potter and the Prisoner of Azkaban", "J. K. Rowling"),
        book("0345339681", "The Hobbit", "J. R. R. Tolkien"),
        book("0345339703", "The Fellowship of the Ring", "J. R. R. Tolkien"),
        book("0064400557", "Harold and the Purple Crayon", "Crockett Johnson"),
        book("0141439513", "Pride and Prejudice", "Jane Austen"),
    ]
}

#[test]
fn test_nearest_neighbor_recommends_unseen_item() {
    let matrix = InteractionMatrixBuilder::build(&three_user_table()).unwrap();
    let engine = CollaborativeEngine::new(matrix, CollaborativeParams::default());

    let neighbors = engine.neighbors(1).unwrap();
    assert_eq!(neighbors[0].user_id, 2);

    let recs = engine.recommend(1, 1).unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].item_id, "C");
}

#[test]
fn test_unknown_user_is_cold_start_everywhere() {
    let matrix = InteractionMatrixBuilder::build(&three_user_table()).unwrap();
    let cf = CollaborativeEngine::new(matrix, CollaborativeParams::default());
    let cb = ContentEngine::build(&library(), 500).unwrap();

    assert!(matches!(
        cf.recommend(404, 5),
        Err(ShelfError::ColdStart { user_id: 404 })
    ));
    let hybrid = HybridRecommender::new(&cf, &cb, 3.0);
    assert!(matches!(
        hybrid.recommend(404, 5, HybridWeights::default()),
        Err(ShelfError::ColdStart { user_id: 404 })
    ));
}

#[test]
fn test_matrix_ordering_is_deterministic() {
    let mut shuffled = three_user_table();
    shuffled.reverse();
    let first = InteractionMatrixBuilder::build(&three_user_table()).unwrap();
    let second = InteractionMatrixBuilder::build(&shuffled).unwrap();
    assert_eq!(first.user_ids(), second.user_ids());
    assert_eq!(first.item_ids(), second.item_ids());
    assert_eq!(first.ratings(), second.ratings());
}

#[test]
fn test_harry_ranks_harry_potter_first() {
    let titles = vec![
        book("hp", "Harry Potter", ""),
        book("ss", "Sorcerer's Stone", ""),
        book("hc", "Harold and the Crayon", ""),
    ];
    let search = TitleSearchEngine::build(&titles, 300).unwrap();
    let hits = search.search("harry", 10, 0.3, SearchMethod::Hybrid);
    assert_eq!(hits[0].item_id, "hp");
    assert!(hits.iter().all(|h| h.method == MatchMethod::Hybrid));
}

#[test]
fn test_strict_threshold_without_exact_title_is_empty() {
    let search = TitleSearchEngine::build(&library(), 300).unwrap();
    for method in [SearchMethod::Tfidf, SearchMethod::Fuzzy, SearchMethod::Hybrid] {
        assert!(search.search("wizard school", 10, 1.0, method).is_empty());
    }
}

#[test]
fn test_hybrid_score_is_mean_of_components() {
    let search = TitleSearchEngine::build(&library(), 300).unwrap();
    let query = "harry potter chamber";
    let relaxed = 0.3 * 0.7;
    let tfidf = search.by_tfidf(query, 20, relaxed);
    let fuzzy = search.by_fuzzy(query, 20, relaxed);

    for hit in search.by_hybrid(query, 10, 0.3) {
        let t = tfidf.iter().find(|h| h.item_id == hit.item_id);
        let f = fuzzy.iter().find(|h| h.item_id == hit.item_id);
        let expected = match (t, f) {
            (Some(t), Some(f)) => (t.score + f.score) / 2.0,
            (Some(t), None) => t.score,
            (None, Some(f)) => f.score,
            (None, None) => panic!("hybrid hit {} not in either pool", hit.item_id),
        };
        assert!((hit.score - expected).abs() < 1e-12);
    }
}

#[test]
fn test_content_never_returns_reference() {
    let books = library();
    let engine = ContentEngine::build(&books, 500).unwrap();
    for b in &books {
        let similar = engine.similar_to(&b.isbn, books.len()).unwrap();
        assert!(similar.iter().all(|s| s.item_id != b.isbn));
    }
}

#[test]
fn test_hybrid_overlap_scores_sum_of_weights() {
    let books = vec![
        book("A", "Dune", "Frank Herbert"),
        book("B", "Dune Messiah", "Frank Herbert"),
        book("C", "Children of Dune", "Frank Herbert"),
        book("D", "Emma", "Jane Austen"),
    ];
    let table = vec![
        rating(1, "A", 9.0),
        rating(1, "D", 2.0),
        rating(2, "A", 8.0),
        rating(2, "D", 3.0),
        rating(2, "C", 7.0),
    ];
    let cf = CollaborativeEngine::new(
        InteractionMatrixBuilder::build(&table).unwrap(),
        CollaborativeParams::default(),
    );
    let cb = ContentEngine::build(&books, 500).unwrap();
    let hybrid = HybridRecommender::new(&cf, &cb, 3.0);

    for (wcf, wcb) in [(0.4, 0.6), (0.9, 0.05)] {
        let weights = HybridWeights {
            collaborative: wcf,
            content: wcb,
        };
        let recs = hybrid.recommend(1, 5, weights).unwrap();
        let c = recs.iter().find(|r| r.item_id == "C").unwrap();
        assert!((c.score - (wcf + wcb)).abs() < 1e-12);
    }
}

#[test]
fn test_snapshot_serves_every_operation() {
    let catalog = Catalog::new(
        library(),
        Vec::new(),
        vec![
            rating(10, "0439708184", 9.0),
            rating(10, "0439064872", 8.0),
            rating(11, "0439708184", 8.0),
            rating(11, "0439064872", 9.0),
            rating(11, "0439136350", 10.0),
            rating(12, "0141439513", 7.0),
            rating(12, "0345339681", 6.0),
        ],
    );
    let recommender = Recommender::build(&catalog, &EngineConfig::default()).unwrap();
    let snapshot = recommender.snapshot();

    let cf = snapshot.recommend_collaborative(10, 5).unwrap();
    assert_eq!(cf[0].item_id, "0439136350");

    let hybrid = snapshot.recommend_hybrid(10, 5, None).unwrap();
    assert_eq!(hybrid[0].item_id, "0439136350");
    assert!(hybrid.iter().all(|r| r.method == MatchMethod::Hybrid));

    let (reference, similar) = snapshot.similar_books_by_title("the hobbit", 3).unwrap();
    assert_eq!(reference.item_id, "0345339681");
    assert_eq!(similar[0].item_id, "0345339703");

    let found = snapshot
        .search("harry potter", 3, 0.3, SearchMethod::Hybrid)
        .unwrap();
    assert_eq!(found.len(), 3);
    assert!(found.iter().all(|r| r.title.as_deref().is_some_and(|t| t.starts_with("Harry"))));

    let stats = serde_json::to_value(snapshot.stats()).unwrap();
    assert_eq!(stats["users"], 3);
    assert_eq!(stats["ratings"], 7);
}
