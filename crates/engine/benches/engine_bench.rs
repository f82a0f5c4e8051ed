//! Timing for snapshot build and the hot query paths.
//! Run with: cargo bench -p shelfwise-engine

use shelfwise_catalog::Catalog;
use shelfwise_core::config::EngineConfig;
use shelfwise_core::{Book, Rating};
use shelfwise_engine::{Recommender, SearchMethod};
use std::time::{Duration, Instant};

const WORDS: &[&str] = &[
    "shadow", "river", "garden", "empire", "winter", "storm", "secret", "castle", "ocean",
    "silver", "forest", "dragon", "night", "glass", "crown", "journey", "letters", "harbor",
];

fn synthetic_catalog(books: usize, users: u64) -> Catalog {
    let books: Vec<Book> = (0..books)
        .map(|i| Book {
            isbn: format!("{:010}", i),
            title: format!(
                "The {} of the {} {}",
                WORDS[i % WORDS.len()],
                WORDS[(i / 3) % WORDS.len()],
                WORDS[(i * 7 + 1) % WORDS.len()]
            ),
            author: format!("Author {}", i % 97),
            year: Some(1950 + (i % 70) as i32),
            image_url: String::new(),
        })
        .collect();

    let mut ratings = Vec::new();
    for user_id in 0..users {
        for j in 0..20u64 {
            let idx = ((user_id * 31 + j * 17) as usize) % books.len();
            ratings.push(Rating {
                user_id,
                isbn: books[idx].isbn.clone(),
                rating: ((user_id + j) % 10 + 1) as f32,
            });
        }
    }
    Catalog::new(books, Vec::new(), ratings)
}

fn report(name: &str, iterations: u32, elapsed: Duration) {
    println!("--- {} ---", name);
    println!("Iterations:  {}", iterations);
    println!("Total time:  {:?}", elapsed);
    println!("Per call:    {:?}", elapsed / iterations);
    println!(
        "Throughput:  {:.0} calls/sec",
        iterations as f64 / elapsed.as_secs_f64()
    );
}

fn main() {
    let catalog = synthetic_catalog(2_000, 1_500);
    let config = EngineConfig::default();

    let start = Instant::now();
    let recommender = Recommender::build(&catalog, &config).expect("Failed to build engine");
    println!("=== Engine Benchmark ===");
    println!("Build time:  {:?}", start.elapsed());
    println!("Ratings:     {}", catalog.ratings.len());

    let snapshot = recommender.snapshot();
    let iterations = 500;

    let start = Instant::now();
    for user_id in 0..iterations {
        let _ = snapshot.recommend_collaborative(user_id as u64, 10);
    }
    report("collaborative", iterations, start.elapsed());

    let start = Instant::now();
    for user_id in 0..iterations {
        let _ = snapshot.recommend_hybrid(user_id as u64, 10, None);
    }
    report("hybrid", iterations, start.elapsed());

    let start = Instant::now();
    for i in 0..iterations {
        let query = format!("{} {}", WORDS[i as usize % WORDS.len()], WORDS[0]);
        let _ = snapshot.search(&query, 10, 0.3, SearchMethod::Hybrid);
    }
    report("title search", iterations, start.elapsed());

    let start = Instant::now();
    for i in 0..iterations {
        let _ = snapshot.similar_books(&format!("{:010}", i), 10);
    }
    report("similar books", iterations, start.elapsed());
}
