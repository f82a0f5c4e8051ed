//! Book/user/rating tables loaded from JSON files and pruned by minimum
//! activity before the engine is built.

use serde::de::DeserializeOwned;
use shelfwise_core::{Book, Rating, ShelfError, ShelfResult, User};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

pub const BOOKS_FILE: &str = "books.json";
pub const USERS_FILE: &str = "users.json";
pub const RATINGS_FILE: &str = "ratings.json";

/// Immutable snapshot of the three input tables. Books and users are
/// indexed by id when the catalog is constructed.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub books: Vec<Book>,
    pub users: Vec<User>,
    pub ratings: Vec<Rating>,
    book_rows: HashMap<String, usize>,
    user_rows: HashMap<u64, usize>,
}

impl Catalog {
    /// A duplicated ISBN or user id resolves to its first row.
    pub fn new(books: Vec<Book>, users: Vec<User>, ratings: Vec<Rating>) -> Self {
        let mut book_rows = HashMap::with_capacity(books.len());
        for (row, book) in books.iter().enumerate() {
            book_rows.entry(book.isbn.clone()).or_insert(row);
        }
        let mut user_rows = HashMap::with_capacity(users.len());
        for (row, user) in users.iter().enumerate() {
            user_rows.entry(user.user_id).or_insert(row);
        }

        Self {
            books,
            users,
            ratings,
            book_rows,
            user_rows,
        }
    }

    /// Read `books.json`, `users.json` and `ratings.json` from `dir`.
    pub fn load(dir: impl AsRef<Path>) -> ShelfResult<Self> {
        let dir = dir.as_ref();
        let books: Vec<Book> = read_table(&dir.join(BOOKS_FILE))?;
        let users: Vec<User> = read_table(&dir.join(USERS_FILE))?;
        let ratings: Vec<Rating> = read_table(&dir.join(RATINGS_FILE))?;

        info!(
            books = books.len(),
            users = users.len(),
            ratings = ratings.len(),
            path = %dir.display(),
            "Catalog loaded"
        );

        Ok(Self::new(books, users, ratings))
    }

    /// Drop sparse books, then inactive users, then sync the book and user
    /// tables with what survives in the ratings. Row order is preserved.
    pub fn prepare(self, min_book_ratings: usize, min_user_ratings: usize) -> Self {
        let Catalog {
            books,
            users,
            ratings,
            ..
        } = self;

        let book_counts = count_by(&ratings, |r| r.isbn.as_str());
        let ratings: Vec<Rating> = ratings
            .iter()
            .filter(|r| book_counts.get(r.isbn.as_str()).copied().unwrap_or(0) >= min_book_ratings)
            .cloned()
            .collect();

        let user_counts = count_by(&ratings, |r| r.user_id);
        let ratings: Vec<Rating> = ratings
            .into_iter()
            .filter(|r| user_counts.get(&r.user_id).copied().unwrap_or(0) >= min_user_ratings)
            .collect();

        let rated_books: HashSet<&str> = ratings.iter().map(|r| r.isbn.as_str()).collect();
        let rated_users: HashSet<u64> = ratings.iter().map(|r| r.user_id).collect();

        let books: Vec<Book> = books
            .into_iter()
            .filter(|b| rated_books.contains(b.isbn.as_str()))
            .collect();
        let users: Vec<User> = users
            .into_iter()
            .filter(|u| rated_users.contains(&u.user_id))
            .collect();

        info!(
            books = books.len(),
            users = users.len(),
            ratings = ratings.len(),
            min_book_ratings,
            min_user_ratings,
            "Catalog prepared"
        );

        Self::new(books, users, ratings)
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn book(&self, isbn: &str) -> Option<&Book> {
        self.book_rows.get(isbn).and_then(|&row| self.books.get(row))
    }

    pub fn user(&self, user_id: u64) -> Option<&User> {
        self.user_rows.get(&user_id).and_then(|&row| self.users.get(row))
    }

    pub fn ratings_for_user(&self, user_id: u64) -> impl Iterator<Item = &Rating> {
        self.ratings.iter().filter(move |r| r.user_id == user_id)
    }
}

fn read_table<T: DeserializeOwned>(path: &Path) -> ShelfResult<Vec<T>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ShelfError::Dataset(format!("failed to read {}: {e}", path.display())))?;
    Ok(serde_json::from_str(&raw)?)
}

fn count_by<'a, K, F>(ratings: &'a [Rating], key: F) -> HashMap<K, usize>
where
    K: std::hash::Hash + Eq,
    F: Fn(&'a Rating) -> K,
{
    let mut counts = HashMap::new();
    for rating in ratings {
        *counts.entry(key(rating)).or_insert(0) += 1;
    }
    counts
}
