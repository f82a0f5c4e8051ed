use serde::{Deserialize, Serialize};

/// A book in the catalogue. The ISBN is the item key everywhere in the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub isbn: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: u64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
}

/// One (user, book, rating) row. Ratings are on the 0–10 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: u64,
    pub isbn: String,
    pub rating: f32,
}

pub type Interaction = Rating;

/// Which method produced a ranked record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Collaborative,
    ContentBased,
    Hybrid,
    Popularity,
    Tfidf,
    Fuzzy,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Collaborative => "collaborative",
            MatchMethod::ContentBased => "content_based",
            MatchMethod::Hybrid => "hybrid",
            MatchMethod::Popularity => "popularity",
            MatchMethod::Tfidf => "tfidf",
            MatchMethod::Fuzzy => "fuzzy",
        }
    }
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Item id plus score, as produced by the ranking engines before the
/// outbound record is assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item_id: String,
    pub score: f64,
}

impl ScoredItem {
    pub fn new(item_id: impl Into<String>, score: f64) -> Self {
        Self {
            item_id: item_id.into(),
            score,
        }
    }
}

/// Outbound record handed to the boundary layer. Book fields are absent
/// when the item is missing from the book table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub score: f64,
    pub method: MatchMethod,
}

impl Recommendation {
    pub fn from_book(book: Option<&Book>, scored: ScoredItem, method: MatchMethod) -> Self {
        Self {
            title: book.map(|b| b.title.clone()),
            author: book.map(|b| b.author.clone()),
            year: book.and_then(|b| b.year),
            image_url: book.map(|b| b.image_url.clone()),
            item_id: scored.item_id,
            score: scored.score,
            method,
        }
    }
}
