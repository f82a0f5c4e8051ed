pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{ShelfError, ShelfResult};
pub use types::{Book, Interaction, MatchMethod, Rating, Recommendation, ScoredItem, User};
