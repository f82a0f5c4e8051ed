#![warn(clippy::unwrap_used)]

pub mod error;
pub mod recommend_rest;
pub mod rest;
pub mod server;
pub mod user_rest;

pub use error::{ApiError, ErrorResponse};
pub use rest::AppState;
pub use server::{router, ApiServer};
