#![warn(clippy::unwrap_used)]

pub mod key;
pub mod result;

pub use key::CacheKey;
pub use result::ResultCache;
