#![warn(clippy::unwrap_used)]

pub mod dataset;
pub mod profile;

pub use dataset::Catalog;
pub use profile::{CatalogStatistics, UserProfile};
