use thiserror::Error;

pub type ShelfResult<T> = Result<T, ShelfError>;

#[derive(Error, Debug)]
pub enum ShelfError {
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    #[error("Cold start: user {user_id} has no interaction history")]
    ColdStart { user_id: u64 },

    #[error("No similar users found for user {user_id}")]
    NoSimilarUsers { user_id: u64 },

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(u64),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ShelfError {
    /// Stable snake_case tag used in boundary error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ShelfError::EmptyDataset(_) => "empty_dataset",
            ShelfError::ColdStart { .. } => "cold_start",
            ShelfError::NoSimilarUsers { .. } => "no_similar_users",
            ShelfError::ItemNotFound(_) => "item_not_found",
            ShelfError::UserNotFound(_) => "user_not_found",
            ShelfError::InvalidParameter(_) => "invalid_parameter",
            ShelfError::Config(_) => "config_error",
            ShelfError::Dataset(_) => "dataset_error",
            ShelfError::Serialization(_) => "serialization_error",
            ShelfError::Io(_) => "io_error",
            ShelfError::Internal(_) => "internal_error",
        }
    }

    /// Well-formed requests about something the engine does not know.
    /// These are expected outcomes, not faults, and are never retried.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ShelfError::ColdStart { .. }
                | ShelfError::NoSimilarUsers { .. }
                | ShelfError::ItemNotFound(_)
                | ShelfError::UserNotFound(_)
        )
    }
}
