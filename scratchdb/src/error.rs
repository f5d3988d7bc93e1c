use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScratchDbError {
    #[error("Invalid body: {0}")]
    InvalidBody(String),

    #[error("Collection not found: {name}")]
    CollectionNotFound { name: String },

    #[error("Item not found: {collection}/{id}")]
    ItemNotFound { collection: String, id: String },

    #[error("Id conflict: {collection} already has an item with id {id}")]
    IdConflict { collection: String, id: i64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ScratchDbError {
    /// Machine-readable category string carried on every error response.
    pub fn category(&self) -> &'static str {
        match self {
            ScratchDbError::InvalidBody(_) => "InvalidBody",
            ScratchDbError::CollectionNotFound { .. } => "CollectionNotFound",
            ScratchDbError::ItemNotFound { .. } => "ItemNotFound",
            ScratchDbError::IdConflict { .. } => "IdConflict",
            ScratchDbError::Io(_) | ScratchDbError::Json(_) => "StorageFailure",
            ScratchDbError::Other(_) => "InternalError",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScratchDbError>;
