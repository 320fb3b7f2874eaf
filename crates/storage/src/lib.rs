//! Storage Layer
//!
//! SQLite persistence for classification results, insert-only.

mod repository;

pub use repository::{ClassificationRecord, ResultRepository};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Record not found")]
    NotFound,
}
