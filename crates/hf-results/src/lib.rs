//! hf-results: analysis result cache, key hashing and persistence hooks.
//!
//! The engine memoises every public operation in a [`ResultCache`] keyed by
//! [`CacheKey`]. Keys embed the schematic version, so a reload makes older
//! entries unreachable without any eviction pass. Persistence goes through the
//! [`ResultStore`] trait only.

pub mod cache;
pub mod hash;
pub mod store;
pub mod types;

pub use cache::{CacheStats, ResultCache};
pub use hash::{key_digest, params_digest};
pub use store::{FileStore, MemoryStore, ResultStore, StoredResult};
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Result not found: {key}")]
    NotFound { key: String },

    #[error("Invalid store path: {message}")]
    InvalidPath { message: String },
}
