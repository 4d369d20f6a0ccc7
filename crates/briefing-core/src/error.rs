//! Storage-level error types.

use thiserror::Error;

/// Errors surfaced by the post store and its backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The lookup or delete target does not exist. Always distinct from an
    /// empty-but-valid listing.
    #[error("post not found")]
    NotFound,

    /// The configured backend is unreachable or a command against it failed.
    /// Propagated without retry; retry policy belongs to the caller.
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// A stored document or record is corrupt beyond what the decode
    /// fallback can absorb.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Local file I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
