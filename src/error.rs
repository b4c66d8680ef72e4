//! Typed errors at the library seams.
//!
//! Storage backends and the salary calculator return these; everything
//! above the dispatcher degrades them into display text or `anyhow`
//! context, so neither type ever reaches a user unformatted.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(#[from] fjall::Error),

    #[error("failed to encode record for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("corrupt record for key '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Rejected salary computation input. The salary segment turns this into
/// its explicit failure text; it never crosses the dispatcher boundary.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid salary computation: {0}")]
pub struct InvalidComputation(pub String);
