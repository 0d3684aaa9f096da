//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! malformed paint-kit schemas, definition-store lookups, compositing-engine
//! failures, and generic errors.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("definition store error: {0}")]
    Store(String),

    #[error("engine error: {0}")]
    Engine(String),

    #[error("missing definition {def_type}:{defindex}")]
    MissingDefinition { def_type: u8, defindex: u32 },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
