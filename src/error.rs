use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Failed to parse package identifier '{input}': {reason}")]
pub struct ParseError {
    pub input: String,
    pub reason: &'static str,
}

impl ParseError {
    pub(crate) fn new(input: &str, reason: &'static str) -> Self {
        ParseError {
            input: input.to_string(),
            reason,
        }
    }
}

/// Failures talking to the package catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a single pipeline run. Never carries a partial result.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    BackingStore(#[from] CatalogError),

    #[error("Request did not complete within {0:?}")]
    Timeout(Duration),
}
