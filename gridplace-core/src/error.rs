use std::time::Duration;

use gridplace_contracts::CollaboratorError;
use thiserror::Error;

/// Failure of a single fetch attempt, or of the last one after retries.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("timed out after {after:?} fetching {url}")]
    Timeout { url: String, after: Duration },
}

#[derive(Error, Debug)]
pub enum PlacementError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Empty payload for {url}")]
    EmptyPayload { url: String },

    #[error("Registration error: {0}")]
    Registration(#[source] CollaboratorError),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Canvas commit failed: {0}")]
    Commit(#[source] CollaboratorError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

pub type Result<T> = std::result::Result<T, PlacementError>;
