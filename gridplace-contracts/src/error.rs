//! Errors shared by every collaborator.

use thiserror::Error;

/// Failure reported by a canvas, storage or transport collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The collaborator does not offer the requested optional capability.
    #[error("capability not supported: {0}")]
    Unsupported(&'static str),

    /// The collaborator refused the input (bad bytes, unknown handle, ...).
    #[error("rejected by host: {0}")]
    Rejected(String),

    /// The backing store or transport failed.
    #[error("host backend error: {0}")]
    Backend(String),
}
