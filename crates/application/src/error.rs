//! Application error types

use thiserror::Error;

use courier_domain::DomainError;

use crate::ports::StoreError;
use crate::templating::RenderError;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A render operation failed; see [`RenderError`] for the taxonomy.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// A domain rule was violated.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The document store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
