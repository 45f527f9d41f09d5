//! Document store port
//!
//! Read-side interface over the persistent document tree (requests,
//! groups, environments, responses). Template evaluation only ever
//! reads through this port; no writes originate from a render.

use async_trait::async_trait;

use courier_domain::{Environment, Request, RequestGroup, ResponseRecord};

/// Errors raised by a document store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the backing storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document could not be decoded.
    #[error("corrupt document: {0}")]
    Corrupt(String),

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Read access to the document tree.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Loads a request by id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails; a missing
    /// document is `Ok(None)`.
    async fn request_by_id(&self, id: &str) -> Result<Option<Request>, StoreError>;

    /// Loads a request group by id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails.
    async fn request_group_by_id(&self, id: &str) -> Result<Option<RequestGroup>, StoreError>;

    /// Loads an environment by id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails.
    async fn environment_by_id(&self, id: &str) -> Result<Option<Environment>, StoreError>;

    /// Loads the workspace root environment, if one exists.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails.
    async fn root_environment(&self) -> Result<Option<Environment>, StoreError>;

    /// Loads the most recent stored response for a request.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails; a request that
    /// has never been sent is `Ok(None)`.
    async fn latest_response(&self, request_id: &str)
    -> Result<Option<ResponseRecord>, StoreError>;
}
