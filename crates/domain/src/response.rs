//! Stored response records
//!
//! The document store keeps the responses a request has produced; the
//! `response` template tag reads the most recent one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::request::Header;

/// A response previously produced by a request, as persisted by the
/// document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// Id of the request that produced this response.
    pub request_id: String,

    /// HTTP status code.
    pub status: u16,

    /// Declared content type, e.g. `application/json`.
    pub content_type: String,

    /// Response headers.
    #[serde(default)]
    pub headers: Vec<Header>,

    /// Response body as text.
    pub body: String,

    /// When the response was recorded.
    pub created_at: DateTime<Utc>,
}

impl ResponseRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(
        request_id: impl Into<String>,
        status: u16,
        content_type: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            status,
            content_type: content_type.into(),
            headers: Vec::new(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }

    /// Whether the declared content type is JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type
            .to_ascii_lowercase()
            .contains("json")
    }

    /// Whether the declared content type is XML.
    #[must_use]
    pub fn is_xml(&self) -> bool {
        self.content_type.to_ascii_lowercase().contains("xml")
    }
}
