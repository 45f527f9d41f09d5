//! Request groups
//!
//! Folder-like containers that nest to arbitrary depth above a request
//! and may carry inline environment data for the cascade.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::generate_id;

/// A folder grouping requests, optionally carrying inline environment
/// data that participates in the render cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestGroup {
    /// Unique identifier.
    pub id: String,

    /// Parent group id, or `None` when the group sits at workspace level.
    pub parent_id: Option<String>,

    /// Display name.
    pub name: String,

    /// Inline environment data merged into the cascade.
    #[serde(default)]
    pub environment: Map<String, Value>,
}

impl RequestGroup {
    /// Creates a workspace-level group.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            parent_id: None,
            name: name.into(),
            environment: Map::new(),
        }
    }

    /// Creates a group nested under another group.
    #[must_use]
    pub fn child_of(parent: &RequestGroup, name: impl Into<String>) -> Self {
        let mut group = Self::new(name);
        group.parent_id = Some(parent.id.clone());
        group
    }

    /// Sets an inline environment entry.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.environment.insert(key.into(), value.into());
    }
}
