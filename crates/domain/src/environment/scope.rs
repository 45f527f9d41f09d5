//! Environment scope types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DomainError, DomainResult};
use crate::id::generate_id;

/// Position of an environment in the workspace tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentKind {
    /// The single workspace-level environment.
    Root,
    /// A direct child of the root environment.
    Sub,
}

/// A named key/value environment scope.
///
/// Scopes form a two-level tree: one root per workspace, with
/// zero-or-more sub-environments as its direct children. Values are
/// arbitrary JSON so booleans and nested mappings survive the cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Unique identifier.
    pub id: String,

    /// Parent environment id. `None` for the root.
    pub parent_id: Option<String>,

    /// Display name.
    pub name: String,

    /// Inline variable data.
    #[serde(default)]
    pub data: Map<String, Value>,

    /// Private environments are excluded from workspace sync/export.
    #[serde(default)]
    pub is_private: bool,

    /// Whether this is the workspace root or a sub-environment.
    pub kind: EnvironmentKind,
}

impl Environment {
    /// Creates a workspace root environment.
    #[must_use]
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            parent_id: None,
            name: name.into(),
            data: Map::new(),
            is_private: false,
            kind: EnvironmentKind::Root,
        }
    }

    /// Creates a sub-environment under the given root.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidEnvironmentParent`] if `parent` is
    /// not a root environment; the workspace tree resolves only one
    /// level of sub-environments.
    pub fn sub(parent: &Environment, name: impl Into<String>) -> DomainResult<Self> {
        if parent.kind != EnvironmentKind::Root {
            return Err(DomainError::InvalidEnvironmentParent(parent.id.clone()));
        }

        Ok(Self {
            id: generate_id(),
            parent_id: Some(parent.id.clone()),
            name: name.into(),
            data: Map::new(),
            is_private: false,
            kind: EnvironmentKind::Sub,
        })
    }

    /// Sets a data entry, replacing any previous value for the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// Replaces the whole data mapping.
    #[must_use]
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Marks the environment as private.
    #[must_use]
    pub fn private(mut self) -> Self {
        self.is_private = true;
        self
    }
}
