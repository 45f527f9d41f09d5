//! Render-context cascade
//!
//! Flattens an ancestor chain plus the workspace environments into the
//! single mapping consumed by one render call. Precedence, lowest to
//! highest: ancestors (far to near), root environment, sub-environment.

use serde_json::{Map, Value};

use super::scope::Environment;
use crate::collection::RequestGroup;

/// Container scopes above a request, ordered from the most distant
/// ancestor to the nearest.
pub type AncestorChain = Vec<RequestGroup>;

/// The flat key/value mapping consumed during one render call.
///
/// Built fresh per render, never persisted, and discarded once the
/// renderer has consumed it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderContext {
    values: Map<String, Value>,
}

impl RenderContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a plain key.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Looks up a dotted path, descending into nested mappings
    /// (`user.name` reads `name` inside the `user` object).
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.values.get(segments.next()?)?;

        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }

        Some(current)
    }

    /// Inserts a single value, replacing any previous entry.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Merges a data mapping into the context. Incoming keys overwrite
    /// existing ones, which is what gives nearer scopes precedence.
    pub fn merge(&mut self, data: &Map<String, Value>) {
        for (key, value) in data {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Returns true if no scope contributed any value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of distinct keys after the cascade.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// The underlying flat mapping.
    #[must_use]
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl From<Map<String, Value>> for RenderContext {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

/// Flattens the scope cascade for one render call.
///
/// Merge order (later wins on shared keys):
/// 1. each ancestor container's inline data, most distant first;
/// 2. the workspace root environment;
/// 3. the active sub-environment.
///
/// Missing inputs contribute nothing. No input is mutated.
#[must_use]
pub fn build_render_context(
    ancestors: Option<&[RequestGroup]>,
    root: Option<&Environment>,
    sub: Option<&Environment>,
) -> RenderContext {
    let mut context = RenderContext::new();

    if let Some(ancestors) = ancestors {
        for group in ancestors {
            context.merge(&group.environment);
        }
    }

    if let Some(root) = root {
        context.merge(&root.data);
    }

    if let Some(sub) = sub {
        context.merge(&sub.data);
    }

    context
}
