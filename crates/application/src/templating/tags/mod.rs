//! Template tags
//!
//! A tag is a named, pluggable evaluator invoked from `{% tag ... %}`
//! expressions. The registry combines the built-in set with externally
//! registered tags and is injected into the engine rather than living
//! in a global, so tests can supply a minimal set.

mod base64_tag;
mod now;
mod request_tag;
mod response_tag;
mod timestamp;
mod uuid_tag;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::error::ExtensionError;
use super::renderer::RenderPass;

pub use base64_tag::Base64Tag;
pub use now::NowTag;
pub use request_tag::RequestTag;
pub use response_tag::ResponseTag;
pub use timestamp::TimestampTag;
pub use uuid_tag::UuidTag;

/// Describes one positional argument a tag accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    /// Argument name, for documentation and error messages.
    pub name: &'static str,
    /// Whether the argument must be supplied.
    pub required: bool,
}

impl ArgSpec {
    /// A required argument.
    #[must_use]
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
        }
    }

    /// An optional argument.
    #[must_use]
    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            required: false,
        }
    }
}

/// Descriptor for one registered tag, for pickers and documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDescriptor {
    /// Tag name as written in templates.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Positional argument specs.
    pub args: Vec<ArgSpec>,
}

/// The tag evaluation capability.
///
/// Evaluators may suspend (the `response` tag reads the document
/// store); purely synchronous tags simply complete without awaiting.
#[async_trait]
pub trait TemplateTag: Send + Sync {
    /// Tag name as written in templates.
    fn name(&self) -> &'static str;

    /// One-line description.
    fn description(&self) -> &'static str;

    /// Positional arguments this tag accepts, in order.
    fn arg_specs(&self) -> &'static [ArgSpec];

    /// Evaluates the tag. Arguments arrive already resolved: literals
    /// as their JSON values, bare identifiers looked up in the context
    /// (`Null` when absent).
    async fn evaluate(
        &self,
        args: &[Value],
        pass: &mut RenderPass<'_>,
    ) -> Result<Value, ExtensionError>;
}

/// Mapping from tag name to evaluator.
pub struct TagRegistry {
    tags: HashMap<String, Arc<dyn TemplateTag>>,
}

impl TagRegistry {
    /// A registry with no tags at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tags: HashMap::new(),
        }
    }

    /// A registry carrying the built-in tag set.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(TimestampTag));
        registry.register(Arc::new(NowTag));
        registry.register(Arc::new(UuidTag));
        registry.register(Arc::new(Base64Tag));
        registry.register(Arc::new(ResponseTag));
        registry.register(Arc::new(RequestTag));
        registry
    }

    /// Registers a tag, replacing any previous one with the same name.
    pub fn register(&mut self, tag: Arc<dyn TemplateTag>) {
        self.tags.insert(tag.name().to_string(), tag);
    }

    /// Looks up a tag by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn TemplateTag>> {
        self.tags.get(name).cloned()
    }

    /// Whether a tag with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    /// Descriptors for every registered tag, sorted by name.
    #[must_use]
    pub fn descriptors(&self) -> Vec<TagDescriptor> {
        let mut descriptors: Vec<TagDescriptor> = self
            .tags
            .values()
            .map(|tag| TagDescriptor {
                name: tag.name().to_string(),
                description: tag.description().to_string(),
                args: tag.arg_specs().to_vec(),
            })
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Validates argument count against the tag's specs.
pub(crate) fn check_arity(tag: &dyn TemplateTag, args: &[Value]) -> Result<(), ExtensionError> {
    let specs = tag.arg_specs();
    let required = specs.iter().filter(|s| s.required).count();

    if args.len() < required {
        let missing = specs[args.len()].name;
        return Err(ExtensionError::InvalidArgument(format!(
            "`{}` requires argument `{missing}`",
            tag.name()
        )));
    }
    if args.len() > specs.len() {
        return Err(ExtensionError::InvalidArgument(format!(
            "`{}` takes at most {} argument(s), got {}",
            tag.name(),
            specs.len(),
            args.len()
        )));
    }

    Ok(())
}

/// Coerces a required string argument. `Null` (an unresolved context
/// reference) coerces to the empty string, matching variable behavior.
pub(crate) fn str_arg(args: &[Value], index: usize, name: &str) -> Result<String, ExtensionError> {
    args.get(index)
        .map(super::value_to_string)
        .ok_or_else(|| ExtensionError::InvalidArgument(format!("argument `{name}` is required")))
}

/// Coerces an optional string argument.
pub(crate) fn opt_str_arg(args: &[Value], index: usize) -> Option<String> {
    args.get(index).map(super::value_to_string)
}

/// Formats a timestamp with a user-supplied strftime string. Unknown
/// specifiers are rejected here; letting them reach chrono's `Display`
/// would abort the process instead of failing the render.
pub(crate) fn format_datetime(
    at: &DateTime<Utc>,
    format: &str,
) -> Result<String, ExtensionError> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(ExtensionError::InvalidArgument(format!(
            "invalid time format `{format}`"
        )));
    }
    Ok(at.format_with_items(items.into_iter()).to_string())
}
