//! Template rendering engine
//!
//! Turns strings containing `{{ variable }}` references and
//! `{% tag ... %}` invocations into fully resolved values against a
//! flattened [`RenderContext`](courier_domain::RenderContext).
//!
//! # Usage
//!
//! ```ignore
//! let engine = TemplateEngine::new(store, clock);
//! let context = build_render_context(Some(&ancestors), Some(&root), Some(&sub));
//! let url = engine.render("{{ base_url }}/users", &context).await?;
//! ```

pub mod error;
pub mod filters;
pub mod parser;
pub mod renderer;
pub mod tags;

pub use error::{ExtensionError, RenderError, RenderResult};
pub use parser::{TagArg, TagCall, Token, has_expressions, parse_template};
pub use renderer::{RenderPass, TemplateEngine};
pub use tags::{ArgSpec, TagDescriptor, TagRegistry, TemplateTag};

use serde_json::Value;

/// String form of a context value when substituted into a template.
/// `Null` and missing values render empty; composites render as
/// compact JSON.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        composite => composite.to_string(),
    }
}
