//! Environment scopes and the render-context cascade
//!
//! A workspace owns exactly one root environment; sub-environments are
//! its direct children. Request groups carry their own inline data and
//! form the ancestor chain above a request (see [`crate::collection`]).

mod cascade;
mod scope;

pub use cascade::{AncestorChain, RenderContext, build_render_context};
pub use scope::{Environment, EnvironmentKind};
