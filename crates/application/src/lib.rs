//! Courier Application - Rendering engine and use cases
//!
//! This crate hosts the template rendering engine: the expression
//! parser, the recursive renderer, the tag registry with its built-in
//! extensions, and the use cases that assemble render contexts from the
//! document store. External systems are reached only through the ports
//! defined here.

pub mod error;
pub mod ports;
pub mod templating;
pub mod use_cases;

pub use error::{ApplicationError, ApplicationResult};
pub use templating::{
    ExtensionError, RenderError, RenderResult, TagRegistry, TemplateEngine, TemplateTag,
};
pub use use_cases::{RenderRequestUseCase, build_context_for_request};
