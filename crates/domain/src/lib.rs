//! Courier Domain - Core business types
//!
//! This crate defines the domain model for the Courier HTTP client's
//! rendering core. All types here are pure Rust with no I/O dependencies.

pub mod collection;
pub mod environment;
pub mod error;
pub mod id;
pub mod request;
pub mod response;

pub use collection::RequestGroup;
pub use environment::{
    AncestorChain, Environment, EnvironmentKind, RenderContext, build_render_context,
};
pub use error::{DomainError, DomainResult};
pub use id::generate_id;
pub use request::{Header, Request};
pub use response::ResponseRecord;
