//! Application use cases

mod render_request;

pub use render_request::{RenderRequestUseCase, build_context_for_request};
