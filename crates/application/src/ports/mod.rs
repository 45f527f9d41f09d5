//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the rendering core and external
//! systems. Each port is a trait implemented by adapters in the
//! infrastructure layer, which keeps the engine testable without a
//! live store or network.

mod clock;
mod document_store;

pub use clock::Clock;
pub use document_store::{DocumentStore, StoreError};
