//! ID generation utilities.

use uuid::Uuid;

/// Generates a new UUID v4 as a string.
///
/// This is the standard ID format for all Courier entities.
#[must_use]
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
