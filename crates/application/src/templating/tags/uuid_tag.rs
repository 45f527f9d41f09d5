//! `{% uuid %}` - a freshly generated version-4 UUID.
//!
//! Not idempotent: every evaluation produces a new value, so two
//! occurrences in the same template render differently.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::{ArgSpec, TemplateTag};
use crate::templating::error::ExtensionError;
use crate::templating::renderer::RenderPass;

/// Fresh UUID v4 per evaluation.
pub struct UuidTag;

const ARGS: &[ArgSpec] = &[];

#[async_trait]
impl TemplateTag for UuidTag {
    fn name(&self) -> &'static str {
        "uuid"
    }

    fn description(&self) -> &'static str {
        "A freshly generated version-4 UUID"
    }

    fn arg_specs(&self) -> &'static [ArgSpec] {
        ARGS
    }

    async fn evaluate(
        &self,
        _args: &[Value],
        _pass: &mut RenderPass<'_>,
    ) -> Result<Value, ExtensionError> {
        Ok(Value::String(Uuid::new_v4().to_string()))
    }
}
