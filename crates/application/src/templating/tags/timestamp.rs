//! `{% timestamp %}` - current time as Unix milliseconds, or a custom
//! chrono format when an argument is given.

use async_trait::async_trait;
use serde_json::Value;

use super::{ArgSpec, TemplateTag, format_datetime, opt_str_arg};
use crate::templating::error::ExtensionError;
use crate::templating::renderer::RenderPass;

/// Current time, Unix milliseconds by default.
pub struct TimestampTag;

const ARGS: &[ArgSpec] = &[ArgSpec::optional("format")];

#[async_trait]
impl TemplateTag for TimestampTag {
    fn name(&self) -> &'static str {
        "timestamp"
    }

    fn description(&self) -> &'static str {
        "Current time as Unix milliseconds, or a custom format"
    }

    fn arg_specs(&self) -> &'static [ArgSpec] {
        ARGS
    }

    async fn evaluate(
        &self,
        args: &[Value],
        pass: &mut RenderPass<'_>,
    ) -> Result<Value, ExtensionError> {
        let now = pass.clock().now();
        let rendered = match opt_str_arg(args, 0).filter(|f| !f.is_empty()) {
            Some(format) => format_datetime(&now, &format)?,
            None => now.timestamp_millis().to_string(),
        };
        Ok(Value::String(rendered))
    }
}
