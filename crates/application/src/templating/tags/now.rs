//! `{% now %}` - current date/time as ISO-8601, or a custom strftime
//! format when an argument is given.

use async_trait::async_trait;
use chrono::SecondsFormat;
use serde_json::Value;

use super::{ArgSpec, TemplateTag, format_datetime, opt_str_arg};
use crate::templating::error::ExtensionError;
use crate::templating::renderer::RenderPass;

/// Current date/time, ISO-8601 by default.
pub struct NowTag;

const ARGS: &[ArgSpec] = &[ArgSpec::optional("format")];

#[async_trait]
impl TemplateTag for NowTag {
    fn name(&self) -> &'static str {
        "now"
    }

    fn description(&self) -> &'static str {
        "Current date/time as ISO-8601, or a custom format"
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
            None => now.to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        Ok(Value::String(rendered))
    }
}
