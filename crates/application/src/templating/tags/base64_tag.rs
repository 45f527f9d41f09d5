//! `{% base64 'encode'|'decode' value %}` - base64 conversion.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use super::{ArgSpec, TemplateTag, opt_str_arg, str_arg};
use crate::templating::error::ExtensionError;
use crate::templating::renderer::RenderPass;

/// Base64 encode/decode.
pub struct Base64Tag;

const ARGS: &[ArgSpec] = &[
    ArgSpec::required("operation"),
    ArgSpec::required("value"),
    ArgSpec::optional("charset"),
];

#[async_trait]
impl TemplateTag for Base64Tag {
    fn name(&self) -> &'static str {
        "base64"
    }

    fn description(&self) -> &'static str {
        "Encode or decode a value as standard base64"
    }

    fn arg_specs(&self) -> &'static [ArgSpec] {
        ARGS
    }

    async fn evaluate(
        &self,
        args: &[Value],
        _pass: &mut RenderPass<'_>,
    ) -> Result<Value, ExtensionError> {
        let operation = str_arg(args, 0, "operation")?;
        let value = str_arg(args, 1, "value")?;

        if let Some(charset) = opt_str_arg(args, 2) {
            let normalized = charset.to_ascii_lowercase();
            if !normalized.is_empty() && normalized != "utf-8" && normalized != "utf8" {
                return Err(ExtensionError::Encoding(format!(
                    "unsupported charset `{charset}`"
                )));
            }
        }

        match operation.as_str() {
            "encode" => Ok(Value::String(STANDARD.encode(value.as_bytes()))),
            "decode" => {
                let bytes = STANDARD.decode(value.as_bytes()).map_err(|e| {
                    ExtensionError::Encoding(format!("invalid base64 input: {e}"))
                })?;
                let text = String::from_utf8(bytes).map_err(|e| {
                    ExtensionError::Encoding(format!("decoded bytes are not valid UTF-8: {e}"))
                })?;
                Ok(Value::String(text))
            }
            other => Err(ExtensionError::InvalidArgument(format!(
                "base64 operation must be 'encode' or 'decode', got `{other}`"
            ))),
        }
    }
}
