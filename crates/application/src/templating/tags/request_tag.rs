//! `{% request property [header-name] %}` - properties of the request
//! currently being rendered.
//!
//! The property value is itself rendered within the same pass, so a
//! header may reference context variables. A property that references
//! itself (directly or through another property) is a cyclic
//! reference, detected by the pass's in-progress set.

use async_trait::async_trait;
use serde_json::Value;

use super::{ArgSpec, TemplateTag, opt_str_arg, str_arg};
use crate::templating::error::ExtensionError;
use crate::templating::renderer::RenderPass;

/// Exposes the currently-rendering request's own properties.
pub struct RequestTag;

const ARGS: &[ArgSpec] = &[
    ArgSpec::required("property"),
    ArgSpec::optional("header"),
];

#[async_trait]
impl TemplateTag for RequestTag {
    fn name(&self) -> &'static str {
        "request"
    }

    fn description(&self) -> &'static str {
        "A property of the request being rendered (url, name, header)"
    }

    fn arg_specs(&self) -> &'static [ArgSpec] {
        ARGS
    }

    async fn evaluate(
        &self,
        args: &[Value],
        pass: &mut RenderPass<'_>,
    ) -> Result<Value, ExtensionError> {
        let property = str_arg(args, 0, "property")?;
        let header = opt_str_arg(args, 1);
        pass.render_request_property(&property, header.as_deref())
            .await
    }
}
