//! `{% response request_id filter %}` - cross-request lookup.
//!
//! Reads the most recent stored response for another request through
//! the document store port and extracts a value from its body. The
//! filter dialect follows the declared content type: a JSONPath subset
//! for JSON, an element path for XML.

use async_trait::async_trait;
use serde_json::Value;

use super::{ArgSpec, TemplateTag, str_arg};
use crate::templating::error::ExtensionError;
use crate::templating::filters::{filter_json, filter_xml};
use crate::templating::renderer::RenderPass;

/// Extracts a value from another request's latest response.
pub struct ResponseTag;

const ARGS: &[ArgSpec] = &[
    ArgSpec::required("request"),
    ArgSpec::required("filter"),
];

#[async_trait]
impl TemplateTag for ResponseTag {
    fn name(&self) -> &'static str {
        "response"
    }

    fn description(&self) -> &'static str {
        "Value extracted from another request's most recent response"
    }

    fn arg_specs(&self) -> &'static [ArgSpec] {
        ARGS
    }

    async fn evaluate(
        &self,
        args: &[Value],
        pass: &mut RenderPass<'_>,
    ) -> Result<Value, ExtensionError> {
        let request_id = str_arg(args, 0, "request")?;
        let filter = str_arg(args, 1, "filter")?;
        if request_id.is_empty() {
            return Err(ExtensionError::InvalidArgument(
                "argument `request` must name a request".to_string(),
            ));
        }

        let record = pass.lookup_response(&request_id).await?;

        if record.is_json() {
            filter_json(&record.body, &filter)
        } else if record.is_xml() {
            filter_xml(&record.body, &filter)
        } else {
            Err(ExtensionError::Filter(format!(
                "no filter available for content type `{}`",
                record.content_type
            )))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use courier_domain::{RenderContext, ResponseRecord};

    use crate::templating::test_support::{FakeStore, FixedClock};
    use crate::templating::{ExtensionError, RenderError, TemplateEngine};

    fn extension_error(err: RenderError) -> ExtensionError {
        match err {
            RenderError::Extension { source, .. } => source,
            RenderError::TemplateSyntax { .. } => panic!("expected extension error"),
        }
    }

    #[tokio::test]
    async fn test_no_response_yet_is_a_reference_error() {
        let engine = TemplateEngine::new(FakeStore::new(), Arc::new(FixedClock::at_epoch_ms(0)));
        let err = engine
            .render("{% response 'req_1' '$.token' %}", &RenderContext::new())
            .await
            .unwrap_err();
        assert_eq!(
            extension_error(err),
            ExtensionError::Reference("req_1".to_string())
        );
    }

    #[tokio::test]
    async fn test_json_filter_applied() {
        let store = FakeStore::new();
        store
            .put_response(ResponseRecord::new(
                "req_1",
                200,
                "application/json",
                r#"{"data": {"token": "abc"}}"#,
            ))
            .await;
        let engine = TemplateEngine::new(store, Arc::new(FixedClock::at_epoch_ms(0)));

        let rendered = engine
            .render("{% response 'req_1' '$.data.token' %}", &RenderContext::new())
            .await
            .unwrap();
        assert_eq!(rendered, "abc");
    }

    #[tokio::test]
    async fn test_xml_filter_applied() {
        let store = FakeStore::new();
        store
            .put_response(ResponseRecord::new(
                "req_1",
                200,
                "text/xml",
                "<session><token>xyz</token></session>",
            ))
            .await;
        let engine = TemplateEngine::new(store, Arc::new(FixedClock::at_epoch_ms(0)));

        let rendered = engine
            .render("{% response 'req_1' '/session/token' %}", &RenderContext::new())
            .await
            .unwrap();
        assert_eq!(rendered, "xyz");
    }

    #[tokio::test]
    async fn test_bad_filter_is_a_filter_error() {
        let store = FakeStore::new();
        store
            .put_response(ResponseRecord::new(
                "req_1",
                200,
                "application/json",
                r#"{"token": "abc"}"#,
            ))
            .await;
        let engine = TemplateEngine::new(store, Arc::new(FixedClock::at_epoch_ms(0)));

        let err = engine
            .render("{% response 'req_1' '$.missing' %}", &RenderContext::new())
            .await
            .unwrap_err();
        assert!(matches!(extension_error(err), ExtensionError::Filter(_)));
    }

    #[tokio::test]
    async fn test_unfilterable_content_type() {
        let store = FakeStore::new();
        store
            .put_response(ResponseRecord::new("req_1", 200, "text/plain", "hello"))
            .await;
        let engine = TemplateEngine::new(store, Arc::new(FixedClock::at_epoch_ms(0)));

        let err = engine
            .render("{% response 'req_1' '$.a' %}", &RenderContext::new())
            .await
            .unwrap_err();
        assert!(matches!(extension_error(err), ExtensionError::Filter(_)));
    }
}
