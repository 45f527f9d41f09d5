//! The template renderer
//!
//! [`TemplateEngine`] is built once per session with the tag registry
//! and the injected store/clock. Every public render call opens a
//! fresh [`RenderPass`] carrying the per-render state: the
//! response-lookup cache (one store read per distinct target request
//! per render) and the in-progress set guarding against a request
//! property that references itself. Nothing survives across passes.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use courier_domain::{RenderContext, Request, ResponseRecord};

use super::error::{ExtensionError, RenderError, RenderResult};
use super::parser::{TagArg, TagCall, Token, parse_template};
use super::tags::{TagRegistry, check_arity};
use super::value_to_string;
use crate::ports::{Clock, DocumentStore};

/// The rendering engine.
pub struct TemplateEngine {
    registry: TagRegistry,
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl TemplateEngine {
    /// Creates an engine with the built-in tag set.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_registry(store, clock, TagRegistry::with_defaults())
    }

    /// Creates an engine with an explicit registry (tests, plugins).
    #[must_use]
    pub fn with_registry(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        registry: TagRegistry,
    ) -> Self {
        Self {
            registry,
            store,
            clock,
        }
    }

    /// The tag registry.
    #[must_use]
    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    /// Mutable access for registering externally supplied tags.
    pub fn registry_mut(&mut self) -> &mut TagRegistry {
        &mut self.registry
    }

    /// Renders a single template string.
    ///
    /// Unresolvable variable references substitute to the empty
    /// string; tag failures and syntax errors abort the call.
    ///
    /// # Errors
    ///
    /// [`RenderError::TemplateSyntax`] for malformed expressions,
    /// [`RenderError::Extension`] for tag evaluator failures.
    pub async fn render(&self, template: &str, context: &RenderContext) -> RenderResult<String> {
        let mut pass = RenderPass::new(self, context, None);
        pass.render(template).await
    }

    /// Deep-renders an arbitrary composite value.
    ///
    /// String leaves go through [`Self::render`]; everything else is
    /// copied by value. The input is never mutated and the output
    /// shares no structure with it.
    ///
    /// # Errors
    ///
    /// Fails fast with the first leaf error, same taxonomy as
    /// [`Self::render`].
    pub async fn render_value(&self, value: &Value, context: &RenderContext) -> RenderResult<Value> {
        let mut pass = RenderPass::new(self, context, None);
        pass.render_value(value).await
    }

    /// Renders a request definition into a fully resolved copy.
    ///
    /// Name, URL, header names and values, and the body are rendered;
    /// ids and the method pass through. The request itself becomes the
    /// target of any `{% request ... %}` tags it contains.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`Self::render`].
    pub async fn render_request(
        &self,
        request: &Request,
        context: &RenderContext,
    ) -> RenderResult<Request> {
        debug!(request = %request.id, "rendering request");
        let mut pass = RenderPass::new(self, context, Some(request.clone()));

        let mut rendered = request.clone();
        rendered.name = pass.render(&request.name).await?;
        rendered.url = pass.render(&request.url).await?;
        for (index, header) in request.headers.iter().enumerate() {
            rendered.headers[index].name = pass.render(&header.name).await?;
            rendered.headers[index].value = pass.render(&header.value).await?;
        }
        rendered.body = match &request.body {
            Some(body) => Some(pass.render(body).await?),
            None => None,
        };

        Ok(rendered)
    }
}

/// Per-render state and traversal. Created by the engine for each
/// public render call; tags receive it during evaluation.
pub struct RenderPass<'e> {
    engine: &'e TemplateEngine,
    context: &'e RenderContext,
    request: Option<Request>,
    response_cache: HashMap<String, ResponseRecord>,
    in_progress: HashSet<String>,
}

impl<'e> RenderPass<'e> {
    fn new(engine: &'e TemplateEngine, context: &'e RenderContext, request: Option<Request>) -> Self {
        Self {
            engine,
            context,
            request,
            response_cache: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// The flattened render context for this pass.
    #[must_use]
    pub fn context(&self) -> &RenderContext {
        self.context
    }

    /// The injected clock.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.engine.clock.as_ref()
    }

    /// The request currently being rendered, if any.
    #[must_use]
    pub fn current_request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    /// Renders one template string within this pass.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`TemplateEngine::render`].
    pub async fn render(&mut self, template: &str) -> RenderResult<String> {
        let tokens = parse_template(template)?;
        let mut output = String::with_capacity(template.len());

        for token in &tokens {
            match token {
                Token::Text(text) => output.push_str(text),
                Token::Variable { path, .. } => {
                    // Unresolved references render empty so templates
                    // stay usable while still being edited.
                    if let Some(value) = self.context.lookup(path) {
                        output.push_str(&value_to_string(value));
                    }
                }
                Token::Tag(call) => {
                    let value = self.evaluate_tag(call).await?;
                    output.push_str(&value_to_string(&value));
                }
            }
        }

        Ok(output)
    }

    /// Deep-renders a composite value: strings through [`Self::render`],
    /// arrays element-wise in index order, objects per value in
    /// insertion order with keys untouched, scalars copied as-is.
    pub fn render_value<'a>(
        &'a mut self,
        value: &'a Value,
    ) -> Pin<Box<dyn Future<Output = RenderResult<Value>> + Send + 'a>> {
        Box::pin(async move {
            match value {
                Value::String(text) => Ok(Value::String(self.render(text).await?)),
                Value::Array(items) => {
                    let mut rendered = Vec::with_capacity(items.len());
                    for item in items {
                        rendered.push(self.render_value(item).await?);
                    }
                    Ok(Value::Array(rendered))
                }
                Value::Object(map) => {
                    let mut rendered = Map::new();
                    for (key, item) in map {
                        rendered.insert(key.clone(), self.render_value(item).await?);
                    }
                    Ok(Value::Object(rendered))
                }
                scalar => Ok(scalar.clone()),
            }
        })
    }

    /// Reads the most recent stored response for a request, at most
    /// once per distinct target within this pass.
    ///
    /// # Errors
    ///
    /// [`ExtensionError::Reference`] when the request has no stored
    /// response, [`ExtensionError::Store`] when the backend fails.
    pub async fn lookup_response(
        &mut self,
        request_id: &str,
    ) -> Result<ResponseRecord, ExtensionError> {
        if let Some(cached) = self.response_cache.get(request_id) {
            trace!(request = %request_id, "response lookup served from pass cache");
            return Ok(cached.clone());
        }

        let record = self
            .engine
            .store
            .latest_response(request_id)
            .await
            .map_err(|e| ExtensionError::Store(e.to_string()))?
            .ok_or_else(|| ExtensionError::Reference(request_id.to_string()))?;

        self.response_cache
            .insert(request_id.to_string(), record.clone());
        Ok(record)
    }

    /// Renders a property of the request currently being rendered,
    /// guarding against self-reference.
    ///
    /// # Errors
    ///
    /// [`ExtensionError::CyclicReference`] when the property is already
    /// being rendered higher up the same pass.
    pub async fn render_request_property(
        &mut self,
        property: &str,
        header: Option<&str>,
    ) -> Result<Value, ExtensionError> {
        let Some(request) = &self.request else {
            return Err(ExtensionError::InvalidArgument(
                "no request is being rendered".to_string(),
            ));
        };

        let key = match header {
            Some(name) => format!("{}.{property}.{}", request.id, name.to_ascii_lowercase()),
            None => format!("{}.{property}", request.id),
        };

        let raw = match property {
            "url" => request.url.clone(),
            "name" => request.name.clone(),
            "header" => {
                let Some(name) = header else {
                    return Err(ExtensionError::InvalidArgument(
                        "`request 'header'` needs a header name".to_string(),
                    ));
                };
                request.header(name).unwrap_or_default().to_string()
            }
            other => {
                return Err(ExtensionError::InvalidArgument(format!(
                    "unknown request property `{other}`"
                )));
            }
        };

        if !self.in_progress.insert(key.clone()) {
            return Err(ExtensionError::CyclicReference(key));
        }
        let result = self.render(&raw).await;
        self.in_progress.remove(&key);

        match result {
            Ok(rendered) => Ok(Value::String(rendered)),
            Err(RenderError::Extension { source, .. }) => Err(source),
            Err(err) => Err(ExtensionError::Nested(Box::new(err))),
        }
    }

    async fn evaluate_tag(&mut self, call: &TagCall) -> RenderResult<Value> {
        let Some(tag) = self.engine.registry.get(&call.name) else {
            return Err(RenderError::Extension {
                expression: call.raw.clone(),
                source: ExtensionError::UnknownExtension(call.name.clone()),
            });
        };

        let args: Vec<Value> = call.args.iter().map(|arg| self.resolve_arg(arg)).collect();
        check_arity(tag.as_ref(), &args).map_err(|source| RenderError::Extension {
            expression: call.raw.clone(),
            source,
        })?;

        trace!(tag = %call.name, "evaluating template tag");
        tag.evaluate(&args, self)
            .await
            .map_err(|source| match source {
                ExtensionError::Nested(inner) => *inner,
                source => RenderError::Extension {
                    expression: call.raw.clone(),
                    source,
                },
            })
    }

    fn resolve_arg(&self, arg: &TagArg) -> Value {
        match arg {
            TagArg::Str(text) => Value::String(text.clone()),
            TagArg::Int(int) => Value::from(*int),
            TagArg::Float(float) => Value::from(*float),
            TagArg::Bool(flag) => Value::Bool(*flag),
            TagArg::Ident(path) => self.context.lookup(path).cloned().unwrap_or(Value::Null),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use courier_domain::{Environment, Request, ResponseRecord, build_render_context};

    use super::*;
    use crate::templating::test_support::{FakeStore, FixedClock};

    fn engine_with(store: Arc<FakeStore>) -> TemplateEngine {
        TemplateEngine::new(store, Arc::new(FixedClock::at_epoch_ms(1_500_000_000_000)))
    }

    fn context_of(data: serde_json::Value) -> RenderContext {
        let env = Environment::root("test").with_data(data.as_object().unwrap().clone());
        build_render_context(None, Some(&env), None)
    }

    #[tokio::test]
    async fn test_renders_hello_world() {
        let engine = engine_with(FakeStore::new());
        let context = context_of(json!({"msg": "World"}));

        let rendered = engine.render("Hello {{ msg }}!", &context).await.unwrap();
        assert_eq!(rendered, "Hello World!");
    }

    #[tokio::test]
    async fn test_unresolved_variable_renders_empty() {
        let engine = engine_with(FakeStore::new());
        let context = context_of(json!({}));

        let rendered = engine.render("[{{ missing }}]", &context).await.unwrap();
        assert_eq!(rendered, "[]");
    }

    #[tokio::test]
    async fn test_fails_on_invalid_template() {
        let engine = engine_with(FakeStore::new());
        let context = context_of(json!({"msg": "World"}));

        let err = engine.render("Hello {{ msg }!", &context).await.unwrap_err();
        assert!(err.to_string().contains("expected variable end"));
    }

    #[tokio::test]
    async fn test_non_string_context_values_substitute() {
        let engine = engine_with(FakeStore::new());
        let context = context_of(json!({"port": 8080, "debug": true}));

        let rendered = engine
            .render("{{ host }}:{{ port }}?debug={{ debug }}", &context)
            .await
            .unwrap();
        assert_eq!(rendered, ":8080?debug=true");
    }

    #[tokio::test]
    async fn test_recursive_render_simple_object() {
        let engine = engine_with(FakeStore::new());
        let context = context_of(json!({"foo": "bar"}));

        let input = json!({"foo": "{{ foo }}", "bar": "bar", "baz": "{{ bad }}"});
        let rendered = engine.render_value(&input, &context).await.unwrap();

        assert_eq!(rendered, json!({"foo": "bar", "bar": "bar", "baz": ""}));
    }

    #[tokio::test]
    async fn test_recursive_render_complex_object() {
        let engine = engine_with(FakeStore::new());
        let context = context_of(json!({"foo": "bar"}));

        let input = json!({
            "foo": "{{ foo }}",
            "null": null,
            "bool": true,
            "num": 1234,
            "nested": {
                "foo": "{{ foo }}",
                "arr": [1, 2, "{{ foo }}"]
            }
        });
        let rendered = engine.render_value(&input, &context).await.unwrap();

        assert_eq!(
            rendered,
            json!({
                "foo": "bar",
                "null": null,
                "bool": true,
                "num": 1234,
                "nested": {
                    "foo": "bar",
                    "arr": [1, 2, "bar"]
                }
            })
        );
        // Input untouched
        assert_eq!(input["foo"], "{{ foo }}");
        assert_eq!(input["nested"]["arr"][2], "{{ foo }}");
    }

    #[tokio::test]
    async fn test_recursive_render_without_expressions_is_identity() {
        let engine = engine_with(FakeStore::new());
        let context = context_of(json!({}));

        let input = json!({"a": [1, 2, 3], "b": {"c": "plain"}, "d": null});
        let rendered = engine.render_value(&input, &context).await.unwrap();
        assert_eq!(rendered, input);
    }

    #[tokio::test]
    async fn test_recursive_render_fails_fast_on_bad_leaf() {
        let engine = engine_with(FakeStore::new());
        let context = context_of(json!({"foo": "bar"}));

        let input = json!({"foo": "{{ foo }", "bar": "bar"});
        let err = engine.render_value(&input, &context).await.unwrap_err();
        assert!(err.to_string().contains("expected variable end"));
    }

    #[tokio::test]
    async fn test_unknown_tag_fails() {
        let engine = engine_with(FakeStore::new());
        let context = context_of(json!({}));

        let err = engine.render("{% nope %}", &context).await.unwrap_err();
        match err {
            RenderError::Extension { source, .. } => {
                assert_eq!(source, ExtensionError::UnknownExtension("nope".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_uuid_tag_is_fresh_per_evaluation() {
        let engine = engine_with(FakeStore::new());
        let context = context_of(json!({}));

        let rendered = engine
            .render("{% uuid %} {% uuid %}", &context)
            .await
            .unwrap();
        let parts: Vec<&str> = rendered.split(' ').collect();
        assert_eq!(parts.len(), 2);
        assert_ne!(parts[0], parts[1]);
        assert!(uuid::Uuid::parse_str(parts[0]).is_ok());
    }

    #[tokio::test]
    async fn test_timestamp_tag_reads_injected_clock() {
        let engine = engine_with(FakeStore::new());
        let context = context_of(json!({}));

        let rendered = engine.render("{% timestamp %}", &context).await.unwrap();
        assert_eq!(rendered, "1500000000000");
    }

    #[tokio::test]
    async fn test_response_lookup_cached_within_one_pass() {
        let store = FakeStore::new();
        store
            .put_response(ResponseRecord::new(
                "req_1",
                200,
                "application/json",
                r#"{"token": "abc", "user": "ada"}"#,
            ))
            .await;
        let engine = engine_with(Arc::clone(&store));
        let context = context_of(json!({}));

        let template = "{% response 'req_1' '$.token' %}-{% response 'req_1' '$.user' %}";
        let rendered = engine.render(template, &context).await.unwrap();

        assert_eq!(rendered, "abc-ada");
        assert_eq!(store.response_reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_response_cache_does_not_leak_across_renders() {
        let store = FakeStore::new();
        store
            .put_response(ResponseRecord::new(
                "req_1",
                200,
                "application/json",
                r#"{"token": "abc"}"#,
            ))
            .await;
        let engine = engine_with(Arc::clone(&store));
        let context = context_of(json!({}));

        let template = "{% response 'req_1' '$.token' %}";
        engine.render(template, &context).await.unwrap();
        engine.render(template, &context).await.unwrap();

        assert_eq!(store.response_reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_tag_argument_resolved_from_context() {
        let store = FakeStore::new();
        store
            .put_response(ResponseRecord::new(
                "req_9",
                200,
                "application/json",
                r#"{"id": 7}"#,
            ))
            .await;
        let engine = engine_with(store);
        let context = context_of(json!({"login_request": "req_9"}));

        let rendered = engine
            .render("{% response login_request '$.id' %}", &context)
            .await
            .unwrap();
        assert_eq!(rendered, "7");
    }

    #[tokio::test]
    async fn test_render_request_renders_all_string_fields() {
        let engine = engine_with(FakeStore::new());
        let context = context_of(json!({"host": "example.com", "token": "t0k"}));

        let mut request = Request::new("{{ host }} request", "POST", "https://{{ host }}/login");
        request.add_header("Authorization", "Bearer {{ token }}");
        request.body = Some(r#"{"host": "{{ host }}"}"#.to_string());

        let rendered = engine.render_request(&request, &context).await.unwrap();
        assert_eq!(rendered.name, "example.com request");
        assert_eq!(rendered.url, "https://example.com/login");
        assert_eq!(rendered.headers[0].value, "Bearer t0k");
        assert_eq!(rendered.body.as_deref(), Some(r#"{"host": "example.com"}"#));
        assert_eq!(rendered.method, "POST");
        assert_eq!(rendered.id, request.id);
        // Original untouched
        assert_eq!(request.url, "https://{{ host }}/login");
    }

    #[tokio::test]
    async fn test_request_tag_reads_own_header() {
        let engine = engine_with(FakeStore::new());
        let context = context_of(json!({"token": "t0k"}));

        let mut request = Request::new("login", "POST", "https://example.com");
        request.add_header("Authorization", "Bearer {{ token }}");
        request.body = Some("auth={% request 'header' 'Authorization' %}".to_string());

        let rendered = engine.render_request(&request, &context).await.unwrap();
        assert_eq!(rendered.body.as_deref(), Some("auth=Bearer t0k"));
    }

    #[tokio::test]
    async fn test_request_tag_detects_cycle() {
        let engine = engine_with(FakeStore::new());
        let context = context_of(json!({}));

        let mut request = Request::new("loop", "GET", "https://example.com");
        request.add_header("X-Self", "{% request 'header' 'X-Self' %}");

        let err = engine.render_request(&request, &context).await.unwrap_err();
        match err {
            RenderError::Extension { source, .. } => {
                assert!(matches!(source, ExtensionError::CyclicReference(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
