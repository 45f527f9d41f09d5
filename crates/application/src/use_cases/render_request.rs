//! Render-request use case
//!
//! Assembles the scope cascade for a stored request and drives the
//! template engine over it. The cascade is rebuilt from the store on
//! every call so edits made between renders always take effect.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use courier_domain::{
    AncestorChain, DomainError, EnvironmentKind, RenderContext, Request, build_render_context,
};

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::DocumentStore;
use crate::templating::TemplateEngine;

/// Builds the flattened render context for one request.
///
/// Walks the request's group chain upward, then merges inline group
/// data (most distant first), the workspace root environment, and the
/// active sub-environment, in that order of increasing precedence.
/// A group whose parent is missing ends the walk; a revisited group id
/// ends it too, so a corrupted chain cannot loop.
///
/// # Errors
///
/// [`ApplicationError::NotFound`] when `active_sub_environment` names a
/// missing environment, [`ApplicationError::Domain`] when it names one
/// that is not a sub-environment, [`ApplicationError::Store`] on
/// backend failures.
pub async fn build_context_for_request(
    store: &dyn DocumentStore,
    request: &Request,
    active_sub_environment: Option<&str>,
) -> ApplicationResult<RenderContext> {
    let mut ancestors = AncestorChain::new();
    let mut seen = HashSet::new();
    let mut next = request.parent_id.clone();

    while let Some(group_id) = next {
        if !seen.insert(group_id.clone()) {
            break;
        }
        let Some(group) = store.request_group_by_id(&group_id).await? else {
            break;
        };
        next = group.parent_id.clone();
        ancestors.push(group);
    }
    // Collected near to far; the cascade wants the most distant first.
    ancestors.reverse();

    let root = store.root_environment().await?;

    let sub = match active_sub_environment {
        Some(id) => {
            let environment = store
                .environment_by_id(id)
                .await?
                .ok_or_else(|| ApplicationError::NotFound(format!("environment {id}")))?;
            if environment.kind != EnvironmentKind::Sub {
                return Err(DomainError::InvalidEnvironmentParent(id.to_string()).into());
            }
            Some(environment)
        }
        None => None,
    };

    Ok(build_render_context(
        Some(&ancestors),
        root.as_ref(),
        sub.as_ref(),
    ))
}

/// Renders stored requests against their surrounding scopes.
pub struct RenderRequestUseCase {
    store: Arc<dyn DocumentStore>,
    engine: Arc<TemplateEngine>,
}

impl RenderRequestUseCase {
    /// Creates the use case over the given store and engine.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, engine: Arc<TemplateEngine>) -> Self {
        Self { store, engine }
    }

    /// Loads a request, builds its cascade, and renders every
    /// templated field.
    ///
    /// # Errors
    ///
    /// [`ApplicationError::NotFound`] when the request does not exist,
    /// plus everything [`build_context_for_request`] and the engine
    /// can fail with.
    pub async fn execute(
        &self,
        request_id: &str,
        active_sub_environment: Option<&str>,
    ) -> ApplicationResult<Request> {
        let request = self
            .store
            .request_by_id(request_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("request {request_id}")))?;

        debug!(request = %request.id, "rendering stored request");
        let context =
            build_context_for_request(self.store.as_ref(), &request, active_sub_environment)
                .await?;

        Ok(self.engine.render_request(&request, &context).await?)
    }

    /// Deep-renders an arbitrary value in a request's cascade, for
    /// callers exporting or previewing templated structures.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`Self::execute`].
    pub async fn render_export_value(
        &self,
        request_id: &str,
        value: &Value,
        active_sub_environment: Option<&str>,
    ) -> ApplicationResult<Value> {
        let request = self
            .store
            .request_by_id(request_id)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("request {request_id}")))?;

        let context =
            build_context_for_request(self.store.as_ref(), &request, active_sub_environment)
                .await?;

        Ok(self.engine.render_value(value, &context).await?)
    }
}
