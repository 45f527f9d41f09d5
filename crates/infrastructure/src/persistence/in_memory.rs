//! In-memory document store.
//!
//! Backs the rendering core during a session: documents live in maps
//! behind async locks, and each request keeps its response history in
//! arrival order so the latest entry wins.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use courier_application::ports::{DocumentStore, StoreError};
use courier_domain::{Environment, EnvironmentKind, Request, RequestGroup, ResponseRecord};

/// Thread-safe in-memory document store.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    requests: RwLock<HashMap<String, Request>>,
    groups: RwLock<HashMap<String, RequestGroup>>,
    environments: RwLock<HashMap<String, Environment>>,
    responses: RwLock<HashMap<String, Vec<ResponseRecord>>>,
}

impl InMemoryDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a request.
    pub async fn insert_request(&self, request: Request) {
        self.requests
            .write()
            .await
            .insert(request.id.clone(), request);
    }

    /// Inserts or replaces a request group.
    pub async fn insert_group(&self, group: RequestGroup) {
        self.groups.write().await.insert(group.id.clone(), group);
    }

    /// Inserts or replaces an environment.
    pub async fn insert_environment(&self, environment: Environment) {
        self.environments
            .write()
            .await
            .insert(environment.id.clone(), environment);
    }

    /// Appends a response to its request's history.
    pub async fn record_response(&self, response: ResponseRecord) {
        self.responses
            .write()
            .await
            .entry(response.request_id.clone())
            .or_default()
            .push(response);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn request_by_id(&self, id: &str) -> Result<Option<Request>, StoreError> {
        Ok(self.requests.read().await.get(id).cloned())
    }

    async fn request_group_by_id(&self, id: &str) -> Result<Option<RequestGroup>, StoreError> {
        Ok(self.groups.read().await.get(id).cloned())
    }

    async fn environment_by_id(&self, id: &str) -> Result<Option<Environment>, StoreError> {
        Ok(self.environments.read().await.get(id).cloned())
    }

    async fn root_environment(&self) -> Result<Option<Environment>, StoreError> {
        Ok(self
            .environments
            .read()
            .await
            .values()
            .find(|e| e.kind == EnvironmentKind::Root)
            .cloned())
    }

    async fn latest_response(
        &self,
        request_id: &str,
    ) -> Result<Option<ResponseRecord>, StoreError> {
        Ok(self
            .responses
            .read()
            .await
            .get(request_id)
            .and_then(|history| history.last())
            .cloned())
    }
}
