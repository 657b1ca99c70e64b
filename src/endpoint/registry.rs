use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::FanoutError;

use super::traits::ModelEndpoint;

/// Maps model identifiers to the endpoints that serve them.
///
/// Handed to the dispatcher at construction time; nothing resolves
/// endpoints through ambient state.
#[derive(Default, Clone)]
pub struct EndpointRegistry {
    endpoints: HashMap<ModelId, Arc<dyn ModelEndpoint>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self {
            endpoints: HashMap::new(),
        }
    }

    pub fn builder() -> EndpointRegistryBuilder {
        EndpointRegistryBuilder::new()
    }

    /// Inserts an endpoint under a model id, e.g. "meta/llama3-8b-instruct".
    pub fn insert(&mut self, id: impl Into<String>, endpoint: Arc<dyn ModelEndpoint>) {
        if let Err(err) = self.try_insert(id, endpoint) {
            log::warn!("Invalid model id: {err}");
        }
    }

    /// Inserts an endpoint and returns an error for invalid ids.
    pub fn try_insert(
        &mut self,
        id: impl Into<String>,
        endpoint: Arc<dyn ModelEndpoint>,
    ) -> Result<(), FanoutError> {
        let id = ModelId::new(id)?;
        self.endpoints.insert(id, endpoint);
        Ok(())
    }

    /// Retrieves an endpoint by model id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn ModelEndpoint>> {
        self.endpoints.get(id).cloned()
    }

    /// Resolves `ids` in order, failing on the first unknown one.
    pub fn resolve(
        &self,
        ids: &[String],
    ) -> Result<Vec<(String, Arc<dyn ModelEndpoint>)>, FanoutError> {
        ids.iter()
            .map(|id| {
                self.get(id)
                    .map(|endpoint| (id.clone(), endpoint))
                    .ok_or_else(|| FanoutError::UnknownEndpoint(id.clone()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl fmt::Debug for EndpointRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.endpoints.keys().map(|id| id.0.as_str()).collect();
        ids.sort_unstable();
        f.debug_struct("EndpointRegistry")
            .field("models", &ids)
            .finish()
    }
}

/// Builder pattern for EndpointRegistry.
#[derive(Default)]
pub struct EndpointRegistryBuilder {
    registry: EndpointRegistry,
}

impl EndpointRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an endpoint under the given model id.
    pub fn register(mut self, id: impl Into<String>, endpoint: Arc<dyn ModelEndpoint>) -> Self {
        self.registry.insert(id, endpoint);
        self
    }

    /// Adds an endpoint with validation.
    pub fn try_register(
        mut self,
        id: impl Into<String>,
        endpoint: Arc<dyn ModelEndpoint>,
    ) -> Result<Self, FanoutError> {
        self.registry.try_insert(id, endpoint)?;
        Ok(self)
    }

    pub fn build(self) -> EndpointRegistry {
        self.registry
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Result<Self, FanoutError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(FanoutError::InvalidRequest(
                "Model id cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ModelId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
