//! Endpoint registry
//!
//! Built once at startup and never mutated, so lookups need no locking.

use std::collections::HashMap;

use axum::http::Method;
use thiserror::Error;

use super::{is_valid_name, EndpointDefinition};

/// Name reserved for the batch route
pub const BATCH_ROUTE_NAME: &str = "batch";

/// Stable identity of a registered endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointId(usize);

impl EndpointId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Why a (method, name) pair did not resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    NotFound,
    MethodNotAllowed,
}

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("duplicate mock endpoint: {0}")]
    Duplicate(String),

    #[error("invalid mock endpoint name: {0:?}")]
    InvalidName(String),

    #[error("mock endpoint name {0:?} is reserved")]
    Reserved(String),

    #[error("mock endpoint {0} accepts no methods")]
    NoMethods(String),
}

/// Immutable set of mock endpoints
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    endpoints: Vec<EndpointDefinition>,
    by_name: HashMap<String, EndpointId>,
}

impl EndpointRegistry {
    pub fn new(endpoints: Vec<EndpointDefinition>) -> Result<Self, RegistryError> {
        let mut by_name = HashMap::with_capacity(endpoints.len());

        for (index, endpoint) in endpoints.iter().enumerate() {
            if !is_valid_name(&endpoint.name) {
                return Err(RegistryError::InvalidName(endpoint.name.clone()));
            }
            if endpoint.name == BATCH_ROUTE_NAME {
                return Err(RegistryError::Reserved(endpoint.name.clone()));
            }
            if endpoint.methods.is_empty() {
                return Err(RegistryError::NoMethods(endpoint.name.clone()));
            }
            if by_name
                .insert(endpoint.name.clone(), EndpointId(index))
                .is_some()
            {
                return Err(RegistryError::Duplicate(endpoint.name.clone()));
            }
        }

        Ok(Self { endpoints, by_name })
    }

    /// Resolve a request to a mock endpoint
    pub fn resolve(
        &self,
        method: &Method,
        name: &str,
    ) -> Result<(EndpointId, &EndpointDefinition), RouteError> {
        let id = self.id_of(name).ok_or(RouteError::NotFound)?;
        let endpoint = &self.endpoints[id.0];

        if endpoint.accepts(method) {
            Ok((id, endpoint))
        } else {
            Err(RouteError::MethodNotAllowed)
        }
    }

    pub fn id_of(&self, name: &str) -> Option<EndpointId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: EndpointId) -> Option<&EndpointDefinition> {
        self.endpoints.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EndpointId, &EndpointDefinition)> {
        self.endpoints
            .iter()
            .enumerate()
            .map(|(index, endpoint)| (EndpointId(index), endpoint))
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Union of the methods accepted by any endpoint
    pub fn methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for method in self.endpoints.iter().flat_map(|e| e.methods.iter()) {
            if !methods.contains(method) {
                methods.push(method.clone());
            }
        }
        methods
    }
}
