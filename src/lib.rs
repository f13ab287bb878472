//! API Mock - configurable HTTP mock server
//!
//! Serves mock endpoints under `/v1/mock/{name}` that answer with a
//! deterministic, configurable mix of successes and simulated failures, behind
//! an API key gate, with liveness/readiness probes and Prometheus metrics.

pub mod config;
pub mod credentials;
pub mod endpoints;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod routes;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

pub use crate::config::Config;
pub use crate::credentials::CredentialSet;
pub use crate::endpoints::{EndpointDefinition, EndpointRegistry, RatioSimulator};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub registry: EndpointRegistry,
    pub simulator: RatioSimulator,
    pub rate_limiter: DefaultDirectRateLimiter,
    pub start_time: Instant,
    ready: AtomicBool,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The state starts out not ready; call [`AppState::mark_ready`] once the
    /// server is accepting connections.
    pub fn new(config: Config) -> Result<Self> {
        let registry = EndpointRegistry::new(config.endpoints.clone())
            .context("Invalid mock endpoint configuration")?;
        let simulator = RatioSimulator::new(&registry);
        let rate_limiter = RateLimiter::direct(Quota::per_second(config.rate_limit));

        Ok(Self {
            config,
            registry,
            simulator,
            rate_limiter,
            start_time: Instant::now(),
            ready: AtomicBool::new(false),
        })
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn credentials(&self) -> &CredentialSet {
        &self.config.credentials
    }

    /// Log the effective configuration without exposing credentials
    pub fn log_configuration(&self) {
        let credentials = self.credentials();
        tracing::info!(
            auth_scheme = credentials.scheme().as_str(),
            enabled_credentials = credentials.enabled_count(),
            rate_limit = self.config.rate_limit.get(),
            debug_enabled = self.config.debug_enabled,
            endpoints = self.registry.len(),
            "Mock service configuration"
        );

        for (_, endpoint) in self.registry.iter() {
            let methods: Vec<&str> = endpoint.methods.iter().map(|m| m.as_str()).collect();
            tracing::info!(
                endpoint = %endpoint.name,
                methods = ?methods,
                cycle_length = endpoint.ratio.cycle_length(),
                failures_per_cycle = endpoint.ratio.failures(),
                success_ratio = endpoint.ratio.success_ratio(),
                success_status = endpoint.success.status.as_u16(),
                failure_status = endpoint.failure.status.as_u16(),
                delay_ms = endpoint.delay.as_millis() as u64,
                "Mock endpoint registered"
            );
        }

        if credentials.enabled_count() == 0 {
            tracing::warn!("No enabled credentials configured; every mock request will be rejected");
        }
        if self.registry.is_empty() {
            tracing::warn!("No mock endpoints configured; set SUB_ROUTES or ENDPOINTS_FILE");
        }
    }
}
