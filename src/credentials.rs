//! Accepted credentials
//!
//! The credential set is loaded once at startup and only read afterwards.
//! Lookups are pure: an absent, unknown or disabled credential is denied.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// How clients present their credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `X-API-KEY: <key>`
    ApiKey,
    /// `Authorization: Bearer <token>`
    BearerToken,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::ApiKey => "api_key",
            AuthScheme::BearerToken => "bearer_token",
        }
    }
}

/// Result of a credential lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Allow,
    Deny,
}

/// Accepted credentials, each with an enabled flag
#[derive(Debug, Clone)]
pub struct CredentialSet {
    scheme: AuthScheme,
    entries: HashMap<String, bool>,
}

impl CredentialSet {
    pub fn new(scheme: AuthScheme) -> Self {
        Self {
            scheme,
            entries: HashMap::new(),
        }
    }

    /// Build an API key set where every key is enabled
    pub fn api_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new(AuthScheme::ApiKey);
        for key in keys {
            set.insert(key, true);
        }
        set
    }

    /// Build a bearer token set with a single enabled token
    pub fn bearer_token(token: impl Into<String>) -> Self {
        let mut set = Self::new(AuthScheme::BearerToken);
        set.insert(token, true);
        set
    }

    /// Add or replace a credential. A disabled entry shadows an enabled one.
    pub fn insert(&mut self, credential: impl Into<String>, enabled: bool) {
        let credential = credential.into();
        if credential.is_empty() {
            return;
        }
        let entry = self.entries.entry(credential).or_insert(enabled);
        *entry = *entry && enabled;
    }

    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of enabled credentials
    pub fn enabled_count(&self) -> usize {
        self.entries.values().filter(|enabled| **enabled).count()
    }

    /// Check a presented credential
    pub fn authenticate(&self, presented: Option<&str>) -> AuthDecision {
        match presented.and_then(|value| self.entries.get(value)) {
            Some(true) => AuthDecision::Allow,
            _ => AuthDecision::Deny,
        }
    }
}

/// Extract the token from an `Authorization: Bearer` header value
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Short fingerprint of a credential, safe to log
pub fn fingerprint(credential: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(credential.as_bytes());
    hex::encode(hasher.finalize())[..12].to_string()
}
