//! Configuration management for the mock service
//!
//! Configuration is loaded once from environment variables (optionally seeded
//! from a `.env` file) and, for per-endpoint overrides, from the TOML file
//! named by `ENDPOINTS_FILE`. Any invalid value is fatal at startup.

use std::env;
use std::fs;
use std::num::NonZeroU32;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use axum::http::{Method, StatusCode};
use nonzero_ext::nonzero;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::credentials::{AuthScheme, CredentialSet};
use crate::endpoints::{
    normalize_name, EndpointDefinition, FailureBody, FailureProfile, Ratio, SuccessProfile,
    SUPPORTED_METHODS,
};
use crate::error::codes;

/// Longest response delay an endpoint may be configured with
pub const MAX_RESPONSE_DELAY: Duration = Duration::from_secs(30);

const DEFAULT_RATE_LIMIT: NonZeroU32 = nonzero!(1000u32);

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow!("unknown log format {other:?}")),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Accepted credentials
    pub credentials: CredentialSet,
    /// Mock endpoints served under `/v1/mock/{name}`
    pub endpoints: Vec<EndpointDefinition>,

    /// Requests per second accepted on the mock surface
    pub rate_limit: NonZeroU32,
    /// Body returned with 429 responses
    pub rate_exceeded_body: Value,

    /// Enable `/debug/counters`
    pub debug_enabled: bool,
    /// Log output format
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match var("PORT") {
            Some(port) => port.trim().parse().context("Invalid PORT")?,
            None => 8080,
        };

        let credentials = load_credentials(&var)?;
        let defaults = EndpointDefaults::load(&var)?;

        let mut endpoints: Vec<EndpointDefinition> = var("SUB_ROUTES")
            .map(|routes| {
                routes
                    .split(',')
                    .map(normalize_name)
                    .filter(|name| !name.is_empty())
                    .map(|name| defaults.endpoint(name))
                    .collect()
            })
            .unwrap_or_default();

        if let Some(path) = var("ENDPOINTS_FILE") {
            for endpoint in load_endpoints_file(Path::new(&path), &defaults)? {
                if endpoints.iter().any(|e| e.name == endpoint.name) {
                    bail!(
                        "mock endpoint {} is defined in both SUB_ROUTES and {}",
                        endpoint.name,
                        path
                    );
                }
                endpoints.push(endpoint);
            }
        }

        let rate_limit = match var("RATE_LIMIT") {
            Some(limit) => {
                let limit: u32 = limit.trim().parse().context("Invalid RATE_LIMIT")?;
                NonZeroU32::new(limit).context("RATE_LIMIT must be greater than 0")?
            }
            None => DEFAULT_RATE_LIMIT,
        };

        let rate_exceeded_body = parse_json(&var, "RATE_EXCEEDED_RESP_BODY")?.unwrap_or_else(|| {
            json!({
                "error": {
                    "code": codes::RATE_LIMIT_EXCEEDED,
                    "message": "rate limit exceeded"
                }
            })
        });

        let log_format = match var("LOG_FORMAT") {
            Some(format) => format.parse().context("Invalid LOG_FORMAT")?,
            None => LogFormat::Text,
        };

        Ok(Self {
            host: var("MOCK_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            credentials,
            endpoints,
            rate_limit,
            rate_exceeded_body,
            debug_enabled: var("MOCK_DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            log_format,
        })
    }
}

fn load_credentials(var: &impl Fn(&str) -> Option<String>) -> Result<CredentialSet> {
    let keys: Vec<String> = ["API_KEY", "API_KEYS"]
        .into_iter()
        .filter_map(|key| var(key))
        .flat_map(|value| split_list(&value))
        .collect();
    let disabled = var("DISABLED_API_KEYS")
        .map(|value| split_list(&value))
        .unwrap_or_default();
    let token = var("API_TOKEN");

    match token {
        Some(_) if !keys.is_empty() => {
            bail!("only one of API_KEY/API_KEYS or API_TOKEN can be set")
        }
        Some(_) if !disabled.is_empty() => {
            bail!("DISABLED_API_KEYS cannot be combined with API_TOKEN")
        }
        Some(token) => Ok(CredentialSet::bearer_token(token.trim())),
        None => {
            let mut credentials = CredentialSet::new(AuthScheme::ApiKey);
            for key in keys {
                credentials.insert(key, true);
            }
            for key in disabled {
                credentials.insert(key, false);
            }
            Ok(credentials)
        }
    }
}

/// Values every endpoint starts from
#[derive(Debug, Clone)]
struct EndpointDefaults {
    methods: Vec<Method>,
    ratio: Ratio,
    success: SuccessProfile,
    failure_status: StatusCode,
    failure_code: u32,
    failure_message: String,
    failure_body: Option<Value>,
    delay: Duration,
}

impl EndpointDefaults {
    fn load(var: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let methods = match var("METHODS") {
            Some(methods) => parse_methods(split_list(&methods))?,
            None => vec![Method::GET, Method::POST],
        };

        let ratio = match var("SUCCESS_RATIO") {
            Some(ratio) => {
                let ratio: f64 = ratio.trim().parse().context("Invalid SUCCESS_RATIO")?;
                Ratio::from_success_ratio(ratio).context("Invalid SUCCESS_RATIO")?
            }
            None => Ratio::ALWAYS_SUCCEED,
        };

        let success = SuccessProfile {
            status: match var("SUCCESS_RESP_CODE") {
                Some(code) => parse_status("SUCCESS_RESP_CODE", &code)?,
                None => StatusCode::OK,
            },
            body: parse_json(var, "SUCCESS_RESP_BODY")?
                .unwrap_or_else(|| SuccessProfile::default().body),
        };

        let failure_status = match var("FAILURE_RESP_CODE") {
            Some(code) => parse_status("FAILURE_RESP_CODE", &code)?,
            None => StatusCode::BAD_REQUEST,
        };

        let failure_code = match var("FAILURE_ERROR_CODE") {
            Some(code) => code.trim().parse().context("Invalid FAILURE_ERROR_CODE")?,
            None => codes::FAILED_REQUEST,
        };

        let delay = match var("RESP_DELAY") {
            Some(delay) => parse_delay(delay.trim().parse().context("Invalid RESP_DELAY")?)?,
            None => Duration::ZERO,
        };

        Ok(Self {
            methods,
            ratio,
            success,
            failure_status,
            failure_code,
            failure_message: var("FAILURE_ERROR_MESSAGE")
                .unwrap_or_else(|| "failed request".to_string()),
            failure_body: parse_json(var, "FAILURE_RESP_BODY")?,
            delay,
        })
    }

    fn failure_profile(&self) -> FailureProfile {
        let body = match &self.failure_body {
            Some(body) => FailureBody::Custom(body.clone()),
            None => FailureBody::Structured {
                code: self.failure_code,
                message: self.failure_message.clone(),
            },
        };

        FailureProfile {
            status: self.failure_status,
            body,
        }
    }

    fn endpoint(&self, name: &str) -> EndpointDefinition {
        EndpointDefinition::new(name)
            .with_methods(self.methods.iter().cloned())
            .with_ratio(self.ratio)
            .with_success(self.success.clone())
            .with_failure(self.failure_profile())
            .with_delay(self.delay)
    }

    fn apply(&self, entry: EndpointEntry) -> Result<EndpointDefinition> {
        let name = normalize_name(&entry.name).to_string();
        let context = || format!("Invalid settings for mock endpoint {name}");
        let mut endpoint = self.endpoint(&name);

        if let Some(methods) = entry.methods {
            endpoint = endpoint.with_methods(parse_methods(methods).with_context(context)?);
        }

        endpoint.ratio = match (entry.success_ratio, entry.cycle_length, entry.failures_per_cycle) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(anyhow!(
                    "success_ratio cannot be combined with cycle_length/failures_per_cycle"
                )
                .context(context()));
            }
            (Some(ratio), None, None) => Ratio::from_success_ratio(ratio).with_context(context)?,
            (None, Some(cycle), failures) => {
                Ratio::new(cycle, failures.unwrap_or(1)).with_context(context)?
            }
            (None, None, Some(_)) => {
                return Err(anyhow!("failures_per_cycle requires cycle_length").context(context()));
            }
            (None, None, None) => endpoint.ratio,
        };

        if let Some(status) = entry.success_status {
            endpoint.success.status = status_from_u16(status).with_context(context)?;
        }
        if let Some(body) = entry.success_body {
            endpoint.success.body = body;
        }

        if let Some(status) = entry.failure_status {
            endpoint.failure.status = status_from_u16(status).with_context(context)?;
        }
        if let Some(body) = entry.failure_body {
            endpoint.failure.body = FailureBody::Custom(body);
        } else if entry.failure_code.is_some() || entry.failure_message.is_some() {
            endpoint.failure.body = FailureBody::Structured {
                code: entry.failure_code.unwrap_or(self.failure_code),
                message: entry
                    .failure_message
                    .unwrap_or_else(|| self.failure_message.clone()),
            };
        }

        if let Some(delay_ms) = entry.delay_ms {
            endpoint.delay = parse_delay(delay_ms).with_context(context)?;
        }

        Ok(endpoint)
    }
}

/// Layout of the `ENDPOINTS_FILE` document
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EndpointsFile {
    #[serde(default, rename = "endpoint")]
    endpoints: Vec<EndpointEntry>,
}

/// One `[[endpoint]]` table; unset fields fall back to the environment defaults
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EndpointEntry {
    name: String,
    methods: Option<Vec<String>>,
    success_ratio: Option<f64>,
    cycle_length: Option<u32>,
    failures_per_cycle: Option<u32>,
    success_status: Option<u16>,
    success_body: Option<Value>,
    failure_status: Option<u16>,
    failure_code: Option<u32>,
    failure_message: Option<String>,
    failure_body: Option<Value>,
    delay_ms: Option<u64>,
}

fn load_endpoints_file(path: &Path, defaults: &EndpointDefaults) -> Result<Vec<EndpointDefinition>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ENDPOINTS_FILE {}", path.display()))?;
    parse_endpoints(&raw, defaults)
        .with_context(|| format!("Invalid ENDPOINTS_FILE {}", path.display()))
}

fn parse_endpoints(raw: &str, defaults: &EndpointDefaults) -> Result<Vec<EndpointDefinition>> {
    let file: EndpointsFile = toml::from_str(raw)?;
    file.endpoints
        .into_iter()
        .map(|entry| defaults.apply(entry))
        .collect()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_methods<I, S>(methods: I) -> Result<Vec<Method>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = Vec::new();
    for method in methods {
        let name = method.as_ref().trim().to_ascii_uppercase();
        let method = SUPPORTED_METHODS
            .iter()
            .find(|supported| supported.as_str() == name)
            .ok_or_else(|| anyhow!("method {name} is not allowed"))?;
        if !parsed.contains(method) {
            parsed.push(method.clone());
        }
    }
    if parsed.is_empty() {
        bail!("at least one method is required");
    }
    Ok(parsed)
}

fn parse_status(key: &str, value: &str) -> Result<StatusCode> {
    let code: u16 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {key}"))?;
    status_from_u16(code).with_context(|| format!("Invalid {key}"))
}

fn status_from_u16(code: u16) -> Result<StatusCode> {
    if !(100..=599).contains(&code) {
        bail!("status code {code} is out of range");
    }
    Ok(StatusCode::from_u16(code)?)
}

fn parse_json(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<Value>> {
    var(key)
        .map(|raw| serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {key}")))
        .transpose()
}

fn parse_delay(millis: u64) -> Result<Duration> {
    let delay = Duration::from_millis(millis);
    if delay > MAX_RESPONSE_DELAY {
        bail!(
            "response delay cannot be greater than {} seconds",
            MAX_RESPONSE_DELAY.as_secs()
        );
    }
    Ok(delay)
}
