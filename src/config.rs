use crate::error::EvalError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Shape of the system under test's API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointType {
    /// Plain query-in, answer-out endpoint
    Generic,
    /// OpenAI-compatible chat completion endpoint
    Openai,
    /// Anthropic-style completion endpoint
    Anthropic,
    /// Caller supplies the request body template
    Custom,
}

/// HTTP method used to reach the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Get,
    Post,
}

/// Configuration for a single evaluation run
///
/// Immutable once a run starts; the executor clones it into the report
/// snapshot.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvaluationConfig {
    /// URL of the endpoint under test
    #[serde(default)]
    pub endpoint: String,
    /// API key, injected as a bearer token unless an Authorization header
    /// is already supplied
    #[serde(default)]
    pub api_key: Option<String>,
    /// Shape of the endpoint's API
    #[serde(default = "default_endpoint_type")]
    pub endpoint_type: EndpointType,
    /// HTTP method for requests
    #[serde(default = "default_request_method")]
    pub request_method: RequestMethod,
    /// Dot-path locating the answer inside the response, empty to
    /// auto-detect
    #[serde(default)]
    pub response_path: String,
    /// Extra request headers, overriding defaults on key collision
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// JSON body template with a `{{query}}` placeholder, required for the
    /// custom endpoint type
    #[serde(default)]
    pub request_format: Option<serde_json::Value>,
    /// Run offline with synthesized answers instead of contacting the
    /// endpoint
    #[serde(default)]
    pub demo: bool,
}

fn default_endpoint_type() -> EndpointType {
    EndpointType::Generic
}

fn default_request_method() -> RequestMethod {
    RequestMethod::Post
}

impl EvaluationConfig {
    /// Load a configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }

    /// Check that the configuration can back a run.
    ///
    /// Demo runs never touch the network and need no endpoint; everything
    /// else requires a parseable http(s) URL.
    pub fn validate(&self) -> Result<(), EvalError> {
        if self.demo {
            return Ok(());
        }

        if self.endpoint.trim().is_empty() {
            return Err(EvalError::Report(
                "no endpoint configured and demo mode is off".to_string(),
            ));
        }

        let url = reqwest::Url::parse(&self.endpoint).map_err(|e| {
            EvalError::Report(format!("invalid endpoint URL {:?}: {}", self.endpoint, e))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(EvalError::Report(format!(
                "unsupported endpoint scheme {:?}",
                other
            ))),
        }
    }
}
