/// Immutable per-run test configuration.
use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Backend kinds the harness can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    /// OpenAI chat-completions API.
    Openai,
    /// Anthropic messages API.
    Anthropic,
    /// Any OpenAI-compatible endpoint, addressed by explicit URL.
    Generic,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Openai => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Generic => "generic",
        }
    }
}

/// Sampling parameters forwarded to the backend on every request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: 1000,
        }
    }
}

/// Configuration for one test invocation.
///
/// Deliberately immutable: each invocation takes its own snapshot, so there is
/// no order-dependent mutation between successive tests sharing a config.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Which backend client kind to construct.
    pub provider: Provider,
    /// Target model identifier.
    pub model: String,
    /// Endpoint override; falls back to the provider default when `None`.
    /// Required for the generic provider.
    pub endpoint: Option<String>,
    /// API credential. May be empty for unauthenticated generic endpoints.
    pub api_key: String,
    /// Optional system prompt prepended to every request.
    pub system_prompt: Option<String>,
    pub sampling: SamplingParams,
    /// Skip TLS certificate validation (self-signed test endpoints).
    pub insecure: bool,
    /// Directory for persisted aggregate reports; no persistence when `None`.
    pub output_dir: Option<PathBuf>,
    /// Per-request deadline enforced by the HTTP client. A hung backend shows
    /// up as a failed outcome instead of blocking the run indefinitely.
    pub request_timeout: Duration,
}

impl TestConfig {
    pub fn new(provider: Provider, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            endpoint: None,
            api_key: api_key.into(),
            system_prompt: None,
            sampling: SamplingParams::default(),
            insecure: false,
            output_dir: None,
            request_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        if !request_timeout.is_zero() {
            self.request_timeout = request_timeout;
        }
        self
    }
}
