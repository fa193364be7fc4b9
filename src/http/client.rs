/// HTTP client abstraction for chat-completion backends.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{SamplingParams, TestConfig};
use crate::error::AppError;

/// One chat-completion request as the backends see it.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Target model identifier.
    pub model: String,
    /// System prompt; empty when the run has none configured.
    pub system_prompt: String,
    /// User prompt text.
    pub prompt: String,
    pub sampling: SamplingParams,
}

/// Response from a chat-completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated completion text.
    pub content: String,
    /// Model that produced the response.
    pub model: String,
}

/// Trait for chat-completion backend clients.
///
/// Implementations must be safe for concurrent use: a batched test issues
/// multiple simultaneous calls against one shared client instance.
#[async_trait::async_trait]
pub trait ChatClient: Send + Sync {
    /// Send one prompt and return the completion text, or fail with a
    /// backend-specific error.
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, AppError>;

    /// Get the provider name.
    fn provider_name(&self) -> &str;
}

/// Enum wrapper over the closed set of backend client kinds.
pub enum ChatClientEnum {
    OpenAi(crate::http::providers::openai::OpenAiClient),
    Anthropic(crate::http::providers::anthropic::AnthropicClient),
    Generic(crate::http::providers::generic::GenericClient),
}

impl ChatClientEnum {
    /// Construct the client selected by the configuration.
    ///
    /// The client is scoped to the caller; no process-wide state is touched.
    pub fn from_config(config: &TestConfig) -> Result<Self, AppError> {
        use crate::config::Provider;
        use crate::http::providers::anthropic::AnthropicClient;
        use crate::http::providers::generic::GenericClient;
        use crate::http::providers::openai::OpenAiClient;

        let client_config = ClientConfig {
            endpoint: config.endpoint.clone().unwrap_or_default(),
            api_key: config.api_key.clone(),
            timeout: config.request_timeout,
            insecure: config.insecure,
            headers: Vec::new(),
        };

        match config.provider {
            Provider::Openai => Ok(ChatClientEnum::OpenAi(OpenAiClient::new(client_config)?)),
            Provider::Anthropic => Ok(ChatClientEnum::Anthropic(AnthropicClient::new(
                client_config,
            )?)),
            Provider::Generic => Ok(ChatClientEnum::Generic(GenericClient::new(client_config)?)),
        }
    }
}

#[async_trait::async_trait]
impl ChatClient for ChatClientEnum {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, AppError> {
        match self {
            ChatClientEnum::OpenAi(client) => client.complete(request).await,
            ChatClientEnum::Anthropic(client) => client.complete(request).await,
            ChatClientEnum::Generic(client) => client.complete(request).await,
        }
    }

    fn provider_name(&self) -> &str {
        match self {
            ChatClientEnum::OpenAi(client) => client.provider_name(),
            ChatClientEnum::Anthropic(client) => client.provider_name(),
            ChatClientEnum::Generic(client) => client.provider_name(),
        }
    }
}

/// HTTP client configuration shared by all provider implementations.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API endpoint URL; empty means use the provider default.
    pub endpoint: String,
    /// API key; may be empty for unauthenticated endpoints.
    pub api_key: String,
    /// Per-request deadline.
    pub timeout: Duration,
    /// Skip TLS certificate validation.
    pub insecure: bool,
    /// Additional headers.
    pub headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            timeout: Duration::from_secs(60),
            insecure: false,
            headers: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Build the underlying reqwest client with the configured deadline and
    /// TLS behavior.
    pub(crate) fn build_http_client(&self) -> Result<reqwest::Client, AppError> {
        let mut builder = reqwest::Client::builder().timeout(self.timeout);
        if self.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }
        builder
            .build()
            .map_err(|e| AppError::Http(format!("Failed to create HTTP client: {}", e)))
    }
}
