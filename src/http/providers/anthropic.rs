/// Anthropic API client implementation.
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::http::client::{ChatClient, ClientConfig, CompletionRequest, CompletionResponse};

/// Anthropic messages API client.
pub struct AnthropicClient {
    client: Client,
    config: ClientConfig,
}

impl AnthropicClient {
    /// Create a new Anthropic client.
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        let client = config.build_http_client()?;
        Ok(Self { client, config })
    }

    fn default_endpoint() -> String {
        "https://api.anthropic.com/v1/messages".to_string()
    }
}

#[async_trait::async_trait]
impl ChatClient for AnthropicClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, AppError> {
        let endpoint = if self.config.endpoint.is_empty() {
            Self::default_endpoint()
        } else {
            self.config.endpoint.clone()
        };

        let system = if request.system_prompt.is_empty() {
            None
        } else {
            Some(request.system_prompt.clone())
        };

        let payload = AnthropicRequest {
            model: request.model.clone(),
            max_tokens: request.sampling.max_tokens,
            system,
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            temperature: request.sampling.temperature,
            top_p: request.sampling.top_p,
        };

        let mut req = self
            .client
            .post(&endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("content-type", "application/json")
            .header("anthropic-version", "2023-06-01");

        for (key, value) in &self.config.headers {
            req = req.header(key, value);
        }

        let response = req
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Api(format!(
                "Anthropic API error ({}): {}",
                status, error_text
            )));
        }

        let api_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| AppError::Http(format!("Failed to parse JSON response: {}", e)))?;

        let content = api_response
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| {
                AppError::Api("No response content returned from Anthropic".to_string())
            })?;

        let model = api_response
            .model
            .unwrap_or_else(|| request.model.clone());

        Ok(CompletionResponse { content, model })
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingParams;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn anthropic_client_sends_expected_payload() {
        let server = MockServer::start_async().await;
        let path = "/v1/messages";

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(path)
                    .header("x-api-key", "sk-test")
                    .header("content-type", "application/json")
                    .header("anthropic-version", "2023-06-01")
                    .json_body(json!({
                        "model": "claude-3-sonnet",
                        "max_tokens": 1000,
                        "system": "You are a helpful AI assistant.",
                        "messages": [
                            { "role": "user", "content": "Hello there" }
                        ],
                        "temperature": 0.7,
                        "top_p": 1.0
                    }));

                then.status(200).json_body(json!({
                    "content": [
                        { "text": "Hello from Anthropic!" }
                    ],
                    "model": "claude-3-sonnet"
                }));
            })
            .await;

        let config = ClientConfig {
            endpoint: format!("{}{}", server.base_url(), path),
            api_key: "sk-test".into(),
            timeout: Duration::from_secs(30),
            insecure: false,
            headers: Vec::new(),
        };

        let client = AnthropicClient::new(config).expect("client initialization");
        let response = client
            .complete(&CompletionRequest {
                model: "claude-3-sonnet".to_string(),
                system_prompt: "You are a helpful AI assistant.".to_string(),
                prompt: "Hello there".to_string(),
                sampling: SamplingParams::default(),
            })
            .await
            .expect("request should succeed");

        assert_eq!(response.content, "Hello from Anthropic!");
        assert_eq!(response.model, "claude-3-sonnet");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn anthropic_client_rejects_empty_content() {
        let server = MockServer::start_async().await;
        let path = "/v1/messages";

        server
            .mock_async(|when, then| {
                when.method(POST).path(path);
                then.status(200).json_body(json!({
                    "content": [],
                    "model": "claude-3-sonnet"
                }));
            })
            .await;

        let config = ClientConfig {
            endpoint: format!("{}{}", server.base_url(), path),
            api_key: "sk-test".into(),
            timeout: Duration::from_secs(30),
            insecure: false,
            headers: Vec::new(),
        };

        let client = AnthropicClient::new(config).expect("client initialization");
        let result = client
            .complete(&CompletionRequest {
                model: "claude-3-sonnet".to_string(),
                system_prompt: String::new(),
                prompt: "Hello".to_string(),
                sampling: SamplingParams::default(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Api(_))));
    }
}
