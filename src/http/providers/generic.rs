/// Generic OpenAI-compatible client implementation.
///
/// Posts a chat-completions payload to a user-supplied endpoint and accepts
/// several common response shapes, for self-hosted inference servers that
/// approximate the OpenAI wire format.
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::http::client::{ChatClient, ClientConfig, CompletionRequest, CompletionResponse};

/// Generic REST API client.
pub struct GenericClient {
    client: Client,
    config: ClientConfig,
}

impl GenericClient {
    /// Create a new generic client.
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        let client = config.build_http_client()?;
        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl ChatClient for GenericClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, AppError> {
        if self.config.endpoint.is_empty() {
            return Err(AppError::Config(
                "Generic provider requires an endpoint. Specify one with --endpoint.".to_string(),
            ));
        }

        let mut messages = Vec::new();
        if !request.system_prompt.is_empty() {
            messages.push(GenericMessage {
                role: "system".to_string(),
                content: request.system_prompt.clone(),
            });
        }
        messages.push(GenericMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        let payload = GenericRequest {
            model: request.model.clone(),
            messages,
            temperature: request.sampling.temperature,
            top_p: request.sampling.top_p,
            max_tokens: request.sampling.max_tokens,
        };

        let mut req = self.client.post(&self.config.endpoint);

        if !self.config.api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.config.api_key));
        }

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
                "Generic API error ({}): {}",
                status, error_text
            )));
        }

        let api_response: GenericResponse = response
            .json()
            .await
            .map_err(|e| AppError::Http(format!("Failed to parse JSON response: {}", e)))?;

        let content = api_response.primary_content().ok_or_else(|| {
            AppError::Api("Generic response did not contain content field".into())
        })?;

        Ok(CompletionResponse {
            content,
            model: request.model.clone(),
        })
    }

    fn provider_name(&self) -> &str {
        "generic"
    }
}

#[derive(Debug, Serialize)]
struct GenericRequest {
    model: String,
    messages: Vec<GenericMessage>,
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct GenericMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize, Default)]
struct GenericResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    choices: Option<Vec<GenericChoice>>,
}

impl GenericResponse {
    fn primary_content(&self) -> Option<String> {
        self.content
            .clone()
            .or(self.response.clone())
            .or(self.result.clone())
            .or(self.output.clone())
            .or(self.message.clone())
            .or_else(|| {
                self.choices.as_ref().and_then(|choices| {
                    choices.iter().find_map(|choice| {
                        choice
                            .text
                            .clone()
                            .or_else(|| choice.message.as_ref().and_then(|m| m.content.clone()))
                    })
                })
            })
    }
}

#[derive(Debug, Deserialize)]
struct GenericChoice {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    message: Option<GenericChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct GenericChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingParams;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn request(prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model: "custom-model".to_string(),
            system_prompt: String::new(),
            prompt: prompt.to_string(),
            sampling: SamplingParams::default(),
        }
    }

    #[tokio::test]
    async fn generic_client_handles_response_variants() {
        let server = MockServer::start_async().await;
        let path = "/mock-endpoint";

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(path)
                    .header("Authorization", "Bearer generic-key")
                    .json_body(json!({
                        "model": "custom-model",
                        "messages": [
                            { "role": "user", "content": "Ping" }
                        ],
                        "temperature": 0.7,
                        "top_p": 1.0,
                        "max_tokens": 1000
                    }));

                then.status(200).json_body(json!({
                    "choices": [
                        { "message": { "content": "Pong!" } }
                    ]
                }));
            })
            .await;

        let config = ClientConfig {
            endpoint: format!("{}{}", server.base_url(), path),
            api_key: "generic-key".into(),
            timeout: Duration::from_secs(15),
            insecure: false,
            headers: Vec::new(),
        };

        let client = GenericClient::new(config).expect("generic client init");
        let response = client
            .complete(&request("Ping"))
            .await
            .expect("request should succeed");

        assert_eq!(response.content, "Pong!");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn generic_client_accepts_flat_content_field() {
        let server = MockServer::start_async().await;
        let path = "/mock-endpoint";

        server
            .mock_async(|when, then| {
                when.method(POST).path(path);
                then.status(200).json_body(json!({ "response": "flat reply" }));
            })
            .await;

        let config = ClientConfig {
            endpoint: format!("{}{}", server.base_url(), path),
            api_key: String::new(),
            timeout: Duration::from_secs(15),
            insecure: false,
            headers: Vec::new(),
        };

        let client = GenericClient::new(config).expect("generic client init");
        let response = client
            .complete(&request("Ping"))
            .await
            .expect("request should succeed");

        assert_eq!(response.content, "flat reply");
    }

    #[tokio::test]
    async fn generic_client_requires_endpoint() {
        let config = ClientConfig {
            endpoint: String::new(),
            api_key: String::new(),
            timeout: Duration::from_secs(15),
            insecure: false,
            headers: Vec::new(),
        };

        let client = GenericClient::new(config).expect("generic client init");
        let result = client.complete(&request("prompt")).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
