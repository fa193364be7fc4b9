/// OpenAI API client implementation.
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::http::client::{ChatClient, ClientConfig, CompletionRequest, CompletionResponse};

/// OpenAI chat-completions client.
pub struct OpenAiClient {
    client: Client,
    config: ClientConfig,
}

/// OpenAI API request payload.
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
}

/// Message in OpenAI format.
#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// OpenAI API response.
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageResponse,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: String,
}

impl OpenAiClient {
    /// Create a new OpenAI client.
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        let client = config.build_http_client()?;
        Ok(Self { client, config })
    }

    fn default_endpoint() -> String {
        "https://api.openai.com/v1/chat/completions".to_string()
    }
}

#[async_trait::async_trait]
impl ChatClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, AppError> {
        let endpoint = if self.config.endpoint.is_empty() {
            Self::default_endpoint()
        } else {
            self.config.endpoint.clone()
        };

        let mut messages = Vec::new();
        if !request.system_prompt.is_empty() {
            messages.push(Message {
                role: "system".to_string(),
                content: request.system_prompt.clone(),
            });
        }
        messages.push(Message {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        let payload = OpenAiRequest {
            model: request.model.clone(),
            messages,
            temperature: request.sampling.temperature,
            top_p: request.sampling.top_p,
            max_tokens: request.sampling.max_tokens,
        };

        let mut req = self
            .client
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json");

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
                "API error ({}): {}",
                status, error_text
            )));
        }

        let api_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Http(format!("Failed to parse JSON response: {}", e)))?;

        let content = api_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| AppError::Api("No response content".to_string()))?;

        let model = api_response
            .model
            .unwrap_or_else(|| request.model.clone());

        Ok(CompletionResponse { content, model })
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}
