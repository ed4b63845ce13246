//! LM Studio local API client.
//!
//! Speaks the OpenAI-compatible `completions` and `chat/completions` endpoints
//! that LM Studio exposes at `http://localhost:1234/v1`. One enhancement
//! invocation corresponds to exactly one blocking call here with the
//! configured timeout; failures are never retried.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatMessage, Completion, CompletionClient, LlmError};
use crate::config::Config;

/// Timeout for the health probe; much shorter than completion requests.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the LM Studio local API.
pub struct LmStudioClient {
    client: Client,
    base_url: String,
    model_name: String,
    max_tokens: u32,
    temperature: f64,
    timeout: Duration,
}

impl LmStudioClient {
    /// Create a client from service configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.lm_studio_base_url.trim_end_matches('/').to_string(),
            model_name: config.model_name.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.request_timeout,
        }
    }

    async fn post_json<B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<CompletionsResponse, LlmError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!("Sending request to {}", url);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(LlmError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| LlmError::Parse(format!("{}, body: {}", e, body)))
    }

    /// Check whether LM Studio is running and which models it has loaded.
    pub async fn check_health(&self) -> LmStudioHealth {
        let url = format!("{}/models", self.base_url);
        let result = self.client.get(&url).timeout(HEALTH_TIMEOUT).send().await;

        match result {
            Ok(response) if response.status().is_success() => {
                let models: ModelsResponse = response.json().await.unwrap_or_default();
                LmStudioHealth {
                    status: "healthy".to_string(),
                    available_models: models.data.into_iter().map(|m| m.id).collect(),
                    current_model: self.model_name.clone(),
                    error: None,
                }
            }
            Ok(response) => LmStudioHealth {
                status: "unhealthy".to_string(),
                available_models: Vec::new(),
                current_model: self.model_name.clone(),
                error: Some(format!("HTTP {}", response.status().as_u16())),
            },
            Err(e) => LmStudioHealth {
                status: "unhealthy".to_string(),
                available_models: Vec::new(),
                current_model: self.model_name.clone(),
                error: Some(e.to_string()),
            },
        }
    }
}

#[async_trait]
impl CompletionClient for LmStudioClient {
    async fn text_completion(&self, prompt: &str) -> Result<Completion, LlmError> {
        let request = CompletionsRequest {
            model: &self.model_name,
            prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            reset: true,
        };

        let response = self.post_json("completions", &request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Parse("No choices in response".to_string()))?;

        let text = choice.text.unwrap_or_default().trim().to_string();
        Ok(Completion {
            text,
            total_tokens: response.usage.map(|u| u.total_tokens).unwrap_or(0),
        })
    }

    async fn chat_completion(&self, messages: &[ChatMessage]) -> Result<Completion, LlmError> {
        let request = ChatCompletionsRequest {
            model: &self.model_name,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        };

        let response = self.post_json("chat/completions", &request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Parse("No choices in response".to_string()))?;

        let text = choice
            .message
            .and_then(|m| m.content)
            .unwrap_or_default()
            .trim()
            .to_string();
        Ok(Completion {
            text,
            total_tokens: response.usage.map(|u| u.total_tokens).unwrap_or(0),
        })
    }
}

/// Health report for the LM Studio server.
#[derive(Debug, Clone, Serialize)]
pub struct LmStudioHealth {
    pub status: String,
    pub available_models: Vec<String>,
    pub current_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Text-completion request body (LM Studio `completions` endpoint).
#[derive(Debug, Serialize)]
struct CompletionsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f64,
    reset: bool,
}

/// Chat-completion request body (LM Studio `chat/completions` endpoint).
#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

/// Response shape shared by both endpoints.
#[derive(Debug, Deserialize)]
struct CompletionsResponse {
    choices: Vec<CompletionsChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct CompletionsChoice {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

#[derive(Debug, Default, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}
