//! Claude (Anthropic) provider implementation
//!
//! SECURITY: the API key is ONLY sent to the official Anthropic endpoint.

use super::{CompletionRequest, LlmError, LlmProvider, LlmResponse, TokenUsage};
use crate::core::types::Role;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Official Anthropic API endpoint - API key is ONLY sent here
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct ClaudeProvider {
    client: reqwest::Client,
    api_key: String,
}

impl ClaudeProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Unauthorized("API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(LlmError::from_network_error)?;

        Ok(Self { client, api_key })
    }

    fn build_request(request: &CompletionRequest) -> ClaudeRequest {
        ClaudeRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: (!request.system.is_empty()).then(|| request.system.clone()),
            messages: request
                .messages
                .iter()
                .map(|m| ClaudeMessage {
                    role: match m.role {
                        Role::User => "user",
                        Role::Assistant => "assistant",
                    },
                    content: m.content.clone(),
                })
                .collect(),
        }
    }

    async fn send_request(&self, request: &ClaudeRequest) -> Result<ClaudeResponse, LlmError> {
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(LlmError::from_network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_http_status(status, error_text));
        }

        response
            .json::<ClaudeResponse>()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    fn name(&self) -> &str {
        "claude"
    }

    async fn generate(&self, request: &CompletionRequest) -> Result<LlmResponse, LlmError> {
        let body = Self::build_request(request);
        tracing::debug!(
            "Sending {} messages to {} (max_tokens {})",
            body.messages.len(),
            body.model,
            body.max_tokens
        );

        let response = self.send_request(&body).await?;
        response.into_llm_response()
    }
}

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ClaudeMessage>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClaudeContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContentBlock>,
    model: String,
    stop_reason: Option<String>,
    usage: Option<ClaudeUsage>,
}

#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    input_tokens: u32,
    output_tokens: u32,
}

impl ClaudeResponse {
    fn into_llm_response(self) -> Result<LlmResponse, LlmError> {
        let text_parts: Vec<String> = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                ClaudeContentBlock::Text { text } => Some(text),
                ClaudeContentBlock::Unsupported => None,
            })
            .collect();

        if text_parts.is_empty() {
            return Err(LlmError::MalformedResponse(
                "response carried no text block".to_string(),
            ));
        }

        Ok(LlmResponse {
            content: text_parts.join("\n"),
            finish_reason: self.stop_reason,
            usage: self.usage.map(|u| TokenUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
            model: self.model,
        })
    }
}
