//! Request and response types shared by all providers

use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::core::types::ChatMessage;

/// Completion reasons that mean the model finished normally
pub const NORMAL_FINISH_REASONS: [&str; 3] = ["end_turn", "stop", "stop_sequence"];

/// One provider call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Style framing sent as the system prompt
    pub system: String,
    /// Bounded history window followed by the new user prompt
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(system: String, messages: Vec<ChatMessage>, config: &ModelConfig) -> Self {
        Self {
            system,
            messages,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Text of the final (user) message
    pub fn prompt(&self) -> Option<&str> {
        self.messages.last().map(|m| m.content.as_str())
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Raw provider reply
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    pub content: String,
    /// Why generation stopped, as reported by the provider
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
    /// Model that actually served the request
    pub model: String,
}

impl LlmResponse {
    pub fn finished_normally(&self) -> bool {
        self.finish_reason
            .as_deref()
            .is_some_and(|r| NORMAL_FINISH_REASONS.contains(&r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(reason: Option<&str>) -> LlmResponse {
        LlmResponse {
            content: "text".into(),
            finish_reason: reason.map(String::from),
            usage: None,
            model: "m".into(),
        }
    }

    #[test]
    fn test_finished_normally() {
        assert!(response(Some("end_turn")).finished_normally());
        assert!(response(Some("stop")).finished_normally());
        assert!(response(Some("stop_sequence")).finished_normally());
        assert!(!response(Some("max_tokens")).finished_normally());
        assert!(!response(None).finished_normally());
    }

    #[test]
    fn test_request_copies_model_parameters() {
        let config = ModelConfig {
            model: "claude-test".into(),
            temperature: 0.3,
            max_tokens: 500,
        };
        let request = CompletionRequest::new(
            "system".into(),
            vec![ChatMessage::user("CIAO")],
            &config,
        );
        assert_eq!(request.model, "claude-test");
        assert_eq!(request.max_tokens, 500);
        assert_eq!(request.prompt(), Some("CIAO"));
    }
}
