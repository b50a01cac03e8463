//! LLM provider implementations

use crate::config::Config;

mod claude;
mod error;
mod scripted;
mod types;

pub use claude::ClaudeProvider;
pub use error::{LlmError, ProviderErrorKind};
pub use scripted::ScriptedProvider;
pub use types::*;

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Trait for LLM providers
///
/// Given a system prompt, a message list and model parameters, return the
/// reply text plus completion metadata, or a typed provider error.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Send a non-streaming completion request
    async fn generate(&self, request: &CompletionRequest) -> Result<LlmResponse, LlmError>;
}

/// Create the provider named in the configuration
pub fn create_provider(config: &Config) -> Result<Box<dyn LlmProvider>> {
    match config.llm.provider.to_lowercase().as_str() {
        "claude" | "anthropic" => {
            let api_key = config.api_key().with_context(|| {
                format!("{} environment variable not set", config.llm.api_key_env)
            })?;
            Ok(Box::new(ClaudeProvider::new(api_key)?))
        }
        "scripted" => {
            tracing::warn!("Using the scripted provider; no replies are queued");
            Ok(Box::new(ScriptedProvider::new()))
        }
        other => anyhow::bail!("Unknown provider: {}. Supported: claude", other),
    }
}
