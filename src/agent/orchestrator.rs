//! Turns a user prompt plus the live session into a validated reply

use crate::agent::context::build_messages;
use crate::agent::prompts::PromptBuilder;
use crate::agent::response::{parse_reply, validate, APOLOGY};
use crate::config::Config;
use crate::core::session::Session;
use crate::llm::{CompletionRequest, LlmError, LlmProvider};

/// Outcome of one provider exchange
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Validated reply text, or the fixed apology when validation failed
    pub content: String,
    pub metadata: Option<serde_json::Value>,
    /// False when `content` is the apology
    pub accepted: bool,
}

impl Reply {
    fn rejected() -> Self {
        Self {
            content: APOLOGY.to_string(),
            metadata: None,
            accepted: false,
        }
    }
}

pub struct Orchestrator {
    provider: Box<dyn LlmProvider>,
    prompts: PromptBuilder,
    max_history: usize,
    language: String,
    retry_token: String,
    emit_final_token: String,
}

impl Orchestrator {
    pub fn new(provider: Box<dyn LlmProvider>, config: &Config) -> Self {
        Self {
            provider,
            prompts: PromptBuilder::new(
                config.commands.clone(),
                config.chat_context.clone(),
                &config.llm.language,
            ),
            max_history: config.llm.max_history_messages,
            language: config.llm.language.clone(),
            retry_token: config.commands.retry.clone(),
            emit_final_token: config.commands.emit_final.clone(),
        }
    }

    pub fn with_prompts(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn is_retry(&self, text: &str) -> bool {
        text.trim() == self.retry_token
    }

    pub fn is_emit_final(&self, text: &str) -> bool {
        text.trim() == self.emit_final_token
    }

    /// One provider call over the current session; never touches history
    async fn generate(&self, session: &Session, prompt: &str) -> Result<Reply, LlmError> {
        let style = session.style();
        let request = CompletionRequest::new(
            self.prompts.system_prompt(style),
            build_messages(session.history(), prompt, self.max_history),
            session.model_config(),
        );

        tracing::info!(
            "Processing prompt in style {} (history {})",
            style,
            session.history().len()
        );

        let response = self.provider.generate(&request).await.map_err(|e| {
            tracing::error!("Provider {} failed: {}", self.provider.name(), e);
            e
        })?;

        if let Some(usage) = response.usage {
            tracing::debug!(
                "Model {} used {} input / {} output tokens",
                response.model,
                usage.input_tokens,
                usage.output_tokens
            );
        }

        let parsed = parse_reply(&response.content);
        if let Err(rejection) = validate(&parsed.content, &response, &self.language) {
            tracing::warn!("Rejected reply from {}: {}", response.model, rejection);
            return Ok(Reply::rejected());
        }

        Ok(Reply {
            content: parsed.content,
            metadata: parsed.metadata,
            accepted: true,
        })
    }

    /// Process a user prompt, appending the exchange when the reply is accepted
    pub async fn respond(&self, session: &mut Session, prompt: &str) -> Result<Reply, LlmError> {
        let reply = self.generate(session, prompt).await?;
        if reply.accepted {
            session.append_exchange(prompt, reply.content.clone());
        }
        Ok(reply)
    }

    /// Ask for an alternative to the last answer
    ///
    /// Only the new (retry, reply) pair is appended.
    pub async fn retry(&self, session: &mut Session) -> Result<Reply, LlmError> {
        let token = self.retry_token.clone();
        tracing::info!("Retrying last answer in style {}", session.style());
        self.respond(session, &token).await
    }

    /// Ask for the final polished content of the session
    ///
    /// The session is borrowed immutably, so its history is unchanged.
    pub async fn emit_final(&self, session: &Session) -> Result<Reply, LlmError> {
        self.generate(session, &self.emit_final_token).await
    }

    /// Condense the conversation into a message for the chat platform
    pub async fn prepare_message(&self, session: &Session) -> Result<Reply, LlmError> {
        let prompt = self.prompts.platform_message_prompt();
        self.generate(session, &prompt).await
    }

    /// Open a stored artifact for revision in the session's current style
    pub async fn revise_artifact(
        &self,
        session: &mut Session,
        content: &str,
    ) -> Result<Reply, LlmError> {
        let prompt = self.prompts.revision_prompt(session.style(), content);
        self.respond(session, &prompt).await
    }
}
