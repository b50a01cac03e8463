//! Session state machine
//!
//! Holds the single live conversation:
//! - current interaction style and its resolved model configuration
//! - ordered message history
//! - optional title carried across resume/save
//!
//! A normal style switch clears the conversation; resuming a stored record
//! installs the record's history instead.

use crate::config::{resolve_model_config, LlmConfig, ModelConfig};
use crate::core::types::{ChatMessage, Role, SessionStyle};

/// The in-memory active conversation
///
/// Owned by the backend and passed by reference into each handler.
#[derive(Debug, Clone)]
pub struct Session {
    style: SessionStyle,
    history: Vec<ChatMessage>,
    model_config: ModelConfig,
    title: Option<String>,
}

impl Session {
    /// Create a session in `style` with an empty history
    pub fn new(style: SessionStyle, llm: &LlmConfig) -> Self {
        Self {
            style,
            history: Vec::new(),
            model_config: resolve_model_config(style, llm),
            title: None,
        }
    }

    pub fn style(&self) -> SessionStyle {
        self.style
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn model_config(&self) -> &ModelConfig {
        &self.model_config
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Switch to `style`
    ///
    /// Returns `true` when the style changed. Switching to the active style
    /// leaves history and title untouched.
    pub fn switch_style(&mut self, style: SessionStyle, llm: &LlmConfig) -> bool {
        if style == self.style {
            tracing::debug!("Style {} already active", style);
            return false;
        }

        self.style = style;
        self.history.clear();
        self.title = None;
        self.model_config = resolve_model_config(style, llm);
        tracing::info!(
            "New session in style {} (model {})",
            style,
            self.model_config.model
        );
        true
    }

    /// Install a stored record as the live conversation
    ///
    /// Always takes effect, even when `style` is already active.
    pub fn resume(
        &mut self,
        style: SessionStyle,
        history: Vec<ChatMessage>,
        title: Option<String>,
        llm: &LlmConfig,
    ) {
        self.style = style;
        self.model_config = resolve_model_config(style, llm);
        self.history = history;
        self.title = title;
        tracing::info!(
            "Resumed {} session with {} messages",
            style,
            self.history.len()
        );
    }

    /// Drop the conversation but keep style and title
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Record a completed exchange
    pub fn append_exchange(&mut self, prompt: impl Into<String>, reply: impl Into<String>) {
        self.history.push(ChatMessage::user(prompt));
        self.history.push(ChatMessage::assistant(reply));
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.history.last()
    }

    /// Most recent message with `role`
    pub fn last_by_role(&self, role: Role) -> Option<&ChatMessage> {
        self.history.iter().rev().find(|m| m.role == role)
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm() -> LlmConfig {
        LlmConfig::default()
    }

    #[test]
    fn test_switch_to_same_style_is_noop() {
        let llm = llm();
        let mut session = Session::new(SessionStyle::Chat, &llm);
        session.append_exchange("CIAO", "Ciao a te, come stai oggi?");
        session.set_title("Saluti");

        assert!(!session.switch_style(SessionStyle::Chat, &llm));
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.title(), Some("Saluti"));
    }

    #[test]
    fn test_switch_to_other_style_resets() {
        let llm = llm();
        let mut session = Session::new(SessionStyle::Chat, &llm);
        session.append_exchange("CIAO", "Ciao!");
        session.set_title("Saluti");

        assert!(session.switch_style(SessionStyle::Translation, &llm));
        assert!(session.history().is_empty());
        assert_eq!(session.title(), None);
        assert_eq!(session.style(), SessionStyle::Translation);
        assert_eq!(session.model_config().max_tokens, 500);
    }

    #[test]
    fn test_resume_same_style_installs_history() {
        let llm = llm();
        let mut session = Session::new(SessionStyle::Exploration, &llm);
        session.append_exchange("old", "old reply");

        let stored = vec![ChatMessage::user("A"), ChatMessage::assistant("B")];
        session.resume(
            SessionStyle::Exploration,
            stored.clone(),
            Some("Stelle".into()),
            &llm,
        );

        assert_eq!(session.history(), stored.as_slice());
        assert_eq!(session.title(), Some("Stelle"));
    }

    #[test]
    fn test_clear_history_keeps_style_and_title() {
        let llm = llm();
        let mut session = Session::new(SessionStyle::ArticleWriting, &llm);
        session.append_exchange("a", "b");
        session.set_title("Articolo");
        session.clear_history();

        assert!(session.is_empty());
        assert_eq!(session.style(), SessionStyle::ArticleWriting);
        assert_eq!(session.title(), Some("Articolo"));
    }

    #[test]
    fn test_last_by_role() {
        let llm = llm();
        let mut session = Session::new(SessionStyle::Chat, &llm);
        session.append_exchange("first", "one");
        session.append_exchange("second", "two");

        assert_eq!(session.last_by_role(Role::User).unwrap().content, "second");
        assert_eq!(session.last_by_role(Role::Assistant).unwrap().content, "two");
    }
}
