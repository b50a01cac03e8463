//! Outbound message window

use crate::core::types::{ChatMessage, Role};

/// Default cap on history entries sent with each request
pub const DEFAULT_MAX_MESSAGES: usize = 10;

/// Last `max_messages` entries of `history` in chronological order, followed
/// by `prompt` as the final user message
///
/// The window always opens on a user message, so an odd cap may send one
/// entry fewer.
pub fn build_messages(history: &[ChatMessage], prompt: &str, max_messages: usize) -> Vec<ChatMessage> {
    let mut start = history.len().saturating_sub(max_messages);
    while start < history.len() && history[start].role != Role::User {
        start += 1;
    }
    let window = &history[start..];

    tracing::debug!(
        "Context window: {} of {} history messages (~{} words)",
        window.len(),
        history.len(),
        estimate_words(window)
    );

    let mut messages = Vec::with_capacity(window.len() + 1);
    messages.extend_from_slice(window);
    messages.push(ChatMessage::user(prompt));
    messages
}

/// Whitespace word count, used as a rough size proxy
pub fn estimate_words(messages: &[ChatMessage]) -> usize {
    messages
        .iter()
        .map(|m| m.content.split_whitespace().count())
        .sum()
}
