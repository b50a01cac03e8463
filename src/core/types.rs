//! Canonical type definitions for the core domain
//!
//! The interaction styles and conversation messages are shared by the
//! session state machine, the orchestration layer, the stores and the
//! dispatcher, so they live here and everything else re-exports them.

use serde::{Deserialize, Serialize};

/// Interaction style of the live session
///
/// Every style carries its own prompt template and model parameters.
/// The transition graph between styles is fully connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStyle {
    /// Explain concepts and ideas
    Exploration,
    /// Songs, stories and poems
    CreativeWriting,
    /// Articles, speeches and blog posts
    ArticleWriting,
    /// Turn symbol sequences into natural sentences
    #[default]
    Translation,
    /// Social conversation on a messaging platform
    Chat,
}

impl SessionStyle {
    /// All styles, in declaration order
    pub const ALL: [SessionStyle; 5] = [
        Self::Exploration,
        Self::CreativeWriting,
        Self::ArticleWriting,
        Self::Translation,
        Self::Chat,
    ];

    /// Stable identifier used in config tables and chat records
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exploration => "exploration",
            Self::CreativeWriting => "creative_writing",
            Self::ArticleWriting => "article_writing",
            Self::Translation => "translation",
            Self::Chat => "chat",
        }
    }

    /// Name read aloud to the user
    pub fn spoken_name(&self) -> &'static str {
        match self {
            Self::Exploration => "esplorazione",
            Self::CreativeWriting => "scrittura creativa",
            Self::ArticleWriting => "scrittura articoli",
            Self::Translation => "traduzione",
            Self::Chat => "chat",
        }
    }

    /// Whether run-time conversation parameters (platform, tone, length)
    /// are injected into the system prompt
    pub fn is_conversational(&self) -> bool {
        matches!(self, Self::Chat)
    }
}

impl std::fmt::Display for SessionStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "exploration" | "explore" => Ok(Self::Exploration),
            "creative_writing" | "creative" => Ok(Self::CreativeWriting),
            "article_writing" | "article" => Ok(Self::ArticleWriting),
            "translation" | "translate" => Ok(Self::Translation),
            "chat" => Ok(Self::Chat),
            other => Err(format!("unknown session style: {other}")),
        }
    }
}

/// Author of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the session history
///
/// Order is the position in the history vector; messages are never
/// edited after being appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
