//! Marker vocabulary
//!
//! A marker is a zero-byte file in the communication directory; its name
//! selects the action. The declaration order below is the priority order
//! the dispatcher scans in.

use std::path::{Path, PathBuf};

use crate::core::types::SessionStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    CleanHistory,
    ProcessClipboard,
    ModeChat,
    ModeExplore,
    ModeTranslate,
    ModeWrite,
    ModeCreate,
    TtsPause,
    TtsResume,
    TtsStop,
    TtsRestart,
    Retry,
    PrintArtifact,
    ListArtifact,
    ReadArtifact,
    ResumeCreativeArtifact,
    ResumeArticleArtifact,
    DeleteArtifact,
    SaveChat,
    ListChats,
    ReadChat,
    ResumeChat,
    DeleteChat,
    PrepareMessage,
}

impl Marker {
    /// Every marker in priority order
    pub const ALL: [Marker; 24] = [
        Marker::CleanHistory,
        Marker::ProcessClipboard,
        Marker::ModeChat,
        Marker::ModeExplore,
        Marker::ModeTranslate,
        Marker::ModeWrite,
        Marker::ModeCreate,
        Marker::TtsPause,
        Marker::TtsResume,
        Marker::TtsStop,
        Marker::TtsRestart,
        Marker::Retry,
        Marker::PrintArtifact,
        Marker::ListArtifact,
        Marker::ReadArtifact,
        Marker::ResumeCreativeArtifact,
        Marker::ResumeArticleArtifact,
        Marker::DeleteArtifact,
        Marker::SaveChat,
        Marker::ListChats,
        Marker::ReadChat,
        Marker::ResumeChat,
        Marker::DeleteChat,
        Marker::PrepareMessage,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Marker::CleanHistory => "clean_history",
            Marker::ProcessClipboard => "process_clipboard",
            Marker::ModeChat => "mode_chat",
            Marker::ModeExplore => "mode_explore",
            Marker::ModeTranslate => "mode_translate",
            Marker::ModeWrite => "mode_write",
            Marker::ModeCreate => "mode_create",
            Marker::TtsPause => "tts_pause",
            Marker::TtsResume => "tts_resume",
            Marker::TtsStop => "tts_stop",
            Marker::TtsRestart => "tts_restart",
            Marker::Retry => "retry",
            Marker::PrintArtifact => "print_artifact",
            Marker::ListArtifact => "list_artifact",
            Marker::ReadArtifact => "read_artifact",
            Marker::ResumeCreativeArtifact => "resume_creative_artifact",
            Marker::ResumeArticleArtifact => "resume_article_artifact",
            Marker::DeleteArtifact => "delete_artifact",
            Marker::SaveChat => "save_chat",
            Marker::ListChats => "list_chats",
            Marker::ReadChat => "read_chat",
            Marker::ResumeChat => "resume_chat",
            Marker::DeleteChat => "delete_chat",
            Marker::PrepareMessage => "prepare_message",
        }
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }

    pub fn from_file_name(name: &str) -> Option<Marker> {
        Self::ALL.into_iter().find(|m| m.file_name() == name)
    }

    /// Target style of a mode-switch marker
    pub fn target_style(&self) -> Option<SessionStyle> {
        match self {
            Marker::ModeChat => Some(SessionStyle::Chat),
            Marker::ModeExplore => Some(SessionStyle::Exploration),
            Marker::ModeTranslate => Some(SessionStyle::Translation),
            Marker::ModeWrite => Some(SessionStyle::ArticleWriting),
            Marker::ModeCreate => Some(SessionStyle::CreativeWriting),
            _ => None,
        }
    }

    /// Whether the handler reads a record number from the clipboard
    pub fn takes_number(&self) -> bool {
        matches!(
            self,
            Marker::ReadArtifact
                | Marker::ResumeCreativeArtifact
                | Marker::ResumeArticleArtifact
                | Marker::DeleteArtifact
                | Marker::ReadChat
                | Marker::ResumeChat
                | Marker::DeleteChat
        )
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}
