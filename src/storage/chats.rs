//! Saved conversations kept as JSON snapshots

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{
    derive_title, format_timestamp, has_extension, rank_index, remove_if_present,
    sanitize_title, sort_by_recency, stem_of, unique_path, RecordEntry,
};
use crate::core::errors::StoreError;
use crate::core::types::{ChatMessage, Role, SessionStyle};

const EXTENSION: &str = "json";
pub const PLACEHOLDER: &str = "Chat senza titolo";

/// On-disk chat snapshot; each file is readable on its own
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub style: SessionStyle,
    pub title: String,
    pub history: Vec<ChatMessage>,
    pub saved_at: DateTime<Local>,
}

impl ChatRecord {
    /// Most recent assistant reply
    pub fn last_reply(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }
}

/// A record together with its file name
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChat {
    pub name: String,
    pub record: ChatRecord,
}

/// Chats ordered by the `saved_at` field of each record
pub struct ChatStore {
    dir: PathBuf,
}

impl ChatStore {
    /// Open the store, creating its directory when missing
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{EXTENSION}"))
    }

    /// Snapshot `history` and return the record name
    ///
    /// Without a title, one is derived from the most recent user message.
    pub fn save(
        &self,
        style: SessionStyle,
        history: &[ChatMessage],
        title: Option<&str>,
    ) -> Result<String, StoreError> {
        if history.is_empty() {
            return Err(StoreError::EmptyChat);
        }

        let title = match title.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => t.to_string(),
            None => history
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
                .map(|m| derive_title(&m.content))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        };

        let stem = sanitize_title(&title, PLACEHOLDER);
        let (name, path) = unique_path(&self.dir, &stem, EXTENSION);

        let record = ChatRecord {
            style,
            title,
            history: history.to_vec(),
            saved_at: Local::now(),
        };
        let content = serde_json::to_string_pretty(&record).map_err(|e| StoreError::Parse {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        std::fs::write(&path, content)?;

        tracing::info!("Chat saved to {}", path.display());
        Ok(name)
    }

    /// Decode the record called `name`
    pub fn load(&self, name: &str) -> Result<ChatRecord, StoreError> {
        let content = match std::fs::read_to_string(self.path_for(name)) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content).map_err(|e| StoreError::Parse {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    /// All readable chats, most recent first
    ///
    /// Records that fail to decode are logged and left out.
    pub fn list(&self) -> Result<Vec<RecordEntry>, StoreError> {
        let mut entries = Vec::new();

        for entry in std::fs::read_dir(&self.dir)?.flatten() {
            let path = entry.path();
            if !has_extension(&path, EXTENSION) {
                continue;
            }
            let Some(name) = stem_of(&path) else {
                continue;
            };
            match self.load(&name) {
                Ok(record) => entries.push(RecordEntry {
                    name,
                    saved_at: record.saved_at,
                    style: Some(record.style),
                }),
                Err(e) => tracing::error!("Skipping chat {}: {}", path.display(), e),
            }
        }

        sort_by_recency(&mut entries);
        Ok(entries)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.list()?.len())
    }

    /// Chat at 1-based recency `rank`
    pub fn get_by_number(&self, rank: usize) -> Result<StoredChat, StoreError> {
        let entries = self.list()?;
        let index = rank_index(rank, entries.len())?;
        let name = entries[index].name.clone();
        let record = self.load(&name)?;
        Ok(StoredChat { name, record })
    }

    /// Delete by name; `false` when it was already gone
    pub fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let removed = remove_if_present(&self.path_for(name))?;
        if removed {
            tracing::info!("Chat {} deleted", name);
        } else {
            tracing::warn!("Chat {} not found", name);
        }
        Ok(removed)
    }

    /// Delete the chat at `rank` and return its name
    pub fn delete_by_number(&self, rank: usize) -> Result<String, StoreError> {
        let entries = self.list()?;
        let index = rank_index(rank, entries.len())?;
        let name = entries[index].name.clone();
        if !self.delete(&name)? {
            return Err(StoreError::NotFound(name));
        }
        Ok(name)
    }

    /// Numbered listing for speech, with style names
    pub fn format_listing(&self) -> Result<String, StoreError> {
        let entries = self.list()?;
        if entries.is_empty() {
            return Ok("Non ci sono chat salvate.".to_string());
        }

        let mut lines = vec!["Ecco le chat salvate, dalla più recente:".to_string()];
        for (i, entry) in entries.iter().enumerate() {
            let style = entry.style.map_or("", |s| s.spoken_name());
            lines.push(format!(
                "Numero {}: {}, {}, salvata il {}",
                i + 1,
                entry.name,
                style,
                format_timestamp(&entry.saved_at)
            ));
        }
        Ok(lines.join(" ... "))
    }
}
