//! Clipboard channel
//!
//! Carries the user's prompt or a record number in, and the reply text out.
//! Last writer wins; the dispatcher re-checks content before acting on it.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::errors::DispatchError;

pub trait Clipboard {
    /// Current text; an empty or non-text clipboard reads as ""
    fn get_text(&self) -> Result<String, DispatchError>;

    fn set_text(&self, text: &str) -> Result<(), DispatchError>;
}

/// System clipboard via `arboard`
pub struct SystemClipboard {
    clipboard: Mutex<arboard::Clipboard>,
}

impl SystemClipboard {
    /// Returns an error if clipboard access is not available
    pub fn new() -> Result<Self, DispatchError> {
        let clipboard =
            arboard::Clipboard::new().map_err(|e| DispatchError::Clipboard(e.to_string()))?;
        Ok(Self {
            clipboard: Mutex::new(clipboard),
        })
    }

    fn lock(&self) -> MutexGuard<'_, arboard::Clipboard> {
        self.clipboard.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clipboard for SystemClipboard {
    fn get_text(&self) -> Result<String, DispatchError> {
        match self.lock().get_text() {
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(DispatchError::Clipboard(e.to_string())),
        }
    }

    fn set_text(&self, text: &str) -> Result<(), DispatchError> {
        self.lock()
            .set_text(text.to_string())
            .map_err(|e| DispatchError::Clipboard(e.to_string()))
    }
}

/// In-process clipboard; clones share the same buffer
#[derive(Clone, Default)]
pub struct MemoryClipboard {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    text: String,
    writes: Vec<String>,
    unreadable: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Simulate the input device putting `text` on the clipboard
    pub fn put(&self, text: impl Into<String>) {
        self.lock().text = text.into();
    }

    pub fn contents(&self) -> String {
        self.lock().text.clone()
    }

    /// Make every later read fail until switched back
    pub fn set_unreadable(&self, unreadable: bool) {
        self.lock().unreadable = unreadable;
    }

    /// Every text written through [`Clipboard::set_text`], oldest first
    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn get_text(&self) -> Result<String, DispatchError> {
        let state = self.lock();
        if state.unreadable {
            return Err(DispatchError::Clipboard("clipboard unavailable".into()));
        }
        Ok(state.text.clone())
    }

    fn set_text(&self, text: &str) -> Result<(), DispatchError> {
        let mut state = self.lock();
        state.text = text.to_string();
        state.writes.push(text.to_string());
        Ok(())
    }
}
