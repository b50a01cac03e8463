//! Outbound and inbound channels shared with the input device
//!
//! The clipboard carries text both ways, speech reads results aloud and the
//! notifier tells the device that fresh text is waiting.

pub mod clipboard;
pub mod notify;
pub mod speech;

pub use clipboard::{Clipboard, MemoryClipboard, SystemClipboard};
pub use notify::{CommandNotifier, CountingNotifier, NoopNotifier, Notifier};
pub use speech::{CommandSpeech, LogSpeech, RecordingSpeech, Speech, SpeechEvent};
