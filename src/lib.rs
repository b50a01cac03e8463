//! aacbridge: clipboard and marker-file bridge between an AAC keyboard and an AI assistant
//!
//! This library provides:
//! - A polling dispatcher that turns marker files into actions
//! - Session state with per-style model settings
//! - Prompt building, reply parsing and validation around a Claude provider
//! - File-backed artifact and chat stores addressed by recency rank
//! - Clipboard, speech and notification channels with in-memory doubles

pub mod agent;
pub mod channels;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod llm;
pub mod storage;
pub mod transport;

pub use config::Config;
pub use dispatch::{Backend, Dispatcher, Marker};
