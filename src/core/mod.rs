//! Core domain modules
//!
//! Session state, shared value types and the error taxonomy used across
//! the dispatcher, the stores and the assistant.

pub mod errors;
pub mod session;
pub mod types;

pub use errors::{DispatchError, StoreError};
pub use session::Session;
pub use types::{ChatMessage, Role, SessionStyle};
