//! Prompt framing, context bounding and reply validation

pub mod context;
mod orchestrator;
pub mod prompts;
pub mod response;

pub use orchestrator::{Orchestrator, Reply};
pub use prompts::{PromptBuilder, TranslationExample};
pub use response::APOLOGY;
