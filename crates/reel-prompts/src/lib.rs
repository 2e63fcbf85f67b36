//! Video prompt generation through a chat-completions LLM.

pub mod client;
pub mod error;
pub mod prompt;
pub mod types;

pub use client::{GrokClient, GrokConfig, PromptSource};
pub use error::{PromptError, PromptResult};
pub use prompt::{build_user_message, extract_json_block, parse_ideas, SYSTEM_PROMPT};
pub use types::{PromptBrief, PromptIdea};
