mod client;
mod openai;
pub mod prompt;

pub use client::{BackendSettings, LlmService, LlmSettings, UpstreamError};
pub use prompt::{GroundingPolicy, PromptMessage, SystemPrompt, build_prompt, default_question};
