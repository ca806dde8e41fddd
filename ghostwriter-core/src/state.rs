use std::sync::Arc;

use ghostwriter_context::load_documents;
use ghostwriter_llm::{LlmService, SystemPrompt};
use ghostwriter_utils::text::format_byte_size;
use tracing::{info, warn};

use crate::config::AppConfig;

/// Read-only state shared by every request handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub system_prompt: SystemPrompt,
    pub llm: LlmService,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(system_prompt: SystemPrompt, llm: LlmService) -> Self {
        Self { system_prompt, llm }
    }

    /// Load the context directory, build the system prompt and the completion
    /// client. Unreadable context files are logged and left out.
    pub async fn initialize(config: AppConfig) -> anyhow::Result<Self> {
        let report = load_documents(&config.context_dir, &config.context_extension).await;
        for failure in &report.failures {
            warn!(error = %failure, "context file left out of the system prompt");
        }

        let system_prompt = SystemPrompt::new(&report.context(), config.grounding);
        let llm = LlmService::new(config.llm)?;

        info!(
            documents = report.documents.len(),
            skipped = report.failures.len(),
            system_prompt = %format_byte_size(system_prompt.len()),
            grounding = system_prompt.policy().as_str(),
            provider = llm.provider_name(),
            model = llm.model(),
            "application state initialized"
        );

        Ok(Self::new(system_prompt, llm))
    }

    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }
}
