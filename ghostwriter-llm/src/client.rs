use std::time::Duration;

use anyhow::Context as _;
use ghostwriter_utils::env::{
    ConfigurationError, ProcessEnv, VarSource, env_string, env_string_or, env_u16, env_u64,
    require_env,
};
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, request::ChatMessageRequest},
};
use reqwest::Url;
use tracing::debug;

use crate::openai::OpenAiBackend;
use crate::prompt::{PromptMessage, Role};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OLLAMA_HOST: &str = "http://127.0.0.1";
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// The completion call failed. The request fails as a whole; nothing is
/// retried.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("completion request could not be sent: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("completion service answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("completion response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("completion response had no text")]
    EmptyResponse,
    #[error("ollama chat request failed: {0}")]
    Ollama(String),
    #[error("completion service did not answer within {}s", .0.as_secs_f32())]
    Timeout(Duration),
}

impl UpstreamError {
    /// HTTP status returned by the service, when it got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendSettings {
    OpenAi { api_key: String, base_url: String },
    Ollama { host: String, port: u16 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LlmSettings {
    pub backend: BackendSettings,
    pub model: String,
    pub timeout: Duration,
}

impl LlmSettings {
    /// Read `LLM_PROVIDER` and the matching backend variables. The OpenAI
    /// backend refuses to start without `OPENAI_API_KEY`.
    pub fn from_source(source: &impl VarSource) -> Result<Self, ConfigurationError> {
        let provider = env_string_or(source, "LLM_PROVIDER", "openai").to_ascii_lowercase();
        let timeout_secs = env_u64(
            source,
            "UPSTREAM_TIMEOUT_SECS",
            DEFAULT_UPSTREAM_TIMEOUT.as_secs(),
        )?;
        if timeout_secs == 0 {
            return Err(ConfigurationError::Invalid {
                key: "UPSTREAM_TIMEOUT_SECS".to_owned(),
                value: timeout_secs.to_string(),
                expected: "a positive number of seconds",
            });
        }
        let timeout = Duration::from_secs(timeout_secs);

        match provider.as_str() {
            "openai" => {
                let api_key = require_env(source, "OPENAI_API_KEY")?;
                let base_url = env_string_or(source, "OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL);
                validate_url(source, "OPENAI_BASE_URL", &base_url)?;

                Ok(Self {
                    backend: BackendSettings::OpenAi { api_key, base_url },
                    model: env_string_or(source, "OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
                    timeout,
                })
            }
            "ollama" => {
                let host = env_string_or(source, "OLLAMA_HOST", DEFAULT_OLLAMA_HOST);
                validate_url(source, "OLLAMA_HOST", &host)?;

                Ok(Self {
                    backend: BackendSettings::Ollama {
                        host,
                        port: env_u16(source, "OLLAMA_PORT", DEFAULT_OLLAMA_PORT)?,
                    },
                    model: env_string_or(source, "OLLAMA_MODEL", DEFAULT_OLLAMA_MODEL),
                    timeout,
                })
            }
            _ => Err(ConfigurationError::Invalid {
                key: "LLM_PROVIDER".to_owned(),
                value: provider,
                expected: "`openai` or `ollama`",
            }),
        }
    }

    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_source(&ProcessEnv)
    }
}

fn validate_url(
    source: &impl VarSource,
    key: &str,
    value: &str,
) -> Result<(), ConfigurationError> {
    // Only complain about values the operator actually set.
    if env_string(source, key).is_none() {
        return Ok(());
    }

    parse_http_url(value)
        .map(|_| ())
        .ok_or_else(|| ConfigurationError::Invalid {
            key: key.to_owned(),
            value: value.to_owned(),
            expected: "an absolute http(s) URL",
        })
}

/// `localhost:11434` parses as a URL with scheme `localhost`; only accept
/// http(s) with a host.
fn parse_http_url(value: &str) -> Option<Url> {
    Url::parse(value)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}

#[derive(Clone, Debug)]
enum CompletionBackend {
    OpenAi(OpenAiBackend),
    Ollama(Ollama),
}

/// Handle to the external chat-completion service. Cheap to clone and safe
/// to share between concurrent requests.
#[derive(Clone, Debug)]
pub struct LlmService {
    backend: CompletionBackend,
    model: String,
    timeout: Duration,
}

impl LlmService {
    pub fn new(settings: LlmSettings) -> anyhow::Result<Self> {
        let backend = match settings.backend {
            BackendSettings::OpenAi { api_key, base_url } => {
                let client = reqwest::Client::builder()
                    .build()
                    .context("failed to build completion HTTP client")?;
                CompletionBackend::OpenAi(OpenAiBackend::new(client, api_key, &base_url))
            }
            BackendSettings::Ollama { host, port } => {
                if parse_http_url(&host).is_none() {
                    anyhow::bail!("ollama host `{host}` is not an absolute http(s) URL");
                }
                CompletionBackend::Ollama(Ollama::new(host, port))
            }
        };

        Ok(Self {
            backend,
            model: settings.model,
            timeout: settings.timeout,
        })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(LlmSettings::from_env()?)
    }

    pub fn provider_name(&self) -> &'static str {
        match self.backend {
            CompletionBackend::OpenAi(_) => "openai",
            CompletionBackend::Ollama(_) => "ollama",
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One completion call, bounded by the configured timeout. Returns the
    /// first choice's text.
    pub async fn complete(&self, messages: &[PromptMessage]) -> Result<String, UpstreamError> {
        let prompt_bytes: usize = messages.iter().map(|m| m.content.len()).sum();
        debug!(
            provider = self.provider_name(),
            model = %self.model,
            prompt_bytes,
            "sending completion request"
        );

        let call = async {
            match &self.backend {
                CompletionBackend::OpenAi(backend) => backend.complete(&self.model, messages).await,
                CompletionBackend::Ollama(client) => {
                    complete_with_ollama(client, &self.model, messages).await
                }
            }
        };

        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or(Err(UpstreamError::Timeout(self.timeout)))
    }
}

async fn complete_with_ollama(
    client: &Ollama,
    model: &str,
    messages: &[PromptMessage],
) -> Result<String, UpstreamError> {
    let messages = messages
        .iter()
        .map(|message| match message.role {
            Role::System => ChatMessage::system(message.content.clone()),
            Role::User => ChatMessage::user(message.content.clone()),
        })
        .collect();

    let request = ChatMessageRequest::new(model.to_owned(), messages);
    let response = client
        .send_chat_messages(request)
        .await
        .map_err(|e| UpstreamError::Ollama(e.to_string()))?;

    let content = response.message.content.trim();
    if content.is_empty() {
        return Err(UpstreamError::EmptyResponse);
    }

    Ok(content.to_owned())
}
