//! Answer generation against a hosted (Gemini) or local (Ollama) model.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use docrag_core::config::LlmConfig;
use docrag_core::traits::Generator;
use docrag_core::types::{ChatMessage, LlmProvider, SearchResult};
use docrag_core::Result;

pub mod gemini;
mod http;
pub mod ollama;
pub mod prompt;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use prompt::build_rag_prompt;

/// The configured backend, fixed for the lifetime of the value.
pub enum LlmBackend {
    Gemini(GeminiClient),
    Ollama(OllamaClient),
}

impl LlmBackend {
    /// Fails with `Error::Configuration` when the selected provider lacks its
    /// key, URL or model.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let http = http::client(config.request_timeout_secs)?;
        let backend = match config.provider {
            LlmProvider::Gemini => Self::Gemini(GeminiClient::new(&config.gemini, http)?),
            LlmProvider::Ollama => Self::Ollama(OllamaClient::new(&config.ollama, http)?),
        };
        info!(provider = %backend.provider(), model = backend.model(), "generation backend ready");
        Ok(backend)
    }

    pub fn model(&self) -> &str {
        match self {
            Self::Gemini(client) => client.model(),
            Self::Ollama(client) => client.model(),
        }
    }
}

#[async_trait]
impl Generator for LlmBackend {
    fn provider(&self) -> LlmProvider {
        match self {
            Self::Gemini(_) => LlmProvider::Gemini,
            Self::Ollama(_) => LlmProvider::Ollama,
        }
    }

    async fn generate_response(&self, query: &str, context: &[SearchResult]) -> Result<String> {
        let prompt = build_rag_prompt(query, context);
        match self {
            Self::Gemini(client) => client.generate(&gemini::GenerateRequest::prompt(&prompt)).await,
            Self::Ollama(client) => client.generate(&prompt).await,
        }
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        match self {
            Self::Gemini(client) => client.generate(&gemini::GenerateRequest::conversation(messages)).await,
            Self::Ollama(client) => client.chat(messages).await,
        }
    }
}

pub fn create_generator(config: &LlmConfig) -> Result<Arc<dyn Generator>> {
    Ok(Arc::new(LlmBackend::from_config(config)?))
}
