use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use docrag_core::config::OllamaConfig;
use docrag_core::types::ChatMessage;
use docrag_core::{Error, Result};

use crate::http::{check, transport};

const PROVIDER: &str = "ollama";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig, http: Client) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(Error::Configuration("Ollama URL is not set (OLLAMA_URL)".into()));
        }
        if config.model.trim().is_empty() {
            return Err(Error::Configuration("Ollama model is not set (OLLAMA_MODEL)".into()));
        }
        Ok(Self { http, base_url: config.url.trim_end_matches('/').to_string(), model: config.model.clone() })
    }

    pub fn model(&self) -> &str { &self.model }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest { model: &self.model, prompt, stream: false };
        let resp = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| transport(PROVIDER, e))?;
        let body: GenerateResponse =
            check(PROVIDER, resp).await?.json().await.map_err(|e| transport(PROVIDER, e))?;
        debug!(model = %self.model, chars = body.response.len(), "ollama answered");
        Ok(body.response)
    }

    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest { model: &self.model, messages, stream: false };
        let resp = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| transport(PROVIDER, e))?;
        let body: ChatResponse = check(PROVIDER, resp).await?.json().await.map_err(|e| transport(PROVIDER, e))?;
        Ok(body.message.content)
    }
}
