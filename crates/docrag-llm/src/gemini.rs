use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use docrag_core::config::GeminiConfig;
use docrag_core::types::{ChatMessage, Role};
use docrag_core::{Error, Result};

use crate::http::{check, transport};

const PROVIDER: &str = "gemini";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    fn new(role: Option<&str>, text: impl Into<String>) -> Self {
        Self { role: role.map(str::to_string), parts: vec![Part { text: text.into() }] }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

impl GenerateRequest {
    pub fn prompt(prompt: &str) -> Self {
        Self { contents: vec![Content::new(Some("user"), prompt)], system_instruction: None }
    }

    /// `user -> user`, `assistant -> model`; system messages are merged into
    /// `systemInstruction`.
    pub fn conversation(messages: &[ChatMessage]) -> Self {
        let mut system = Vec::new();
        let mut contents = Vec::new();
        for message in messages {
            match message.role {
                Role::System => system.push(message.content.as_str()),
                Role::User => contents.push(Content::new(Some("user"), message.content.clone())),
                Role::Assistant => contents.push(Content::new(Some("model"), message.content.clone())),
            }
        }
        let system_instruction = (!system.is_empty()).then(|| Content::new(None, system.join("\n\n")));
        Self { contents, system_instruction }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig, http: Client) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Configuration("Gemini API key is not set (GEMINI_API_KEY)".into()))?;
        if config.model.trim().is_empty() {
            return Err(Error::Configuration("Gemini model is not set".into()));
        }
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.to_string(),
        })
    }

    pub fn model(&self) -> &str { &self.model }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| transport(PROVIDER, e))?;
        let body: GenerateResponse =
            check(PROVIDER, resp).await?.json().await.map_err(|e| transport(PROVIDER, e))?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            let feedback = body.prompt_feedback.map(|f| f.to_string()).unwrap_or_else(|| "no candidates".into());
            return Err(Error::Generation(format!("gemini returned no text: {feedback}")));
        }
        debug!(model = %self.model, chars = text.len(), "gemini answered");
        Ok(text)
    }
}
