//! Domain types shared by the loader, the store adapters and the RAG service.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chunk metadata. Always carries `source`; PDF pages add `page`.
pub type Metadata = BTreeMap<String, Value>;

pub const SOURCE_KEY: &str = "source";
pub const PAGE_KEY: &str = "page";
/// Tags every record written by one ingest run of a source.
pub const GENERATION_KEY: &str = "ingest_generation";

/// A bounded-length segment of a source document.
///
/// - `text`: non-empty payload, at most `chunk_size` characters
/// - `metadata`: origin of the chunk, keyed at least by `source`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub text: String,
    pub metadata: Metadata,
}

impl DocumentChunk {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(SOURCE_KEY.to_string(), Value::String(source.into()));
        Self { text: text.into(), metadata }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn source(&self) -> Option<&str> { source_of(&self.metadata) }
}

/// One hit of a similarity search.
///
/// `score` is cosine similarity shifted by +1.0, so it lies in `[0, 2]` and
/// higher is always better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub text: String,
    pub metadata: Metadata,
    pub score: f32,
}

impl SearchResult {
    pub fn source(&self) -> Option<&str> { source_of(&self.metadata) }
}

fn source_of(metadata: &Metadata) -> Option<&str> {
    metadata.get(SOURCE_KEY).and_then(Value::as_str)
}

/// How a query was resolved. Lets callers tell "nothing matched" apart from
/// "the backend call failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Answered,
    EmptyQuery,
    NoMatches,
    StoreUnavailable,
    GenerationFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    /// Retrieved passages, most relevant first.
    pub context: Vec<String>,
    /// Distinct `source` values of the retrieved passages in first-seen order.
    pub sources: Vec<String>,
    pub status: QueryStatus,
}

impl QueryResponse {
    pub fn canned(answer: impl Into<String>, status: QueryStatus) -> Self {
        Self { answer: answer.into(), context: Vec::new(), sources: Vec::new(), status }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self { Self { role: Role::User, content: content.into() } }
    pub fn assistant(content: impl Into<String>) -> Self { Self { role: Role::Assistant, content: content.into() } }
    pub fn system(content: impl Into<String>) -> Self { Self { role: Role::System, content: content.into() } }
}

/// Which generation backend the service runs against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    #[serde(alias = "Gemini", alias = "GEMINI")]
    Gemini,
    #[serde(alias = "Ollama", alias = "OLLAMA")]
    Ollama,
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => f.write_str("gemini"),
            Self::Ollama => f.write_str("ollama"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub document_count: u64,
    pub index_name: String,
    pub llm_provider: LlmProvider,
}
