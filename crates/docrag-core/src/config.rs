use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::LlmProvider;

/// Flat variable names understood in addition to `APP_*`.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("ELASTICSEARCH_URL", "store.url"),
    ("ELASTICSEARCH_INDEX", "store.index_name"),
    ("LLM_PROVIDER", "llm.provider"),
    ("GEMINI_API_KEY", "llm.gemini.api_key"),
    ("GEMINI_MODEL", "llm.gemini.model"),
    ("OLLAMA_URL", "llm.ollama.url"),
    ("OLLAMA_MODEL", "llm.ollama.model"),
    ("EMBEDDING_MODEL", "embedding.model"),
    ("CHUNK_SIZE", "chunking.chunk_size"),
    ("CHUNK_OVERLAP", "chunking.chunk_overlap"),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub chunking: ChunkingConfig,
    pub data: DataConfig,
    pub rag: RagConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub url: String,
    pub index_name: String,
    pub connect_attempts: u32,
    pub retry_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Chunks per `_bulk` request.
    pub bulk_batch_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".into(),
            index_name: "rag_documents".into(),
            connect_attempts: 10,
            retry_interval_secs: 5,
            request_timeout_secs: 30,
            bulk_batch_size: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub gemini: GeminiConfig,
    pub ollama: OllamaConfig,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            gemini: GeminiConfig::default(),
            ollama: OllamaConfig::default(),
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-pro".into(),
            base_url: "https://generativelanguage.googleapis.com".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self { url: "http://localhost:11434".into(), model: "llama3".into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    /// Directory holding `tokenizer.json`, `config.json` and the weights.
    /// Defaults to `models/<model>`.
    pub model_dir: Option<String>,
    pub dimension: usize,
    pub max_len: usize,
    pub use_fake: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-MiniLM-L6-v2".into(),
            model_dir: None,
            dimension: 384,
            max_len: 256,
            use_fake: false,
        }
    }
}

impl EmbeddingConfig {
    pub fn resolved_model_dir(&self) -> PathBuf {
        match &self.model_dir {
            Some(dir) => expand_path(dir),
            None => PathBuf::from("models").join(&self.model),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, chunk_overlap: 200 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub documents_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { documents_dir: "data/documents".into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> Result<Self> {
        let config: Config = Self::figment_for_env(env_name)
            .extract()
            .map_err(|e| Error::Configuration(e.to_string()))?;
        config.validate()?;
        config.validate_for_env(env_name)?;
        Ok(config)
    }

    /// Defaults < `config.toml` < `config.<env>.toml` < legacy variables < `APP_*`.
    pub fn figment_for_env(env_name: &str) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment.merge(legacy_env()).merge(Env::prefixed("APP_").split("__"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Configuration("chunking.chunk_size must be greater than zero".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Configuration(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.rag.top_k == 0 {
            return Err(Error::Configuration("rag.top_k must be greater than zero".into()));
        }
        if self.store.connect_attempts == 0 {
            return Err(Error::Configuration("store.connect_attempts must be greater than zero".into()));
        }
        if self.store.bulk_batch_size == 0 {
            return Err(Error::Configuration("store.bulk_batch_size must be greater than zero".into()));
        }
        if self.store.index_name.trim().is_empty() {
            return Err(Error::Configuration("store.index_name must not be empty".into()));
        }
        Ok(())
    }

    fn validate_for_env(&self, env_name: &str) -> Result<()> {
        match env_name {
            "prod" | "production" if self.embedding.use_fake => Err(Error::Configuration(
                "embedding.use_fake is not allowed in production".into(),
            )),
            _ => Ok(()),
        }
    }

    pub fn documents_dir(&self) -> PathBuf { expand_path(&self.data.documents_dir) }
}

fn legacy_env() -> Env {
    Env::raw().filter_map(|key| {
        LEGACY_ENV
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, path)| (*path).into())
    })
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
