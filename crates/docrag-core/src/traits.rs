use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChatMessage, DocumentChunk, LlmProvider, SearchResult};

/// Text to dense vector. Must be deterministic for identical input so query
/// and document vectors share one space.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// A named index of embedded chunks.
#[async_trait]
pub trait VectorStore: Send + Sync {
    fn index_name(&self) -> &str;

    /// Embeds and inserts `chunks`, returning how many records were stored.
    /// An empty slice returns 0 without touching the backend.
    async fn index(&self, chunks: &[DocumentChunk]) -> Result<usize>;

    /// Top `k` records by descending shifted-cosine score.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>>;

    /// Removes every record but keeps the index definition.
    async fn delete_all(&self) -> Result<u64>;

    /// Removes the records whose `metadata.source` equals `source`.
    async fn delete_by_source(&self, source: &str) -> Result<u64>;

    /// Removes the records of `source` not tagged with `generation`, i.e.
    /// what an earlier ingest of the same source left behind.
    async fn delete_stale(&self, source: &str, generation: &str) -> Result<u64>;

    async fn count(&self) -> Result<u64>;
}

/// Text generation, with or without retrieved context.
#[async_trait]
pub trait Generator: Send + Sync {
    fn provider(&self) -> LlmProvider;

    async fn generate_response(&self, query: &str, context: &[SearchResult]) -> Result<String>;

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;
}
