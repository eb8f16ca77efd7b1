use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use docrag_core::traits::{Embedder, VectorStore};
use docrag_core::types::{DocumentChunk, Metadata, SearchResult, GENERATION_KEY, SOURCE_KEY};
use docrag_core::{Error, Result};

use crate::similarity::shifted_cosine;

struct Record {
    text: String,
    metadata: Metadata,
    vector: Vec<f32>,
}

impl Record {
    fn meta_str(&self, key: &str) -> Option<&str> { self.metadata.get(key).and_then(|v| v.as_str()) }
}

/// Brute-force store held in memory, for tests and embedding in other
/// programs. Scores like the Elasticsearch script. `calls()` counts the
/// operations that reached the records.
pub struct MemoryStore {
    index_name: String,
    embedder: Arc<dyn Embedder>,
    records: RwLock<Vec<Record>>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new(index_name: impl Into<String>, embedder: Arc<dyn Embedder>) -> Self {
        Self { index_name: index_name.into(), embedder, records: RwLock::new(Vec::new()), calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

    fn touch(&self) { self.calls.fetch_add(1, Ordering::SeqCst); }

    fn remove_where(&self, keep: impl Fn(&Record) -> bool) -> Result<u64> {
        self.touch();
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let before = records.len();
        records.retain(keep);
        Ok((before - records.len()) as u64)
    }
}

fn poisoned() -> Error { Error::Backend("memory store lock poisoned".into()) }

#[async_trait]
impl VectorStore for MemoryStore {
    fn index_name(&self) -> &str { &self.index_name }

    async fn index(&self, chunks: &[DocumentChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }
        self.touch();
        let mut fresh = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            match self.embedder.embed(&chunk.text) {
                Ok(vector) => fresh.push(Record { text: chunk.text.clone(), metadata: chunk.metadata.clone(), vector }),
                Err(e) => tracing::warn!(error = %e, "skipping chunk that failed to embed"),
            }
        }
        let stored = fresh.len();
        self.records.write().map_err(|_| poisoned())?.extend(fresh);
        Ok(stored)
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".into()));
        }
        self.touch();
        let query = self.embedder.embed(query).map_err(|e| Error::Embedding(e.to_string()))?;
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut results: Vec<SearchResult> = records
            .iter()
            .map(|r| SearchResult { text: r.text.clone(), metadata: r.metadata.clone(), score: shifted_cosine(&query, &r.vector) })
            .collect();
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);
        Ok(results)
    }

    async fn delete_all(&self) -> Result<u64> { self.remove_where(|_| false) }

    async fn delete_by_source(&self, source: &str) -> Result<u64> {
        self.remove_where(|r| r.meta_str(SOURCE_KEY) != Some(source))
    }

    async fn delete_stale(&self, source: &str, generation: &str) -> Result<u64> {
        self.remove_where(|r| r.meta_str(SOURCE_KEY) != Some(source) || r.meta_str(GENERATION_KEY) == Some(generation))
    }

    async fn count(&self) -> Result<u64> {
        self.touch();
        Ok(self.records.read().map_err(|_| poisoned())?.len() as u64)
    }
}
