#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docrag_core::traits::{Generator, VectorStore};
use docrag_core::types::{ChatMessage, DocumentChunk, LlmProvider, SearchResult};
use docrag_core::{DocumentLoader, Error, Result, TextSplitter};
use docrag_embed::FakeEmbedder;
use docrag_store::MemoryStore;

pub fn memory_store() -> Arc<MemoryStore> { Arc::new(MemoryStore::new("test_index", Arc::new(FakeEmbedder::new(128)))) }

pub fn loader() -> DocumentLoader { DocumentLoader::new(TextSplitter::new(200, 20).unwrap()) }

/// Generator that records what it was asked and answers from a script.
#[derive(Default)]
pub struct ScriptedGenerator {
    pub fail: bool,
    calls: AtomicUsize,
    last_context: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn failing() -> Self { Self { fail: true, ..Self::default() } }
    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
    pub fn last_context(&self) -> Vec<String> { self.last_context.lock().unwrap().clone() }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn provider(&self) -> LlmProvider { LlmProvider::Ollama }

    async fn generate_response(&self, query: &str, context: &[SearchResult]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_context.lock().unwrap() = context.iter().map(|r| r.text.clone()).collect();
        if self.fail {
            return Err(Error::Generation("model offline".into()));
        }
        Ok(format!("answer to: {query}"))
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Generation("model offline".into()));
        }
        Ok(format!("reply after {} messages", messages.len()))
    }
}

/// Store whose backend is always down.
pub struct DownStore;

#[async_trait]
impl VectorStore for DownStore {
    fn index_name(&self) -> &str { "down" }
    async fn index(&self, _chunks: &[DocumentChunk]) -> Result<usize> { Err(Error::Backend("connection refused".into())) }
    async fn search(&self, _query: &str, _k: usize) -> Result<Vec<SearchResult>> {
        Err(Error::Backend("connection refused".into()))
    }
    async fn delete_all(&self) -> Result<u64> { Err(Error::Backend("connection refused".into())) }
    async fn delete_by_source(&self, _source: &str) -> Result<u64> { Err(Error::Backend("connection refused".into())) }
    async fn delete_stale(&self, _source: &str, _generation: &str) -> Result<u64> {
        Err(Error::Backend("connection refused".into()))
    }
    async fn count(&self) -> Result<u64> { Err(Error::Backend("connection refused".into())) }
}

/// In-memory store whose writes can be switched off mid-test.
pub struct FlakyStore {
    pub inner: Arc<MemoryStore>,
    fail_index: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self { Self { inner: memory_store(), fail_index: AtomicBool::new(false) } }
    pub fn fail_writes(&self) { self.fail_index.store(true, Ordering::SeqCst); }
}

#[async_trait]
impl VectorStore for FlakyStore {
    fn index_name(&self) -> &str { self.inner.index_name() }
    async fn index(&self, chunks: &[DocumentChunk]) -> Result<usize> {
        if self.fail_index.load(Ordering::SeqCst) {
            return Err(Error::Backend("bulk request rejected".into()));
        }
        self.inner.index(chunks).await
    }
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> { self.inner.search(query, k).await }
    async fn delete_all(&self) -> Result<u64> { self.inner.delete_all().await }
    async fn delete_by_source(&self, source: &str) -> Result<u64> { self.inner.delete_by_source(source).await }
    async fn delete_stale(&self, source: &str, generation: &str) -> Result<u64> {
        self.inner.delete_stale(source, generation).await
    }
    async fn count(&self) -> Result<u64> { self.inner.count().await }
}
