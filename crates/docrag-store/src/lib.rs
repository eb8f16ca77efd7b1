//! Vector store adapters: Elasticsearch over its REST API, plus an in-process
//! store with the same contract.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::{debug, info, warn};

use docrag_core::config::StoreConfig;
use docrag_core::traits::{Embedder, VectorStore};
use docrag_core::types::{DocumentChunk, SearchResult};
use docrag_core::{Error, Result};

pub mod memory;
pub mod schema;
pub mod search;
pub mod similarity;
pub mod table;
pub mod writer;

pub use memory::MemoryStore;

use table::{backend, check};

/// Elasticsearch-backed store. A value only exists once the cluster answered
/// and the index is in place.
pub struct ElasticStore {
    http: Client,
    base_url: String,
    index_name: String,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl ElasticStore {
    /// Pings the cluster up to `connect_attempts` times, then makes sure the
    /// index exists. Running out of attempts is `Error::StoreUnavailable`.
    pub async fn connect(config: &StoreConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Configuration(format!("cannot build HTTP client: {e}")))?;
        let store = Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            index_name: config.index_name.clone(),
            embedder,
            batch_size: config.bulk_batch_size.max(1),
        };
        store.wait_until_reachable(config.connect_attempts, Duration::from_secs(config.retry_interval_secs)).await?;
        if let Err(e) = table::ensure_index(&store.http, &store.base_url, &store.index_name, store.embedder.dim()).await {
            warn!(index = %store.index_name, error = %e, "could not create index");
        }
        Ok(store)
    }

    async fn wait_until_reachable(&self, attempts: u32, interval: Duration) -> Result<()> {
        let attempts = attempts.max(1);
        let mut reason = String::new();
        for attempt in 1..=attempts {
            match table::ping(&self.http, &self.base_url).await {
                Ok(()) => {
                    info!(url = %self.base_url, attempt, "connected to Elasticsearch");
                    return Ok(());
                }
                Err(e) => {
                    warn!(url = %self.base_url, attempt, attempts, error = %e, "Elasticsearch not reachable yet");
                    reason = e;
                }
            }
            if attempt < attempts {
                tokio::time::sleep(interval).await;
            }
        }
        Err(Error::StoreUnavailable { url: self.base_url.clone(), attempts, reason })
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    /// One `_bulk` request; `(stored, failed)` counting chunks that could
    /// not be embedded as failed.
    async fn send_batch(&self, batch: &[DocumentChunk]) -> Result<(usize, usize)> {
        let mut body = String::new();
        let mut unembedded = 0usize;
        for chunk in batch {
            match self.embedder.embed(&chunk.text) {
                Ok(vector) => writer::push_action(&mut body, &self.index_name, chunk, vector)?,
                Err(e) => {
                    warn!(source = chunk.source().unwrap_or_default(), error = %e, "skipping chunk that failed to embed");
                    unembedded += 1;
                }
            }
        }
        if body.is_empty() {
            return Ok((0, unembedded));
        }
        let resp = self
            .http
            .post(format!("{}/_bulk?refresh=wait_for", self.base_url))
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(backend)?;
        let summary: writer::BulkResponse = check(resp).await?.json().await.map_err(backend)?;
        let (stored, rejected) = summary.tally();
        if rejected > 0 {
            warn!(rejected, first_error = summary.first_error().unwrap_or_default(), "bulk items rejected");
        }
        Ok((stored, rejected + unembedded))
    }
}

#[async_trait]
impl VectorStore for ElasticStore {
    fn index_name(&self) -> &str { &self.index_name }

    /// Sends `chunks` in `_bulk` requests of at most `bulk_batch_size`. A
    /// rejected batch counts as failed items and the rest still go out; the
    /// call only errors when nothing was stored and a request failed.
    async fn index(&self, chunks: &[DocumentChunk]) -> Result<usize> {
        if chunks.is_empty() {
            debug!("no chunks to index");
            return Ok(0);
        }
        let mut stored = 0usize;
        let mut failed = 0usize;
        let mut last_error = None;
        for (batch_no, batch) in chunks.chunks(self.batch_size).enumerate() {
            match self.send_batch(batch).await {
                Ok((ok, rejected)) => {
                    stored += ok;
                    failed += rejected;
                }
                Err(e) => {
                    warn!(batch = batch_no, size = batch.len(), error = %e, "bulk batch failed");
                    failed += batch.len();
                    last_error = Some(e);
                }
            }
        }
        info!(index = %self.index_name, stored, failed, "bulk indexing finished");
        match last_error {
            Some(e) if stored == 0 => Err(e),
            _ => Ok(stored),
        }
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".into()));
        }
        let vector = self.embedder.embed(query).map_err(|e| Error::Embedding(e.to_string()))?;
        let resp = self
            .http
            .post(format!("{}/{}/_search", self.base_url, self.index_name))
            .json(&search::script_score_query(&vector, k))
            .send()
            .await
            .map_err(backend)?;
        if resp.status() == StatusCode::NOT_FOUND {
            warn!(index = %self.index_name, "search against missing index");
            return Ok(Vec::new());
        }
        let body: search::SearchResponse = check(resp).await?.json().await.map_err(backend)?;
        let results = body.into_results(k);
        debug!(k, hits = results.len(), "search finished");
        Ok(results)
    }

    async fn delete_all(&self) -> Result<u64> {
        let deleted = table::delete_by_query(&self.http, &self.base_url, &self.index_name, json!({ "match_all": {} })).await?;
        info!(index = %self.index_name, deleted, "cleared index");
        Ok(deleted)
    }

    async fn delete_by_source(&self, source: &str) -> Result<u64> {
        let query = json!({ "term": { "metadata.source": source } });
        let deleted = table::delete_by_query(&self.http, &self.base_url, &self.index_name, query).await?;
        debug!(source, deleted, "removed previous records of source");
        Ok(deleted)
    }

    async fn delete_stale(&self, source: &str, generation: &str) -> Result<u64> {
        let query = json!({
            "bool": {
                "filter": [{ "term": { "metadata.source": source } }],
                "must_not": [{ "term": { "metadata.ingest_generation": generation } }]
            }
        });
        let deleted = table::delete_by_query(&self.http, &self.base_url, &self.index_name, query).await?;
        debug!(source, generation, deleted, "removed records of earlier ingests");
        Ok(deleted)
    }

    async fn count(&self) -> Result<u64> { table::count(&self.http, &self.base_url, &self.index_name).await }
}
