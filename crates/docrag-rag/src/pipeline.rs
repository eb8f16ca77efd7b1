use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{error, info, warn};

use docrag_core::loader::DocumentFormat;
use docrag_core::traits::VectorStore;
use docrag_core::types::{DocumentChunk, GENERATION_KEY};
use docrag_core::{DocumentLoader, Result};

/// Load, chunk and store documents. Every entry point absorbs failures: they
/// are logged and reported as 0 / `None`.
pub struct IndexingPipeline {
    loader: DocumentLoader,
    store: Arc<dyn VectorStore>,
    documents_dir: PathBuf,
}

impl IndexingPipeline {
    pub fn new(loader: DocumentLoader, store: Arc<dyn VectorStore>, documents_dir: impl Into<PathBuf>) -> Self {
        Self { loader, store, documents_dir: documents_dir.into() }
    }

    pub fn documents_dir(&self) -> &Path { &self.documents_dir }

    /// Indexes one file. Records from an earlier ingest of it are removed
    /// once every new chunk is stored.
    pub async fn index_file(&self, path: &Path) -> usize {
        match self.try_index_file(path).await {
            Ok(stored) => {
                info!(path = %path.display(), stored, "indexed file");
                stored
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to index file");
                0
            }
        }
    }

    async fn try_index_file(&self, path: &Path) -> Result<usize> {
        let generation = next_generation();
        let chunks = tag_generation(self.loader.load(path)?, &generation);
        let stored = self.store.index(&chunks).await?;
        self.retire_stale(&[path.to_path_buf()], &generation, stored, chunks.len()).await;
        Ok(stored)
    }

    /// Indexes every supported file under `dir` (default: the documents
    /// directory) in one bulk call. Unreadable files are skipped.
    pub async fn index_directory(&self, dir: Option<&Path>) -> usize {
        let dir = dir.unwrap_or(&self.documents_dir);
        match self.try_index_directory(dir).await {
            Ok(stored) => {
                info!(dir = %dir.display(), stored, "indexed directory");
                stored
            }
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "failed to index directory");
                0
            }
        }
    }

    async fn try_index_directory(&self, dir: &Path) -> Result<usize> {
        let scan = self.loader.scan_directory(dir)?;
        let generation = next_generation();
        let chunks = tag_generation(scan.chunks, &generation);
        let stored = self.store.index(&chunks).await?;
        self.retire_stale(&scan.loaded, &generation, stored, chunks.len()).await;
        Ok(stored)
    }

    /// Drops what earlier ingests of `sources` left behind. Skipped unless the
    /// whole new generation landed, so a failed ingest leaves the index as it was.
    async fn retire_stale(&self, sources: &[PathBuf], generation: &str, stored: usize, expected: usize) {
        if stored < expected {
            warn!(stored, expected, "ingest incomplete, keeping previously indexed chunks");
            return;
        }
        for path in sources {
            let source = path.to_string_lossy();
            match self.store.delete_stale(&source, generation).await {
                Ok(0) => {}
                Ok(removed) => info!(source = %source, removed, "replaced previously indexed chunks"),
                Err(e) => warn!(source = %source, error = %e, "could not remove earlier chunks"),
            }
        }
    }

    /// Empties the index; the index definition stays.
    pub async fn clear_index(&self) -> u64 {
        match self.store.delete_all().await {
            Ok(deleted) => deleted,
            Err(e) => {
                error!(error = %e, "failed to clear index");
                0
            }
        }
    }

    pub async fn document_count(&self) -> u64 {
        match self.store.count().await {
            Ok(count) => count,
            Err(e) => {
                error!(error = %e, "failed to count documents");
                0
            }
        }
    }

    /// Writes `bytes` into the documents directory under the final component
    /// of `name`, then indexes it. `None` when nothing was written; an
    /// indexing failure after a successful write still returns the path.
    pub async fn save_uploaded_file(&self, bytes: &[u8], name: &str) -> Option<PathBuf> {
        let Some(file_name) = Path::new(name).file_name() else {
            warn!(name, "rejecting upload without a usable file name");
            return None;
        };
        let target = self.documents_dir.join(file_name);
        if DocumentFormat::from_path(&target).is_none() {
            warn!(name, "rejecting upload with unsupported file type");
            return None;
        }
        if let Err(e) = fs::create_dir_all(&self.documents_dir).and_then(|()| fs::write(&target, bytes)) {
            error!(path = %target.display(), error = %e, "failed to save upload");
            return None;
        }
        info!(path = %target.display(), bytes = bytes.len(), "saved upload");
        if self.index_file(&target).await == 0 {
            warn!(path = %target.display(), "upload saved but nothing was indexed");
        }
        Some(target)
    }
}

/// Unique per ingest run within and across processes.
fn next_generation() -> String {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_nanos());
    format!("{nanos:x}-{}-{}", std::process::id(), SEQ.fetch_add(1, Ordering::Relaxed))
}

fn tag_generation(mut chunks: Vec<DocumentChunk>, generation: &str) -> Vec<DocumentChunk> {
    for chunk in &mut chunks {
        chunk.metadata.insert(GENERATION_KEY.to_string(), generation.into());
    }
    chunks
}
