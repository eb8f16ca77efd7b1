use std::sync::Arc;

use tracing::info;

use docrag_core::traits::{Embedder, Generator, VectorStore};
use docrag_core::{Config, DocumentLoader, Error, Result, TextSplitter};
use docrag_embed::get_default_embedder;
use docrag_llm::create_generator;
use docrag_store::ElasticStore;

use crate::pipeline::IndexingPipeline;
use crate::service::RagService;

/// Embedder, store and pipeline. Enough for indexing and clearing; needs no
/// generation credentials.
pub struct IngestContext {
    pub config: Config,
    pub embedder: Arc<dyn Embedder>,
    pub store: Arc<dyn VectorStore>,
    pub pipeline: Arc<IndexingPipeline>,
}

impl IngestContext {
    pub async fn initialize(config: Config) -> Result<Self> {
        let embedder = get_default_embedder(&config.embedding).map_err(|e| Error::Embedding(e.to_string()))?;
        let store: Arc<dyn VectorStore> = Arc::new(ElasticStore::connect(&config.store, embedder.clone()).await?);
        Self::from_parts(config, embedder, store)
    }

    pub fn from_parts(config: Config, embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Result<Self> {
        let splitter = TextSplitter::from_config(&config.chunking)?;
        let pipeline = Arc::new(IndexingPipeline::new(DocumentLoader::new(splitter), store.clone(), config.documents_dir()));
        Ok(Self { config, embedder, store, pipeline })
    }
}

/// Long-lived adapters, built once at startup and shared by handle.
pub struct AppContext {
    pub config: Config,
    pub embedder: Arc<dyn Embedder>,
    pub store: Arc<dyn VectorStore>,
    pub generator: Arc<dyn Generator>,
    pub pipeline: Arc<IndexingPipeline>,
    pub service: Arc<RagService>,
}

impl AppContext {
    /// Validates generation settings before waiting on the store, so a
    /// missing key fails without the connection retries.
    pub async fn initialize(config: Config) -> Result<Self> {
        let generator = create_generator(&config.llm)?;
        let ingest = IngestContext::initialize(config).await?;
        Ok(Self::with_generator(ingest, generator))
    }

    pub fn from_parts(
        config: Config,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        Ok(Self::with_generator(IngestContext::from_parts(config, embedder, store)?, generator))
    }

    fn with_generator(ingest: IngestContext, generator: Arc<dyn Generator>) -> Self {
        let IngestContext { config, embedder, store, pipeline } = ingest;
        let service = Arc::new(RagService::new(store.clone(), generator.clone()).with_top_k(config.rag.top_k));
        info!(
            index = store.index_name(),
            provider = %generator.provider(),
            embedding_dim = embedder.dim(),
            "application context ready"
        );
        Self { config, embedder, store, generator, pipeline, service }
    }
}
