//! Ingestion and question answering over the vector store.

pub mod context;
pub mod pipeline;
pub mod service;

pub use context::{AppContext, IngestContext};
pub use pipeline::IndexingPipeline;
pub use service::RagService;
