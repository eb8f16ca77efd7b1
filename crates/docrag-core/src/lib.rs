//! Shared building blocks: data model, error taxonomy, configuration,
//! the recursive text splitter and the document loader.

pub mod chunker;
pub mod config;
pub mod error;
pub mod loader;
pub mod traits;
pub mod types;

pub use chunker::TextSplitter;
pub use config::Config;
pub use error::{Error, Result};
pub use loader::{DirectoryScan, DocumentLoader};
pub use types::{ChatMessage, DocumentChunk, QueryResponse, QueryStatus, Role, SearchResult};
