use std::sync::Arc;

use tracing::{debug, error, info};

use docrag_core::traits::{Generator, VectorStore};
use docrag_core::types::{ChatMessage, IndexStats, QueryResponse, QueryStatus, SearchResult};

pub const EMPTY_QUERY_MESSAGE: &str = "Please ask a question.";
pub const NO_MATCHES_MESSAGE: &str = "I could not find any relevant information to answer your question. \
Try rephrasing it or adding more documents to the knowledge base.";
pub const STORE_UNAVAILABLE_MESSAGE: &str =
    "The document store is currently unavailable, so I could not search your documents. Please try again later.";
pub const GENERATION_FAILED_MESSAGE: &str = "The language model could not produce an answer. Please try again later.";
pub const EMPTY_CHAT_MESSAGE: &str = "Please provide messages for the chat.";

pub const DEFAULT_TOP_K: usize = 5;

/// Answers questions from retrieved passages. Failures come back as plain
/// messages with a matching `QueryStatus`, never as errors.
pub struct RagService {
    store: Arc<dyn VectorStore>,
    generator: Arc<dyn Generator>,
    top_k: usize,
}

impl RagService {
    pub fn new(store: Arc<dyn VectorStore>, generator: Arc<dyn Generator>) -> Self {
        Self { store, generator, top_k: DEFAULT_TOP_K }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn top_k(&self) -> usize { self.top_k }

    pub async fn process_query(&self, query: &str, use_rag: bool) -> QueryResponse {
        let query = query.trim();
        if query.is_empty() {
            return QueryResponse::canned(EMPTY_QUERY_MESSAGE, QueryStatus::EmptyQuery);
        }
        if !use_rag {
            return match self.generator.generate_response(query, &[]).await {
                Ok(answer) => QueryResponse { answer, context: Vec::new(), sources: Vec::new(), status: QueryStatus::Answered },
                Err(e) => generation_failed(e),
            };
        }

        let results = match self.store.search(query, self.top_k).await {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, "search failed");
                return QueryResponse::canned(STORE_UNAVAILABLE_MESSAGE, QueryStatus::StoreUnavailable);
            }
        };
        if results.is_empty() {
            info!("no passages matched the query");
            return QueryResponse::canned(NO_MATCHES_MESSAGE, QueryStatus::NoMatches);
        }
        debug!(passages = results.len(), top_score = results[0].score, "retrieved context");

        match self.generator.generate_response(query, &results).await {
            Ok(answer) => QueryResponse {
                answer,
                sources: distinct_sources(&results),
                context: results.into_iter().map(|r| r.text).collect(),
                status: QueryStatus::Answered,
            },
            Err(e) => generation_failed(e),
        }
    }

    /// Fresh snapshot; the count is re-read from the store every call.
    pub async fn get_stats(&self) -> IndexStats {
        let document_count = self.store.count().await.unwrap_or_else(|e| {
            error!(error = %e, "failed to count documents");
            0
        });
        IndexStats {
            document_count,
            index_name: self.store.index_name().to_string(),
            llm_provider: self.generator.provider(),
        }
    }

    pub async fn chat(&self, messages: &[ChatMessage]) -> String {
        if messages.is_empty() {
            return EMPTY_CHAT_MESSAGE.to_string();
        }
        match self.generator.chat(messages).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, "chat failed");
                GENERATION_FAILED_MESSAGE.to_string()
            }
        }
    }
}

fn generation_failed(e: docrag_core::Error) -> QueryResponse {
    error!(error = %e, "generation failed");
    QueryResponse::canned(GENERATION_FAILED_MESSAGE, QueryStatus::GenerationFailed)
}

/// `source` values in first-seen order, each once.
pub fn distinct_sources(results: &[SearchResult]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for source in results.iter().filter_map(SearchResult::source) {
        if !sources.iter().any(|s| s == source) {
            sources.push(source.to_string());
        }
    }
    sources
}
