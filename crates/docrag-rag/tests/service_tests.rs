mod common;

use std::sync::Arc;

use common::{memory_store, DownStore, ScriptedGenerator};
use docrag_core::config::Config;
use docrag_core::traits::VectorStore;
use docrag_core::types::{ChatMessage, DocumentChunk, LlmProvider, Metadata, QueryStatus, SearchResult};
use docrag_embed::FakeEmbedder;
use docrag_rag::service::{
    distinct_sources, EMPTY_CHAT_MESSAGE, EMPTY_QUERY_MESSAGE, GENERATION_FAILED_MESSAGE, NO_MATCHES_MESSAGE,
    STORE_UNAVAILABLE_MESSAGE,
};
use docrag_rag::{AppContext, RagService};
use pretty_assertions::assert_eq;
use serde_json::json;

fn passages() -> Vec<DocumentChunk> {
    vec![
        DocumentChunk::new("Boil water for one minute before drinking it", "water.txt"),
        DocumentChunk::new("Boiling water at altitude takes three minutes", "water.txt"),
        DocumentChunk::new("Water filters remove sediment before boiling", "filters.pdf").with_meta("page", 3),
    ]
}

#[tokio::test]
async fn blank_query_is_answered_without_backends() {
    let store = memory_store();
    let generator = Arc::new(ScriptedGenerator::default());
    let service = RagService::new(store.clone(), generator.clone());

    for query in ["", "   \n"] {
        let response = service.process_query(query, true).await;
        assert_eq!(response.answer, EMPTY_QUERY_MESSAGE);
        assert_eq!(response.status, QueryStatus::EmptyQuery);
    }
    assert_eq!(store.calls(), 0);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn empty_index_gives_no_information_without_generation() {
    let generator = Arc::new(ScriptedGenerator::default());
    let service = RagService::new(memory_store(), generator.clone());

    let response = service.process_query("How do I purify water?", true).await;

    assert_eq!(response.answer, NO_MATCHES_MESSAGE);
    assert_eq!(response.status, QueryStatus::NoMatches);
    assert!(response.context.is_empty());
    assert!(response.sources.is_empty());
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn answer_carries_ranked_context_and_distinct_sources() {
    let store = memory_store();
    store.index(&passages()).await.unwrap();
    let generator = Arc::new(ScriptedGenerator::default());
    let service = RagService::new(store.clone(), generator.clone());

    let response = service.process_query("boil water before drinking", true).await;

    assert_eq!(response.status, QueryStatus::Answered);
    assert_eq!(response.answer, "answer to: boil water before drinking");
    assert_eq!(response.context.len(), 3);
    assert_eq!(response.context, generator.last_context());
    assert_eq!(response.sources.len(), 2);
    assert!(response.sources.contains(&"water.txt".to_string()));
    assert!(response.sources.contains(&"filters.pdf".to_string()));
    assert_eq!(response.context[0], "Boil water for one minute before drinking it");
}

#[tokio::test]
async fn near_identical_query_scores_above_threshold() {
    let store = memory_store();
    store.index(&passages()).await.unwrap();

    let results = store.search("boil water for one minute before drinking it!", 1).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text, "Boil water for one minute before drinking it");
    assert!(results[0].score > 1.5, "score was {}", results[0].score);
}

#[tokio::test]
async fn top_k_limits_retrieved_context() {
    let store = memory_store();
    store.index(&passages()).await.unwrap();
    let service = RagService::new(store, Arc::new(ScriptedGenerator::default())).with_top_k(2);

    let response = service.process_query("water", true).await;

    assert_eq!(response.context.len(), 2);
}

#[test]
fn sources_are_deduplicated_in_first_seen_order() {
    let hit = |text: &str, source: &str| {
        let mut metadata = Metadata::new();
        metadata.insert("source".into(), json!(source));
        SearchResult { text: text.into(), metadata, score: 1.0 }
    };
    let results = vec![hit("1", "b.txt"), hit("2", "a.txt"), hit("3", "b.txt"), hit("4", "c.txt")];

    assert_eq!(distinct_sources(&results), vec!["b.txt", "a.txt", "c.txt"]);
}

#[tokio::test]
async fn without_rag_the_store_is_skipped() {
    let store = memory_store();
    let generator = Arc::new(ScriptedGenerator::default());
    let service = RagService::new(store.clone(), generator.clone());

    let response = service.process_query("Tell me a joke", false).await;

    assert_eq!(response.status, QueryStatus::Answered);
    assert_eq!(response.answer, "answer to: Tell me a joke");
    assert!(response.context.is_empty() && response.sources.is_empty());
    assert!(generator.last_context().is_empty());
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn store_outage_is_reported_distinctly_from_no_matches() {
    let generator = Arc::new(ScriptedGenerator::default());
    let service = RagService::new(Arc::new(DownStore), generator.clone());

    let response = service.process_query("anything", true).await;

    assert_eq!(response.status, QueryStatus::StoreUnavailable);
    assert_eq!(response.answer, STORE_UNAVAILABLE_MESSAGE);
    assert_eq!(generator.calls(), 0);
    assert_eq!(service.get_stats().await.document_count, 0);
}

#[tokio::test]
async fn generation_failure_yields_plain_message() {
    let store = memory_store();
    store.index(&passages()).await.unwrap();
    let service = RagService::new(store, Arc::new(ScriptedGenerator::failing()));

    let response = service.process_query("water", true).await;

    assert_eq!(response.status, QueryStatus::GenerationFailed);
    assert_eq!(response.answer, GENERATION_FAILED_MESSAGE);
    assert_eq!(service.chat(&[ChatMessage::user("hi")]).await, GENERATION_FAILED_MESSAGE);
}

#[tokio::test]
async fn chat_requires_messages() {
    let generator = Arc::new(ScriptedGenerator::default());
    let service = RagService::new(memory_store(), generator.clone());

    assert_eq!(service.chat(&[]).await, EMPTY_CHAT_MESSAGE);
    assert_eq!(generator.calls(), 0);

    let reply = service.chat(&[ChatMessage::user("hi"), ChatMessage::assistant("hello"), ChatMessage::user("bye")]).await;
    assert_eq!(reply, "reply after 3 messages");
}

#[tokio::test]
async fn stats_are_read_fresh_each_time() {
    let store = memory_store();
    let service = RagService::new(store.clone(), Arc::new(ScriptedGenerator::default()));

    let before = service.get_stats().await;
    store.index(&passages()).await.unwrap();
    let after = service.get_stats().await;

    assert_eq!(before.document_count, 0);
    assert_eq!(after.document_count, 3);
    assert_eq!(after.index_name, "test_index");
    assert_eq!(after.llm_provider, LlmProvider::Ollama);
}

#[tokio::test]
async fn context_wires_pipeline_and_service_to_one_store() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::write(tmp.path().join("a.txt"), "Store seeds in a cool dry jar").unwrap();
    let mut config = Config::default();
    config.rag.top_k = 3;
    let embedder = Arc::new(FakeEmbedder::new(64));
    let store = Arc::new(docrag_store::MemoryStore::new("ctx", embedder.clone()));
    let ctx = AppContext::from_parts(config, embedder, store, Arc::new(ScriptedGenerator::default())).unwrap();

    assert_eq!(ctx.pipeline.index_directory(Some(tmp.path())).await, 1);
    let response = ctx.service.process_query("seeds", true).await;

    assert_eq!(response.status, QueryStatus::Answered);
    assert_eq!(response.sources, vec![tmp.path().join("a.txt").to_string_lossy().to_string()]);
    assert_eq!(ctx.service.top_k(), 3);
}
