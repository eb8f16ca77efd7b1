use docrag_core::config::Config;
use docrag_core::types::LlmProvider;
use docrag_core::Error;
use docrag_rag::{AppContext, IngestContext};
use mockito::{Server, ServerGuard};

/// Gemini selected with no API key, fake embeddings, store at `server`.
fn keyless_config(server: &ServerGuard) -> Config {
    let mut config = Config::default();
    config.llm.provider = LlmProvider::Gemini;
    config.llm.gemini.api_key = None;
    config.embedding.use_fake = true;
    config.store.url = server.url();
    config.store.index_name = "ctx_test".into();
    config.store.connect_attempts = 1;
    config.store.retry_interval_secs = 0;
    config
}

async fn reachable_cluster() -> ServerGuard {
    let mut server = Server::new_async().await;
    server.mock("GET", "/").with_status(200).with_body("{}").create_async().await;
    server.mock("HEAD", "/ctx_test").with_status(200).create_async().await;
    server
}

#[tokio::test]
async fn ingestion_needs_no_model_credentials() {
    let server = reachable_cluster().await;

    let ctx = IngestContext::initialize(keyless_config(&server)).await;

    match ctx {
        Ok(ctx) => assert_eq!(ctx.store.index_name(), "ctx_test"),
        Err(e) => panic!("ingestion context should start without a Gemini key: {e}"),
    }
}

#[tokio::test]
async fn answering_still_requires_model_credentials() {
    let server = reachable_cluster().await;

    match AppContext::initialize(keyless_config(&server)).await {
        Err(Error::Configuration(msg)) => assert!(msg.contains("GEMINI_API_KEY")),
        Err(other) => panic!("expected a configuration error, got {other:?}"),
        Ok(_) => panic!("expected a configuration error, got a context"),
    }
}
