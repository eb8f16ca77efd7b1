use docrag_core::config::Config;
use docrag_core::types::LlmProvider;
use figment::Jail;

#[test]
fn defaults_without_files_or_env() {
    Jail::expect_with(|_jail| {
        let config = Config::load_for_env("test").map_err(|e| e.to_string())?;
        assert_eq!(config.store.url, "http://localhost:9200");
        assert_eq!(config.store.index_name, "rag_documents");
        assert_eq!(config.store.connect_attempts, 10);
        assert_eq!(config.store.bulk_batch_size, 500);
        assert_eq!(config.llm.provider, LlmProvider::Gemini);
        assert_eq!(config.llm.ollama.model, "llama3");
        assert_eq!(config.embedding.model, "all-MiniLM-L6-v2");
        assert_eq!(config.embedding.dimension, 384);
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.rag.top_k, 5);
        Ok(())
    });
}

#[test]
fn toml_files_layer_by_environment() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[store]\nindex_name = \"base\"\n\n[rag]\ntop_k = 3\n")?;
        jail.create_file("config.test.toml", "[store]\nindex_name = \"from_test_file\"\n")?;
        let config = Config::load_for_env("test").map_err(|e| e.to_string())?;
        assert_eq!(config.store.index_name, "from_test_file");
        assert_eq!(config.rag.top_k, 3);
        Ok(())
    });
}

#[test]
fn legacy_and_prefixed_env_override_files() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[chunking]\nchunk_size = 800\n")?;
        jail.set_env("ELASTICSEARCH_URL", "http://search:9200");
        jail.set_env("LLM_PROVIDER", "ollama");
        jail.set_env("CHUNK_SIZE", "500");
        jail.set_env("CHUNK_OVERLAP", "50");
        jail.set_env("APP_STORE__INDEX_NAME", "prefixed");
        let config = Config::load_for_env("test").map_err(|e| e.to_string())?;
        assert_eq!(config.store.url, "http://search:9200");
        assert_eq!(config.store.index_name, "prefixed");
        assert_eq!(config.llm.provider, LlmProvider::Ollama);
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 50);
        Ok(())
    });
}

#[test]
fn rejects_overlap_not_smaller_than_size() {
    Jail::expect_with(|jail| {
        jail.set_env("CHUNK_SIZE", "100");
        jail.set_env("CHUNK_OVERLAP", "100");
        let err = Config::load_for_env("test").expect_err("overlap == size must fail");
        assert!(matches!(err, docrag_core::Error::Configuration(_)));
        Ok(())
    });
}

#[test]
fn production_refuses_fake_embeddings() {
    Jail::expect_with(|jail| {
        jail.set_env("APP_EMBEDDING__USE_FAKE", "true");
        assert!(Config::load_for_env("prod").is_err());
        assert!(Config::load_for_env("dev").is_ok());
        Ok(())
    });
}

#[test]
fn rejects_empty_bulk_batches() {
    Jail::expect_with(|jail| {
        jail.set_env("APP_STORE__BULK_BATCH_SIZE", "0");
        let err = Config::load_for_env("test").expect_err("zero batch size must fail");
        assert!(matches!(err, docrag_core::Error::Configuration(_)));
        Ok(())
    });
}
