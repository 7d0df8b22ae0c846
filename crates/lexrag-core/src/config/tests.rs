use std::io::Write;

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 18] = [
    "LEXRAG_EMBEDDING_DEVICE",
    "LEXRAG_CHUNK_SENTENCES",
    "LEXRAG_CHUNK_MIN_LENGTH",
    "LEXRAG_EMBEDDING_BACKEND",
    "LEXRAG_EMBEDDING_MODEL",
    "LEXRAG_EMBEDDING_BATCH_SIZE",
    "LEXRAG_VECTOR_BACKEND",
    "LEXRAG_QDRANT_URL",
    "LEXRAG_COLLECTION",
    "LEXRAG_ANSWER_TOP_K",
    "LEXRAG_LOG_LEVEL",
    "LEXRAG_LLM_PROVIDER",
    "LEXRAG_LLM_MODEL",
    "LEXRAG_LLM_BASE_URL",
    "LEXRAG_LLM_MAX_RETRIES",
    "LEXRAG_LLM_TIMEOUT",
    "LEXRAG_GEMINI_API_KEY",
    "GEMINI_API_KEY",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
fn defaults_match_documented_values() {
    let config = Config::default();
    assert_eq!(config.chunking.sentences_per_chunk, 5);
    assert_eq!(config.chunking.min_chunk_length, 50);
    assert_eq!(config.embedding.dimensions, 384);
    assert_eq!(config.embedding.batch_size, 16);
    assert_eq!(config.embedding.device, "auto");
    assert_eq!(
        config.embedding.model,
        "sentence-transformers/all-MiniLM-L6-v2"
    );
    assert_eq!(config.vector_store.backend, VectorBackend::Qdrant);
    assert_eq!(config.vector_store.qdrant_url, "http://localhost:6334");
    assert_eq!(config.vector_store.collection, "legal_documents");
    assert!(config.vector_store.exact_search);
    assert_eq!(config.llm.provider, ProviderKind::Gemini);
    assert_eq!(config.llm.model, "gemini-2.0-flash");
    assert!(config.llm.base_url.is_none());
    assert_eq!(config.llm.max_retries, 3);
    assert_eq!(config.llm.timeout_secs, 60);
    assert_eq!(config.answer.top_k, 5);
    assert_eq!(config.answer.summary_chunks, 10);
    assert_eq!(config.log_level, "info");
    assert!(config.secrets.gemini_api_key.is_none());
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn load_missing_file_uses_defaults() {
    clear_env();
    let config = Config::load(std::path::Path::new("/nonexistent/lexrag.toml")).unwrap();
    assert_eq!(config.vector_store.collection, "legal_documents");
    assert_eq!(config.answer.top_k, 5);
}

#[test]
#[serial]
fn parse_partial_toml_keeps_other_defaults() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
log_level = "debug"

[chunking]
sentences_per_chunk = 3

[vector_store]
backend = "memory"
collection = "contracts"

[llm]
provider = "mock"
timeout_secs = 5
"#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.chunking.sentences_per_chunk, 3);
    assert_eq!(config.chunking.min_chunk_length, 50);
    assert_eq!(config.vector_store.backend, VectorBackend::Memory);
    assert_eq!(config.vector_store.collection, "contracts");
    assert_eq!(config.vector_store.upsert_batch_size, 64);
    assert_eq!(config.llm.provider, ProviderKind::Mock);
    assert_eq!(config.llm.timeout_secs, 5);
    assert_eq!(config.llm.max_retries, 3);
}

#[test]
#[serial]
fn malformed_toml_is_rejected() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[chunking\nsentences_per_chunk = ").unwrap();
    let err = Config::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("failed to parse config file"));
}

#[test]
#[serial]
fn unknown_backend_is_rejected() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[vector_store]\nbackend = \"pinecone\"\n").unwrap();
    assert!(Config::load(file.path()).is_err());
}

#[test]
#[serial]
fn env_overrides_file_values() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[vector_store]\ncollection = \"from_file\"\n").unwrap();

    unsafe {
        std::env::set_var("LEXRAG_COLLECTION", "from_env");
        std::env::set_var("LEXRAG_QDRANT_URL", "http://qdrant:6334");
        std::env::set_var("LEXRAG_VECTOR_BACKEND", "memory");
        std::env::set_var("LEXRAG_EMBEDDING_BACKEND", "hashing");
        std::env::set_var("LEXRAG_CHUNK_SENTENCES", "2");
        std::env::set_var("LEXRAG_ANSWER_TOP_K", "8");
        std::env::set_var("LEXRAG_LLM_PROVIDER", "mock");
        std::env::set_var("LEXRAG_LLM_TIMEOUT", "15");
        std::env::set_var("LEXRAG_LLM_BASE_URL", "http://localhost:9999");
    }
    let config = Config::load(file.path()).unwrap();
    clear_env();

    assert_eq!(config.vector_store.collection, "from_env");
    assert_eq!(config.vector_store.qdrant_url, "http://qdrant:6334");
    assert_eq!(config.vector_store.backend, VectorBackend::Memory);
    assert_eq!(config.embedding.backend, EmbeddingBackend::Hashing);
    assert_eq!(config.chunking.sentences_per_chunk, 2);
    assert_eq!(config.answer.top_k, 8);
    assert_eq!(config.llm.provider, ProviderKind::Mock);
    assert_eq!(config.llm.timeout_secs, 15);
    assert_eq!(config.llm.base_url.as_deref(), Some("http://localhost:9999"));
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("LEXRAG_ANSWER_TOP_K", "many");
        std::env::set_var("LEXRAG_LLM_PROVIDER", "openai");
    }
    let config = Config::load(std::path::Path::new("/nonexistent/lexrag.toml")).unwrap();
    clear_env();

    assert_eq!(config.answer.top_k, 5);
    assert_eq!(config.llm.provider, ProviderKind::Gemini);
}

#[test]
#[serial]
fn api_key_comes_from_env_only() {
    clear_env();
    unsafe { std::env::set_var("GEMINI_API_KEY", "fallback-key") };
    let config = Config::load(std::path::Path::new("/nonexistent/lexrag.toml")).unwrap();
    assert_eq!(
        config.secrets.gemini_api_key.as_ref().map(Secret::expose),
        Some("fallback-key")
    );

    unsafe { std::env::set_var("LEXRAG_GEMINI_API_KEY", "primary-key") };
    let config = Config::load(std::path::Path::new("/nonexistent/lexrag.toml")).unwrap();
    clear_env();
    assert_eq!(
        config.secrets.gemini_api_key.as_ref().map(Secret::expose),
        Some("primary-key")
    );
}

#[test]
#[serial]
fn blank_api_key_is_treated_as_missing() {
    clear_env();
    unsafe { std::env::set_var("LEXRAG_GEMINI_API_KEY", "  ") };
    let config = Config::load(std::path::Path::new("/nonexistent/lexrag.toml")).unwrap();
    clear_env();
    assert!(config.secrets.gemini_api_key.is_none());
}

#[test]
#[serial]
fn zero_window_fails_validation() {
    clear_env();
    unsafe { std::env::set_var("LEXRAG_CHUNK_SENTENCES", "0") };
    let err = Config::load(std::path::Path::new("/nonexistent/lexrag.toml")).unwrap_err();
    clear_env();
    assert!(err.to_string().contains("sentences_per_chunk"));
}

#[test]
fn validate_rejects_empty_collection_and_zero_top_k() {
    let mut config = Config::default();
    config.vector_store.collection = "  ".into();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.answer.top_k = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("top_k"));
}

#[test]
fn secret_is_redacted() {
    let secret = Secret::new("sk-live-123");
    assert_eq!(format!("{secret:?}"), "[REDACTED]");
    assert_eq!(format!("{secret}"), "[REDACTED]");
    assert_eq!(secret.expose(), "sk-live-123");
}

#[test]
#[serial]
fn secrets_in_config_file_are_ignored() {
    clear_env();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[secrets]\ngemini_api_key = \"from-file\"\n").unwrap();
    let config = Config::load(file.path()).unwrap();
    assert!(config.secrets.gemini_api_key.is_none());
}

#[test]
#[serial]
fn shipped_config_leaves_embedding_backend_to_build() {
    clear_env();
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
    let config = Config::load(&path).unwrap();
    assert_eq!(config.embedding.backend, EmbeddingConfig::default().backend);
    assert_eq!(config.embedding.dimensions, 384);
    assert_eq!(config.vector_store.collection, "legal_documents");
}
