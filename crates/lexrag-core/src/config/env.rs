use super::{Config, Secret};

fn parse_enum<T: serde::de::DeserializeOwned>(key: &str, v: String) -> Option<T> {
    match serde_json::from_value(serde_json::Value::String(v.clone())) {
        Ok(kind) => Some(kind),
        Err(_) => {
            tracing::warn!("ignoring invalid {key} value: {v}");
            None
        }
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_pipeline();
        self.apply_env_overrides_llm();
    }

    fn apply_env_overrides_pipeline(&mut self) {
        if let Ok(v) = std::env::var("LEXRAG_CHUNK_SENTENCES")
            && let Ok(n) = v.parse::<usize>()
        {
            self.chunking.sentences_per_chunk = n;
        }
        if let Ok(v) = std::env::var("LEXRAG_CHUNK_MIN_LENGTH")
            && let Ok(n) = v.parse::<usize>()
        {
            self.chunking.min_chunk_length = n;
        }
        if let Ok(v) = std::env::var("LEXRAG_EMBEDDING_BACKEND")
            && let Some(kind) = parse_enum("LEXRAG_EMBEDDING_BACKEND", v)
        {
            self.embedding.backend = kind;
        }
        if let Ok(v) = std::env::var("LEXRAG_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("LEXRAG_EMBEDDING_BATCH_SIZE")
            && let Ok(n) = v.parse::<usize>()
        {
            self.embedding.batch_size = n;
        }
        if let Ok(v) = std::env::var("LEXRAG_EMBEDDING_DEVICE") {
            self.embedding.device = v;
        }
        if let Ok(v) = std::env::var("LEXRAG_VECTOR_BACKEND")
            && let Some(kind) = parse_enum("LEXRAG_VECTOR_BACKEND", v)
        {
            self.vector_store.backend = kind;
        }
        if let Ok(v) = std::env::var("LEXRAG_QDRANT_URL") {
            self.vector_store.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("LEXRAG_COLLECTION") {
            self.vector_store.collection = v;
        }
        if let Ok(v) = std::env::var("LEXRAG_ANSWER_TOP_K")
            && let Ok(n) = v.parse::<usize>()
        {
            self.answer.top_k = n;
        }
        if let Ok(v) = std::env::var("LEXRAG_LOG_LEVEL") {
            self.log_level = v;
        }
    }

    fn apply_env_overrides_llm(&mut self) {
        if let Ok(v) = std::env::var("LEXRAG_LLM_PROVIDER")
            && let Some(kind) = parse_enum("LEXRAG_LLM_PROVIDER", v)
        {
            self.llm.provider = kind;
        }
        if let Ok(v) = std::env::var("LEXRAG_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("LEXRAG_LLM_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Ok(v) = std::env::var("LEXRAG_LLM_MAX_RETRIES")
            && let Ok(n) = v.parse::<u32>()
        {
            self.llm.max_retries = n;
        }
        if let Ok(v) = std::env::var("LEXRAG_LLM_TIMEOUT")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.llm.timeout_secs = secs;
        }
        if let Some(key) = std::env::var("LEXRAG_GEMINI_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty())
        {
            self.secrets.gemini_api_key = Some(Secret::new(key));
        }
    }
}
