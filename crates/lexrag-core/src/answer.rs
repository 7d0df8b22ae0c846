//! Grounded answers and summaries over retrieved document chunks.

use std::fmt::Write as _;
use std::time::Duration;

use lexrag_llm::{Embedder, LlmError, LlmProvider};
use lexrag_memory::{IndexError, RetrievalResult, VectorIndex};
use serde::Serialize;

pub const NO_RESULTS_ANSWER: &str = "No relevant information found.";
pub const UNAVAILABLE_ANSWER: &str =
    "The document search service is temporarily unavailable. Please try again later.";
pub const NO_CONTENT_SUMMARY: &str = "No content found for this document.";
/// Query used to pull representative chunks when summarizing a whole document.
pub const SUMMARY_PROBE: &str = "main points key information important details";

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_SUMMARY_CHUNKS: usize = 10;
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
    /// Retrieved chunks in search order, kept even when generation fails.
    pub sources: Vec<RetrievalResult>,
    /// Similarity of the best source; `None` when nothing was generated.
    pub confidence: Option<f32>,
}

impl AnswerResponse {
    fn without_sources(answer: &str) -> Self {
        Self {
            answer: answer.to_owned(),
            sources: Vec::new(),
            confidence: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("query must not be empty")]
    EmptyQuery,

    #[error("failed to embed query: {0}")]
    Embedding(#[from] LlmError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Retrieves chunks for a question and asks the provider for a grounded answer.
pub struct AnswerComposer<P> {
    embedder: Embedder,
    index: VectorIndex,
    provider: P,
    generation_timeout: Duration,
}

impl<P: LlmProvider> AnswerComposer<P> {
    #[must_use]
    pub fn new(embedder: Embedder, index: VectorIndex, provider: P) -> Self {
        Self {
            embedder,
            index,
            provider,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    #[must_use]
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Answer `query` from the `top_k` most similar chunks, optionally limited to
    /// one document.
    ///
    /// No matches, an unreachable index and a failed generation all produce an
    /// `AnswerResponse` describing what happened.
    ///
    /// # Errors
    ///
    /// Returns `EmptyQuery` for a blank query, `Embedding` if the query cannot be
    /// embedded, and `Index` for retrieval failures other than unavailability.
    pub async fn answer(
        &self,
        query: &str,
        document_id: Option<i64>,
        top_k: usize,
    ) -> Result<AnswerResponse, AnswerError> {
        let Some(sources) = self.retrieve(query, document_id, top_k).await? else {
            return Ok(AnswerResponse::without_sources(UNAVAILABLE_ANSWER));
        };
        if sources.is_empty() {
            tracing::info!(?document_id, "no chunks matched the query");
            return Ok(AnswerResponse::without_sources(NO_RESULTS_ANSWER));
        }

        tracing::debug!(?document_id, sources = sources.len(), "retrieved chunks");
        let prompt = build_answer_prompt(query, &sources);
        Ok(self.finish(prompt, sources, "an answer").await)
    }

    /// Summarize one document from up to `max_chunks` representative chunks.
    ///
    /// # Errors
    ///
    /// Same as [`AnswerComposer::answer`].
    pub async fn summarize(
        &self,
        document_id: i64,
        max_chunks: usize,
    ) -> Result<AnswerResponse, AnswerError> {
        let Some(sources) = self
            .retrieve(SUMMARY_PROBE, Some(document_id), max_chunks)
            .await?
        else {
            return Ok(AnswerResponse::without_sources(UNAVAILABLE_ANSWER));
        };
        if sources.is_empty() {
            tracing::info!(document_id, "nothing indexed for document");
            return Ok(AnswerResponse::without_sources(NO_CONTENT_SUMMARY));
        }

        let prompt = build_summary_prompt(&sources);
        Ok(self.finish(prompt, sources, "a summary").await)
    }

    /// `Ok(None)` when the index cannot be reached.
    async fn retrieve(
        &self,
        query: &str,
        document_id: Option<i64>,
        top_k: usize,
    ) -> Result<Option<Vec<RetrievalResult>>, AnswerError> {
        if query.trim().is_empty() {
            return Err(AnswerError::EmptyQuery);
        }
        let vector = self.embedder.embed_one(query).await?;
        match self.index.search(&vector, top_k, None, document_id).await {
            Ok(results) => Ok(Some(results)),
            Err(IndexError::Unavailable(msg)) => {
                tracing::error!(?document_id, "vector index unavailable: {msg}");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn finish(
        &self,
        prompt: String,
        sources: Vec<RetrievalResult>,
        what: &str,
    ) -> AnswerResponse {
        match self.generate(&prompt).await {
            Ok(answer) => {
                let confidence = sources.first().map(|s| s.score);
                AnswerResponse {
                    answer,
                    sources,
                    confidence,
                }
            }
            Err(e) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    "generation failed, returning sources only: {e}"
                );
                AnswerResponse {
                    answer: format!("Failed to generate {what}: {e}"),
                    sources,
                    confidence: None,
                }
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        match tokio::time::timeout(self.generation_timeout, self.provider.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.generation_timeout)),
        }
    }
}

impl<P: LlmProvider + std::fmt::Debug> std::fmt::Debug for AnswerComposer<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerComposer")
            .field("index", &self.index)
            .field("provider", &self.provider)
            .field("generation_timeout", &self.generation_timeout)
            .finish_non_exhaustive()
    }
}

/// Label each chunk `[Excerpt N]` in search order, separated by blank lines.
#[must_use]
pub fn build_context(sources: &[RetrievalResult]) -> String {
    let mut context = String::new();
    for (i, source) in sources.iter().enumerate() {
        if i > 0 {
            context.push_str("\n\n");
        }
        let _ = write!(context, "[Excerpt {}] {}", i + 1, source.text);
    }
    context
}

#[must_use]
pub fn build_answer_prompt(query: &str, sources: &[RetrievalResult]) -> String {
    let context = build_context(sources);
    format!(
        "You are a careful assistant analyzing legal documents.\n\
         \n\
         Relevant excerpts from the document:\n\
         \n\
         {context}\n\
         \n\
         Instructions:\n\
         - Answer the question using ONLY the provided excerpts\n\
         - Cite the excerpt numbers you rely on (e.g. \"According to Excerpt 1...\")\n\
         - If the excerpts do not contain enough information, say so\n\
         - Be concise and use professional language\n\
         \n\
         Question: {query}\n\
         \n\
         Answer:"
    )
}

#[must_use]
pub fn build_summary_prompt(sources: &[RetrievalResult]) -> String {
    let context = build_context(sources);
    format!(
        "You are analyzing a legal document. Using only the excerpts below, provide:\n\
         \n\
         1. A concise summary (2-3 sentences)\n\
         2. Key points as a bulleted list\n\
         \n\
         Excerpts:\n\
         \n\
         {context}\n\
         \n\
         Summary:"
    )
}
