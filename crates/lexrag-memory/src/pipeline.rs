use lexrag_llm::Embedder;
use serde::Serialize;

use crate::chunker::SentenceChunker;
use crate::error::IngestError;
use crate::index::VectorIndex;
use crate::vector_store::Distance;

/// Outcome of indexing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub document_id: i64,
    pub chunks: usize,
    pub points_written: usize,
}

/// Chunk, embed and store documents.
#[derive(Debug, Clone)]
pub struct IngestionPipeline {
    chunker: SentenceChunker,
    embedder: Embedder,
    index: VectorIndex,
}

impl IngestionPipeline {
    #[must_use]
    pub fn new(chunker: SentenceChunker, embedder: Embedder, index: VectorIndex) -> Self {
        Self {
            chunker,
            embedder,
            index,
        }
    }

    #[must_use]
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Index the extracted text of `document_id`.
    ///
    /// Earlier points of the same document are left in place; use
    /// [`IngestionPipeline::reindex`] to replace them.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding fails or the index rejects the write.
    pub async fn ingest(
        &self,
        document_id: i64,
        text: &str,
        collection: Option<&str>,
    ) -> Result<IngestReport, IngestError> {
        let (chunks, embeddings) = self.prepare(document_id, text).await?;
        self.write(document_id, &chunks, &embeddings, collection).await
    }

    /// Replace every indexed chunk of `document_id` with chunks of `text`.
    ///
    /// The new version is chunked and embedded before anything is deleted, so a
    /// failure there leaves the previous points untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding, deleting the previous points, or storing fails.
    pub async fn reindex(
        &self,
        document_id: i64,
        text: &str,
        collection: Option<&str>,
    ) -> Result<IngestReport, IngestError> {
        let (chunks, embeddings) = self.prepare(document_id, text).await?;
        if let Some(first) = embeddings.first() {
            self.index
                .ensure_collection(
                    self.index.resolve(collection),
                    first.len() as u64,
                    Distance::Cosine,
                )
                .await?;
        }
        self.index.delete_document(document_id, collection).await?;
        self.write(document_id, &chunks, &embeddings, collection).await
    }

    async fn prepare(
        &self,
        document_id: i64,
        text: &str,
    ) -> Result<(Vec<String>, Vec<Vec<f32>>), IngestError> {
        let chunks: Vec<String> = self
            .chunker
            .chunk_document(document_id, text)
            .into_iter()
            .map(|c| c.text)
            .collect();
        if chunks.is_empty() {
            return Ok((chunks, Vec::new()));
        }
        let embeddings = self.embedder.embed(&chunks).await?;
        Ok((chunks, embeddings))
    }

    async fn write(
        &self,
        document_id: i64,
        chunks: &[String],
        embeddings: &[Vec<f32>],
        collection: Option<&str>,
    ) -> Result<IngestReport, IngestError> {
        if chunks.is_empty() {
            tracing::info!(document_id, "document produced no chunks, nothing indexed");
            return Ok(IngestReport {
                document_id,
                chunks: 0,
                points_written: 0,
            });
        }
        let points_written = self
            .index
            .store_chunks(document_id, chunks, embeddings, collection)
            .await?;

        tracing::info!(document_id, chunks = chunks.len(), points_written, "document indexed");
        Ok(IngestReport {
            document_id,
            chunks: chunks.len(),
            points_written,
        })
    }
}
