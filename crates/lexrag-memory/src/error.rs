use crate::vector_store::{CollectionSchema, VectorStoreError};

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("got {chunks} chunks but {embeddings} embeddings")]
    InputMismatch { chunks: usize, embeddings: usize },

    #[error("collection {collection} is {actual}, requested {expected}")]
    SchemaConflict {
        collection: String,
        expected: CollectionSchema,
        actual: CollectionSchema,
    },

    #[error("embedding {index} has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("wrote {written} points, {} failed", .failed.len())]
    PartialWrite { written: usize, failed: Vec<usize> },

    #[error("vector index unavailable: {0}")]
    Unavailable(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("vector store error: {0}")]
    Store(VectorStoreError),

    #[error("malformed point payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl From<VectorStoreError> for IndexError {
    fn from(e: VectorStoreError) -> Self {
        match e {
            VectorStoreError::Connection(msg) => Self::Unavailable(msg),
            other => Self::Store(other),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] lexrag_llm::LlmError),

    #[error(transparent)]
    Index(#[from] IndexError),
}
