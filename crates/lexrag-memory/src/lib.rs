//! Sentence chunking, vector storage and the chunk index.

pub mod chunker;
pub mod error;
pub mod in_memory_store;
pub mod index;
pub mod pipeline;
pub mod qdrant_ops;
pub mod types;
pub mod vector_store;

pub use chunker::{ChunkerConfig, RegexSegmenter, SentenceChunker, SentenceSegmenter};
pub use error::{IndexError, IngestError};
pub use in_memory_store::InMemoryVectorStore;
pub use index::VectorIndex;
pub use pipeline::{IngestReport, IngestionPipeline};
pub use qdrant_ops::QdrantStore;
pub use types::{Chunk, RetrievalResult};
pub use vector_store::{
    BoxFuture, CollectionSchema, Distance, FieldCondition, FieldValue, ScoredVectorPoint,
    VectorFilter, VectorPoint, VectorStore, VectorStoreError,
};
