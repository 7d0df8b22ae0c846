//! Generation providers and sentence embedding models.

pub mod any;
pub mod embed;
pub mod error;
pub mod gemini;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod provider;
pub mod retry;

pub use any::AnyProvider;
pub use embed::{Embedder, EmbeddingModel, ModelCell};
pub use error::LlmError;
pub use provider::LlmProvider;
pub use retry::RetryPolicy;
