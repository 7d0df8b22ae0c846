//! Sentence embedding models and the batching embedder built on top of them.

#[cfg(feature = "candle")]
mod bert;
mod cell;
mod embedder;
mod hashing;

#[cfg(feature = "candle")]
pub use bert::BertEmbedModel;
pub use cell::{ModelCell, ModelLoader};
pub use embedder::{DEFAULT_BATCH_SIZE, Embedder};
pub use hashing::HashingEmbedModel;

use crate::error::LlmError;

/// Default sentence embedding model on the Hugging Face hub.
pub const DEFAULT_EMBED_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
/// Output dimensionality of [`DEFAULT_EMBED_MODEL`].
pub const DEFAULT_DIMENSIONS: usize = 384;

/// A local model mapping text to fixed-length dense vectors.
///
/// Implementations are read-only after construction and must be deterministic:
/// the same text always yields the same vector.
pub trait EmbeddingModel: Send + Sync {
    fn dimensions(&self) -> usize;

    /// Embed every text in `texts`, returning one vector per input in the same order.
    ///
    /// # Errors
    ///
    /// Returns an error if tokenization or the forward pass fails.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;
}

pub(crate) fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
