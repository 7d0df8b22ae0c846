use super::{DEFAULT_DIMENSIONS, EmbeddingModel, l2_normalize};
use crate::error::LlmError;

/// Deterministic feature-hashing embedder.
///
/// Each lowercase word and adjacent word pair is hashed with blake3 into one signed
/// bucket. Texts sharing vocabulary land close in cosine space, which is enough for
/// offline runs and tests without model weights.
#[derive(Debug, Clone)]
pub struct HashingEmbedModel {
    dimensions: usize,
}

impl Default for HashingEmbedModel {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl HashingEmbedModel {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn add_feature(&self, v: &mut [f32], feature: &str) {
        let hash = blake3::hash(feature.as_bytes());
        let bytes = hash.as_bytes();
        let mut idx = [0u8; 8];
        idx.copy_from_slice(&bytes[..8]);
        let bucket = u64::from_le_bytes(idx) % self.dimensions as u64;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
        #[allow(clippy::cast_possible_truncation)]
        {
            v[bucket as usize] += sign;
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimensions];
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();

        for word in &words {
            self.add_feature(&mut v, word);
        }
        for pair in words.windows(2) {
            self.add_feature(&mut v, &format!("{} {}", pair[0], pair[1]));
        }
        l2_normalize(&mut v);
        v
    }
}

impl EmbeddingModel for HashingEmbedModel {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
