use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::{Tokenizer, TruncationParams};

use super::{EmbeddingModel, l2_normalize};
use crate::error::LlmError;

/// Sequence limit of the BERT position embeddings.
const MAX_TOKENS: usize = 512;

/// Sentence-transformers BERT model with mean pooling and L2 normalization.
#[derive(Clone)]
pub struct BertEmbedModel {
    model: Arc<BertModel>,
    tokenizer: Tokenizer,
    device: Device,
    dimensions: usize,
}

impl std::fmt::Debug for BertEmbedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertEmbedModel")
            .field("device", &self.device)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl BertEmbedModel {
    /// Download (or reuse the hub cache of) `repo_id` and load it onto `device`.
    ///
    /// # Errors
    ///
    /// Returns an error if download, parsing, or weight loading fails.
    pub fn load(repo_id: &str, device: &Device) -> Result<Self, LlmError> {
        let api = hf_hub::api::sync::Api::new().map_err(|e| {
            LlmError::ModelLoad(format!("failed to create HuggingFace API client: {e}"))
        })?;
        let repo = api.model(repo_id.to_owned());
        let fetch = |file: &str| {
            repo.get(file).map_err(|e| {
                LlmError::ModelLoad(format!("failed to download {file} from {repo_id}: {e}"))
            })
        };

        let config_path = fetch("config.json")?;
        let tokenizer_path = fetch("tokenizer.json")?;
        let weights_path = fetch("model.safetensors")?;

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| LlmError::ModelLoad(format!("failed to read BERT config: {e}")))?;
        let config: BertConfig = serde_json::from_str(&config_str)?;
        let raw: serde_json::Value = serde_json::from_str(&config_str)?;
        let dimensions = raw
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| LlmError::ModelLoad("config.json has no hidden_size".into()))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| LlmError::ModelLoad(format!("failed to load tokenizer: {e}")))?;
        configure_truncation(&mut tokenizer, MAX_TOKENS)?;

        // SAFETY: file is a valid safetensors downloaded from hf-hub, not modified during
        // VarBuilder lifetime
        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? };
        let model = BertModel::load(vb, &config)?;

        tracing::info!(repo_id, dimensions, "loaded BERT embedding model");
        Ok(Self {
            model: Arc::new(model),
            tokenizer,
            device: device.clone(),
            dimensions,
        })
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| LlmError::Inference(format!("tokenizer encode failed: {e}")))?;

        let ids = encoding.get_ids();
        let type_ids = vec![0u32; ids.len()];

        let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::new(type_ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, None)?;

        // Mean pooling over the sequence dimension
        let seq_len = u32::try_from(hidden.dim(1)?)
            .map_err(|e| LlmError::Inference(format!("sequence length overflow: {e}")))?;
        let pooled = (hidden.sum(1)? / f64::from(seq_len.max(1)))?.squeeze(0)?;

        let mut v = pooled.to_vec1::<f32>()?;
        l2_normalize(&mut v);
        Ok(v)
    }
}

/// Cap encodings at `max_length` tokens, keeping the tokenizer's own limit when it
/// is lower. Special tokens survive truncation.
fn configure_truncation(tokenizer: &mut Tokenizer, max_length: usize) -> Result<(), LlmError> {
    if let Some(truncation) = tokenizer.get_truncation_mut() {
        truncation.max_length = truncation.max_length.min(max_length);
        return Ok(());
    }
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| LlmError::ModelLoad(format!("failed to set truncation: {e}")))?;
    Ok(())
}

impl EmbeddingModel for BertEmbedModel {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}
