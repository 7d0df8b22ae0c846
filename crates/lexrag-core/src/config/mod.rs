mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if the
    /// resulting configuration is invalid.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values no component can run with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chunking.sentences_per_chunk == 0 {
            bail!("chunking.sentences_per_chunk must be at least 1");
        }
        if self.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be at least 1");
        }
        if self.embedding.dimensions == 0 {
            bail!("embedding.dimensions must be at least 1");
        }
        if self.vector_store.collection.trim().is_empty() {
            bail!("vector_store.collection must not be empty");
        }
        if self.vector_store.upsert_batch_size == 0 {
            bail!("vector_store.upsert_batch_size must be at least 1");
        }
        if self.answer.top_k == 0 {
            bail!("answer.top_k must be at least 1");
        }
        if self.answer.summary_chunks == 0 {
            bail!("answer.summary_chunks must be at least 1");
        }
        if self.llm.timeout_secs == 0 {
            bail!("llm.timeout_secs must be at least 1");
        }
        Ok(())
    }
}
