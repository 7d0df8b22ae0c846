use std::future::Future;

use crate::error::LlmError;

/// A generative language service that turns a prompt into text.
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be reached, keeps failing transiently
    /// past its retry budget, or returns an unusable response.
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, LlmError>> + Send;

    fn name(&self) -> &'static str;
}
