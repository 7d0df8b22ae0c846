use crate::error::LlmError;
use crate::gemini::GeminiProvider;
#[cfg(feature = "mock")]
use crate::mock::MockProvider;
use crate::provider::LlmProvider;

/// Generates a match over all `AnyProvider` variants, binding the inner provider
/// and evaluating the given expression for each arm.
macro_rules! delegate_provider {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyProvider::Gemini($p) => $expr,
            #[cfg(feature = "mock")]
            AnyProvider::Mock($p) => $expr,
        }
    };
}

/// Provider selected at runtime from configuration.
#[derive(Debug, Clone)]
pub enum AnyProvider {
    Gemini(GeminiProvider),
    #[cfg(feature = "mock")]
    Mock(MockProvider),
}

impl LlmProvider for AnyProvider {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        delegate_provider!(self, |p| p.generate(prompt).await)
    }

    fn name(&self) -> &'static str {
        delegate_provider!(self, |p| p.name())
    }
}
