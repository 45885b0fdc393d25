use async_trait::async_trait;

use crate::error::CapabilityError;

/// Generative completion capability. Provider adapters (hosted APIs, local
/// models) live outside this crate and are injected at construction.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CapabilityError>;
}
