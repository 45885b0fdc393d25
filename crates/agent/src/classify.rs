use async_trait::async_trait;

use safiri_core::Classification;

use crate::error::CapabilityError;

/// Intent classification capability. Returns the top label with its
/// confidence and the full probability distribution.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification, CapabilityError>;
}
