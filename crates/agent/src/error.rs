use std::time::Duration;

use thiserror::Error;

/// Failure of an external capability call. Always recoverable: the
/// orchestrator converts these into fallback values or an apology response,
/// never into a failed turn.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("capability call failed: {0}")]
    Failed(String),
    #[error("capability call timed out after {0:?}")]
    Timeout(Duration),
    #[error("tool `{0}` is not registered")]
    UnknownTool(String),
}

impl CapabilityError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
