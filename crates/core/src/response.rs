use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::intent::Intent;

/// Which handling strategy produced a response. Carried for observability
/// and as a client UI hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Direct,
    Retrieval,
    Generative,
    Tool,
    MultiTurn,
}

/// Result of one orchestrator turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorResponse {
    pub message: String,
    pub response_type: ResponseKind,
    pub intent: Intent,
    pub confidence: f64,
    #[serde(default)]
    pub requires_followup: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl OrchestratorResponse {
    pub fn new(
        message: impl Into<String>,
        response_type: ResponseKind,
        intent: Intent,
        confidence: f64,
    ) -> Self {
        Self {
            message: message.into(),
            response_type,
            intent,
            confidence,
            requires_followup: false,
            next_step: None,
            metadata: Map::new(),
        }
    }

    /// Standardized response for a turn that hit an unrecoverable handler or
    /// capability error. The turn still completes; nothing is fatal.
    pub fn apology(intent: Intent, confidence: f64) -> Self {
        Self::new(
            "I encountered an error processing your request. Please try again.",
            ResponseKind::Direct,
            intent,
            confidence,
        )
        .with_metadata("error", true)
    }

    pub fn with_followup(mut self, next_step: impl Into<String>) -> Self {
        self.requires_followup = true;
        self.next_step = Some(next_step.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
