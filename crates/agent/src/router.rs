use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use safiri_core::{Classification, Intent};

use crate::llm::LlmClient;
use crate::parse;
use crate::prompts;

/// Intent the orchestrator dispatches on, with the confidence backing it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedIntent {
    pub intent: Intent,
    pub confidence: f64,
    /// Whether the verification escalation produced this result.
    pub escalated: bool,
}

/// Confidence-gated intent resolution.
///
/// High-confidence classifications pass through untouched. Low-confidence
/// ones are sent to the generative capability for verification; any failure
/// or unusable reply on that path reverts to the classifier's result, so
/// escalation can refine a turn but never break one.
pub struct IntentRouter {
    llm: Arc<dyn LlmClient>,
    confidence_threshold: f64,
    verify_timeout: Duration,
}

impl IntentRouter {
    pub fn new(llm: Arc<dyn LlmClient>, confidence_threshold: f64, verify_timeout: Duration) -> Self {
        Self { llm, confidence_threshold, verify_timeout }
    }

    pub async fn resolve(&self, text: &str, classification: &Classification) -> ResolvedIntent {
        let original = ResolvedIntent {
            intent: Intent::from_label(&classification.label),
            confidence: classification.confidence,
            escalated: false,
        };

        if classification.confidence >= self.confidence_threshold {
            return original;
        }

        debug!(
            label = %classification.label,
            confidence = classification.confidence,
            "low classifier confidence, escalating to verification"
        );

        let prompt = prompts::verification_prompt(text, classification);
        let reply = match timeout(self.verify_timeout, self.llm.complete(&prompt)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(error)) => {
                warn!(%error, "intent verification failed, keeping classifier result");
                return original;
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.verify_timeout.as_millis() as u64,
                    "intent verification timed out, keeping classifier result"
                );
                return original;
            }
        };

        match parse::parse_verification(&reply) {
            Some((intent, confidence)) => {
                debug!(%intent, confidence, "verification refined the intent");
                ResolvedIntent { intent, confidence, escalated: true }
            }
            None => {
                debug!("verification reply unusable, keeping classifier result");
                original
            }
        }
    }
}
