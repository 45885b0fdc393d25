use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FeedbackError {
    #[error("rating must be between {MIN_RATING} and {MAX_RATING}, got {0}")]
    InvalidRating(u8),
    #[error("feedback user_id must not be empty")]
    MissingUserId,
}

/// One user rating of an assistant turn. Collected outside the
/// orchestrator; stored by the feedback repository.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub user_id: String,
    pub session_id: String,
    pub intent: String,
    pub message: String,
    pub bot_response: String,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FeedbackRecord {
    /// Rejects malformed submissions before they reach storage. Validation
    /// failures are reported to the caller, never retried.
    pub fn validate(&self) -> Result<(), FeedbackError> {
        if self.user_id.trim().is_empty() {
            return Err(FeedbackError::MissingUserId);
        }
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(FeedbackError::InvalidRating(self.rating));
        }
        Ok(())
    }
}

/// Average rating per intent, as produced by the feedback summary query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSummaryRow {
    pub intent: String,
    pub avg_rating: f64,
    pub count: i64,
}
