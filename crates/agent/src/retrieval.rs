use async_trait::async_trait;

use crate::error::CapabilityError;

/// Substring a retriever emits when its corpus has no relevant material.
pub const NO_ANSWER_SENTINEL: &str = "don't have that information";

/// Answers shorter than this (trimmed) are treated as non-answers.
pub const MIN_ANSWER_CHARS: usize = 20;

/// Knowledge-retrieval capability (FAQ corpus, vector store, etc.).
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn answer(&self, query: &str) -> Result<String, CapabilityError>;
}

/// Whether a retrieved answer should escalate to the generative fallback.
pub fn is_unanswered(answer: &str) -> bool {
    let trimmed = answer.trim();
    trimmed.chars().count() < MIN_ANSWER_CHARS
        || trimmed.to_lowercase().contains(NO_ANSWER_SENTINEL)
}
