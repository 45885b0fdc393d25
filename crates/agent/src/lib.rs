//! Conversation runtime: intent routing and per-turn orchestration.
//!
//! This crate is the decision-making layer of the safiri system:
//! - **Intent resolution** (`router`) - confidence-gated classification
//!   with generative verification for low-confidence results
//! - **Prompt contracts** (`prompts`, `parse`) - fixed-field prompts for
//!   verification and slot extraction, with permissive parsers
//! - **Capability seams** (`classify`, `llm`, `retrieval`, `tools`) -
//!   traits the orchestrator calls against; implementations are injected
//! - **Turn orchestration** (`orchestrator`) - session load, flow
//!   continuation or dispatch, response assembly, persistence
//!
//! # Failure principle
//!
//! External capabilities are assumed slow and unreliable. Every call runs
//! under a timeout, and every failure degrades to a fallback value or the
//! standardized apology response. A single turn can disappoint the user
//! but can never crash the conversation.

pub mod classify;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod parse;
pub mod prompts;
pub mod retrieval;
pub mod router;
pub mod tools;

pub use classify::IntentClassifier;
pub use error::CapabilityError;
pub use llm::LlmClient;
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use retrieval::{is_unanswered, Retriever, MIN_ANSWER_CHARS, NO_ANSWER_SENTINEL};
pub use router::{IntentRouter, ResolvedIntent};
pub use tools::{Tool, ToolRegistry};
