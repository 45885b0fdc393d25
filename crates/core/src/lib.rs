pub mod config;
pub mod feedback;
pub mod flows;
pub mod intent;
pub mod logging;
pub mod response;
pub mod session;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use feedback::{FeedbackError, FeedbackRecord, FeedbackSummaryRow};
pub use flows::{FlowKind, FlowPrompt, FlowSchema, FlowTurn, SlotSpec};
pub use intent::{Classification, Intent, UnknownIntent};
pub use response::{OrchestratorResponse, ResponseKind};
pub use session::{
    ConversationState, Message, MemoryBackend, Role, SessionBackend, SessionStore,
    SessionStoreError, DEFAULT_SESSION_TTL,
};
