pub mod state;
pub mod store;

pub use state::{ConversationState, Message, Role};
pub use store::{
    generate_session_id, MemoryBackend, SessionBackend, SessionStore, SessionStoreError,
    DEFAULT_SESSION_TTL,
};
