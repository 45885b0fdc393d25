use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::session::ConversationState;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session backend error: {0}")]
    Backend(String),
    #[error("session state serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable keyed persistence for conversation state.
///
/// Implementations are expected to honor `ttl` on write and to treat
/// expired rows as absent on read.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    async fn load(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<ConversationState>, SessionStoreError>;

    async fn store(
        &self,
        state: &ConversationState,
        ttl: Duration,
    ) -> Result<(), SessionStoreError>;

    async fn remove(&self, user_id: &str, session_id: &str) -> Result<(), SessionStoreError>;

    async fn session_ids(&self, user_id: &str) -> Result<Vec<String>, SessionStoreError>;
}

/// In-process backend. Never fails and ignores TTL; it exists as the
/// always-available fallback and as the test double.
#[derive(Default)]
pub struct MemoryBackend {
    states: RwLock<HashMap<(String, String), ConversationState>>,
}

#[async_trait]
impl SessionBackend for MemoryBackend {
    async fn load(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<ConversationState>, SessionStoreError> {
        let states = self.states.read().await;
        Ok(states.get(&(user_id.to_owned(), session_id.to_owned())).cloned())
    }

    async fn store(
        &self,
        state: &ConversationState,
        _ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let mut states = self.states.write().await;
        states.insert((state.user_id.clone(), state.session_id.clone()), state.clone());
        Ok(())
    }

    async fn remove(&self, user_id: &str, session_id: &str) -> Result<(), SessionStoreError> {
        let mut states = self.states.write().await;
        states.remove(&(user_id.to_owned(), session_id.to_owned()));
        Ok(())
    }

    async fn session_ids(&self, user_id: &str) -> Result<Vec<String>, SessionStoreError> {
        let states = self.states.read().await;
        let mut ids: Vec<String> = states
            .keys()
            .filter(|(uid, _)| uid == user_id)
            .map(|(_, sid)| sid.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

pub fn generate_session_id() -> String {
    format!("sess-{}", Uuid::new_v4())
}

/// Session persistence as seen by the orchestrator.
///
/// Composes an optional durable backend with an in-process fallback map.
/// No operation surfaces a backend error to the caller: a failing durable
/// backend degrades durability for that operation, logs, and the turn
/// continues against the fallback. `save` is idempotent and
/// last-writer-wins per key; concurrent turns on the same session are not
/// serialized here (documented race, see DESIGN.md).
pub struct SessionStore {
    durable: Option<Arc<dyn SessionBackend>>,
    fallback: MemoryBackend,
    ttl: Duration,
}

impl SessionStore {
    /// Store without a durable backend; everything lives in-process.
    pub fn in_process(ttl: Duration) -> Self {
        Self { durable: None, fallback: MemoryBackend::default(), ttl }
    }

    pub fn with_durable(backend: Arc<dyn SessionBackend>, ttl: Duration) -> Self {
        Self { durable: Some(backend), fallback: MemoryBackend::default(), ttl }
    }

    /// Loads the state for `(user_id, session_id)`, creating (and saving) a
    /// fresh one when none exists. A missing `session_id` gets a generated
    /// one.
    pub async fn get_or_create(
        &self,
        user_id: &str,
        session_id: Option<&str>,
    ) -> ConversationState {
        let session_id = match session_id {
            Some(id) => id.to_owned(),
            None => generate_session_id(),
        };

        if let Some(durable) = &self.durable {
            match durable.load(user_id, &session_id).await {
                Ok(Some(state)) => return state,
                Ok(None) => {}
                Err(error) => {
                    warn!(%error, user_id, session_id = %session_id, "durable session load failed, using in-process state");
                }
            }
        }

        if let Ok(Some(state)) = self.fallback.load(user_id, &session_id).await {
            return state;
        }

        let state = ConversationState::new(user_id, session_id);
        self.save(&state).await;
        state
    }

    /// Persists `state` to both layers. Durable failure is logged and the
    /// in-process copy is kept, so an already-loaded state is never lost.
    pub async fn save(&self, state: &ConversationState) {
        if let Some(durable) = &self.durable {
            if let Err(error) = durable.store(state, self.ttl).await {
                warn!(
                    %error,
                    user_id = %state.user_id,
                    session_id = %state.session_id,
                    "durable session save failed, keeping in-process copy"
                );
            }
        }
        // The memory backend cannot fail.
        let _ = self.fallback.store(state, self.ttl).await;
    }

    pub async fn delete(&self, user_id: &str, session_id: &str) {
        if let Some(durable) = &self.durable {
            if let Err(error) = durable.remove(user_id, session_id).await {
                warn!(%error, user_id, session_id, "durable session delete failed");
            }
        }
        let _ = self.fallback.remove(user_id, session_id).await;
    }

    pub async fn list_sessions(&self, user_id: &str) -> Vec<String> {
        if let Some(durable) = &self.durable {
            match durable.session_ids(user_id).await {
                Ok(ids) => return ids,
                Err(error) => {
                    warn!(%error, user_id, "durable session listing failed, using in-process list");
                }
            }
        }
        self.fallback.session_ids(user_id).await.unwrap_or_default()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
