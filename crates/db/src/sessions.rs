use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use safiri_core::{ConversationState, SessionBackend, SessionStoreError};

use crate::DbPool;

/// Durable session backend on SQLite. One row per `(user_id, session_id)`
/// holding the JSON-serialized state; rows past `expires_at` are treated as
/// absent on every read and can be reclaimed with `purge_expired`.
pub struct SqlSessionBackend {
    pool: DbPool,
}

impl SqlSessionBackend {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Deletes expired rows; returns how many were removed. Intended for a
    /// periodic maintenance task, not for the turn path.
    pub async fn purge_expired(&self) -> Result<u64, SessionStoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SessionBackend for SqlSessionBackend {
    async fn load(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<ConversationState>, SessionStoreError> {
        let row: Option<String> = sqlx::query_scalar(
            "SELECT state_json FROM sessions \
             WHERE user_id = ?1 AND session_id = ?2 AND expires_at > ?3",
        )
        .bind(user_id)
        .bind(session_id)
        .bind(Utc::now().timestamp())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(state_json) => Ok(Some(serde_json::from_str(&state_json)?)),
            None => Ok(None),
        }
    }

    async fn store(
        &self,
        state: &ConversationState,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let state_json = serde_json::to_string(state)?;
        let now = Utc::now().timestamp();
        let expires_at = now.saturating_add(ttl.as_secs() as i64);

        sqlx::query(
            "INSERT INTO sessions (user_id, session_id, state_json, expires_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(user_id, session_id) DO UPDATE SET \
                 state_json = excluded.state_json, \
                 expires_at = excluded.expires_at, \
                 updated_at = excluded.updated_at",
        )
        .bind(&state.user_id)
        .bind(&state.session_id)
        .bind(state_json)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn remove(&self, user_id: &str, session_id: &str) -> Result<(), SessionStoreError> {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?1 AND session_id = ?2")
            .bind(user_id)
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn session_ids(&self, user_id: &str) -> Result<Vec<String>, SessionStoreError> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT session_id FROM sessions \
             WHERE user_id = ?1 AND expires_at > ?2 \
             ORDER BY updated_at, session_id",
        )
        .bind(user_id)
        .bind(Utc::now().timestamp())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(ids)
    }
}

fn db_error(error: sqlx::Error) -> SessionStoreError {
    SessionStoreError::Backend(error.to_string())
}
