use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use safiri_core::{FeedbackError, FeedbackRecord, FeedbackSummaryRow};

use crate::DbPool;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] FeedbackError),
}

/// Feedback persistence, independent of the orchestrator's turn path.
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    /// Validates and stores one submission. Validation failures are
    /// reported to the caller unchanged; nothing is retried.
    async fn save(&self, record: FeedbackRecord) -> Result<(), RepositoryError>;

    /// Average rating and submission count per intent, ordered by intent.
    async fn summary(&self) -> Result<Vec<FeedbackSummaryRow>, RepositoryError>;
}

pub struct SqlFeedbackRepository {
    pool: DbPool,
}

impl SqlFeedbackRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedbackRepository for SqlFeedbackRepository {
    async fn save(&self, record: FeedbackRecord) -> Result<(), RepositoryError> {
        record.validate()?;

        sqlx::query(
            "INSERT INTO feedback \
                 (user_id, session_id, intent, message, bot_response, rating, comment, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&record.user_id)
        .bind(&record.session_id)
        .bind(&record.intent)
        .bind(&record.message)
        .bind(&record.bot_response)
        .bind(i64::from(record.rating))
        .bind(&record.comment)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn summary(&self) -> Result<Vec<FeedbackSummaryRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, (String, f64, i64)>(
            "SELECT intent, AVG(rating), COUNT(*) FROM feedback GROUP BY intent ORDER BY intent",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(intent, avg_rating, count)| FeedbackSummaryRow { intent, avg_rating, count })
            .collect())
    }
}

/// In-process stand-in used in tests and when no database is configured.
#[derive(Default)]
pub struct InMemoryFeedbackRepository {
    records: RwLock<Vec<FeedbackRecord>>,
}

#[async_trait]
impl FeedbackRepository for InMemoryFeedbackRepository {
    async fn save(&self, record: FeedbackRecord) -> Result<(), RepositoryError> {
        record.validate()?;
        let mut records = self.records.write().await;
        records.push(record);
        Ok(())
    }

    async fn summary(&self) -> Result<Vec<FeedbackSummaryRow>, RepositoryError> {
        let records = self.records.read().await;
        let mut grouped: BTreeMap<String, (u64, i64)> = BTreeMap::new();
        for record in records.iter() {
            let entry = grouped.entry(record.intent.clone()).or_insert((0, 0));
            entry.0 += u64::from(record.rating);
            entry.1 += 1;
        }
        Ok(grouped
            .into_iter()
            .map(|(intent, (total, count))| FeedbackSummaryRow {
                intent,
                avg_rating: total as f64 / count as f64,
                count,
            })
            .collect())
    }
}
