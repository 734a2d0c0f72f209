//! Read-only access to stored resume versions.
//!
//! `AppState` holds an `Arc<dyn VersionStore>`; production uses
//! `PgVersionStore`, tests plug in an in-memory store.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::resume_version::{ResumeVersion, ResumeVersionRow, VersionHistoryEntry};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt version record: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait VersionStore: Send + Sync {
    /// `Ok(None)` when no version has this id.
    async fn fetch_version(&self, id: Uuid) -> Result<Option<ResumeVersion>, StoreError>;

    /// The `limit` most recent versions of `owner_id`, newest first,
    /// ties broken by descending id.
    async fn list_recent(
        &self,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<VersionHistoryEntry>, StoreError>;
}

/// Postgres-backed store over the `resume_versions` table.
pub struct PgVersionStore {
    pool: PgPool,
}

impl PgVersionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VersionStore for PgVersionStore {
    async fn fetch_version(&self, id: Uuid) -> Result<Option<ResumeVersion>, StoreError> {
        let row = sqlx::query_as::<_, ResumeVersionRow>(
            r#"
            SELECT id, user_id, version_name, original_content, customized_content,
                   skills, match_score, created_at
            FROM resume_versions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            r.into_version()
                .map_err(|e| StoreError::Corrupt(format!("version {id}: skills: {e}")))
        })
        .transpose()
    }

    async fn list_recent(
        &self,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<VersionHistoryEntry>, StoreError> {
        Ok(sqlx::query_as::<_, VersionHistoryEntry>(
            r#"
            SELECT id, version_name, match_score, created_at
            FROM resume_versions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }
}
