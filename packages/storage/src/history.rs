// ABOUTME: Status history audit log
// ABOUTME: Append-only record of status changes, written inside the caller's transaction

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use tracing::debug;

use crate::StorageError;

/// Kind of entity a history entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum EntityType {
    Idea,
    RequirementVersion,
    ChangeRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StatusHistoryEntry {
    pub id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub old_status: Option<String>,
    pub new_status: String,
    pub changed_by_stakeholder_id: Option<String>,
    pub notes: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// A status change about to be recorded
#[derive(Debug, Clone)]
pub struct NewStatusChange<'a> {
    pub entity_type: EntityType,
    pub entity_id: &'a str,
    pub old_status: Option<&'a str>,
    pub new_status: &'a str,
    pub changed_by: Option<&'a str>,
    pub notes: Option<&'a str>,
}

impl<'a> NewStatusChange<'a> {
    pub fn new(entity_type: EntityType, entity_id: &'a str, new_status: &'a str) -> Self {
        Self {
            entity_type,
            entity_id,
            old_status: None,
            new_status,
            changed_by: None,
            notes: None,
        }
    }

    pub fn from_status(mut self, old_status: &'a str) -> Self {
        self.old_status = Some(old_status);
        self
    }

    pub fn by(mut self, stakeholder_id: Option<&'a str>) -> Self {
        self.changed_by = stakeholder_id;
        self
    }

    pub fn with_notes(mut self, notes: &'a str) -> Self {
        self.notes = Some(notes);
        self
    }
}

impl NewStatusChange<'_> {
    /// Append this change using any executor (pool or open transaction)
    pub async fn record<'e, E>(&self, executor: E) -> Result<String, StorageError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = reqtrack_core::generate_id("hist");

        debug!(
            "Recording {:?} {} status change: {:?} -> {}",
            self.entity_type, self.entity_id, self.old_status, self.new_status
        );

        sqlx::query(
            r#"
            INSERT INTO status_history
                (id, entity_type, entity_id, old_status, new_status,
                 changed_by_stakeholder_id, notes, changed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(self.entity_type)
        .bind(self.entity_id)
        .bind(self.old_status)
        .bind(self.new_status)
        .bind(self.changed_by)
        .bind(self.notes)
        .bind(Utc::now())
        .execute(executor)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(id)
    }
}

pub struct StatusHistoryStorage {
    pool: SqlitePool,
}

impl StatusHistoryStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// History of one entity, oldest first
    pub async fn list_for_entity(
        &self,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<Vec<StatusHistoryEntry>, StorageError> {
        debug!("Fetching status history for {:?} {}", entity_type, entity_id);

        sqlx::query_as::<_, StatusHistoryEntry>(
            r#"
            SELECT * FROM status_history
            WHERE entity_type = ? AND entity_id = ?
            ORDER BY changed_at ASC, rowid ASC
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }

    /// Most recent entries across all entities, optionally narrowed to one type
    pub async fn list_recent(
        &self,
        entity_type: Option<EntityType>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<StatusHistoryEntry>, i64), StorageError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM status_history WHERE (?1 IS NULL OR entity_type = ?1)",
        )
        .bind(entity_type)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let entries = sqlx::query_as::<_, StatusHistoryEntry>(
            r#"
            SELECT * FROM status_history
            WHERE (?1 IS NULL OR entity_type = ?1)
            ORDER BY changed_at DESC, rowid DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(entity_type)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok((entries, count))
    }
}
