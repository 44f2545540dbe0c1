// ABOUTME: Stakeholder storage layer using SQLite
// ABOUTME: CRUD for stakeholders; deletion hands their ideas, versions and change requests to a colleague

use chrono::Utc;
use reqtrack_storage::{ensure_exists, StorageError};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::types::{Stakeholder, StakeholderCreateInput, StakeholderUpdateInput};
use crate::validator::{validate_stakeholder_create, validate_stakeholder_update};

/// Outcome of deleting a stakeholder
#[derive(Debug, Clone, Serialize)]
pub struct StakeholderDeletion {
    pub id: String,
    /// Stakeholder that inherited the deleted one's references, if any
    pub reassigned_to: Option<String>,
    pub reassigned_rows: u64,
}

pub struct StakeholderStorage {
    pool: SqlitePool,
}

impl StakeholderStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_stakeholders(
        &self,
        project_id: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Stakeholder>, i64), StorageError> {
        debug!("Fetching stakeholders (project: {:?})", project_id);

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM stakeholders WHERE (?1 IS NULL OR project_id = ?1)",
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let stakeholders = sqlx::query_as::<_, Stakeholder>(
            r#"
            SELECT * FROM stakeholders
            WHERE (?1 IS NULL OR project_id = ?1)
            ORDER BY created_at, rowid
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(project_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok((stakeholders, count))
    }

    pub async fn get_stakeholder(&self, stakeholder_id: &str) -> Result<Stakeholder, StorageError> {
        sqlx::query_as::<_, Stakeholder>("SELECT * FROM stakeholders WHERE id = ?")
            .bind(stakeholder_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::not_found("Stakeholder", stakeholder_id))
    }

    /// Earliest stakeholder of a project
    pub async fn first_for_project(
        &self,
        project_id: &str,
    ) -> Result<Option<Stakeholder>, StorageError> {
        sqlx::query_as::<_, Stakeholder>(
            "SELECT * FROM stakeholders WHERE project_id = ? ORDER BY created_at, rowid LIMIT 1",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }

    pub async fn create_stakeholder(
        &self,
        input: StakeholderCreateInput,
    ) -> Result<Stakeholder, StorageError> {
        validate_stakeholder_create(&input)?;
        ensure_exists(&self.pool, "projects", "Project", &input.project_id).await?;

        let stakeholder_id = reqtrack_core::generate_id("stk");
        let now = Utc::now();

        debug!("Creating stakeholder: {} (name: {})", stakeholder_id, input.name);

        sqlx::query_as::<_, Stakeholder>(
            r#"
            INSERT INTO stakeholders (id, project_id, name, email, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&stakeholder_id)
        .bind(&input.project_id)
        .bind(input.name.trim())
        .bind(input.email.trim())
        .bind(input.role.trim())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }

    pub async fn update_stakeholder(
        &self,
        stakeholder_id: &str,
        input: StakeholderUpdateInput,
    ) -> Result<Stakeholder, StorageError> {
        debug!("Updating stakeholder: {}", stakeholder_id);
        validate_stakeholder_update(&input)?;

        sqlx::query_as::<_, Stakeholder>(
            r#"
            UPDATE stakeholders SET
                name = COALESCE(?, name),
                email = COALESCE(?, email),
                role = COALESCE(?, role),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(input.name.map(|v| v.trim().to_string()))
        .bind(input.email.map(|v| v.trim().to_string()))
        .bind(input.role.map(|v| v.trim().to_string()))
        .bind(Utc::now())
        .bind(stakeholder_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?
        .ok_or_else(|| StorageError::not_found("Stakeholder", stakeholder_id))
    }

    /// Delete a stakeholder.
    ///
    /// Ideas, requirement versions and change requests that reference the
    /// stakeholder are moved to the earliest other stakeholder of the same
    /// project. Fails with `InvariantViolation` when references exist and
    /// nobody is left to take them over. Documents simply lose their author.
    pub async fn delete_stakeholder(
        &self,
        stakeholder_id: &str,
    ) -> Result<StakeholderDeletion, StorageError> {
        debug!("Deleting stakeholder: {}", stakeholder_id);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let project_id: String =
            sqlx::query_scalar("SELECT project_id FROM stakeholders WHERE id = ?")
                .bind(stakeholder_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?
                .ok_or_else(|| StorageError::not_found("Stakeholder", stakeholder_id))?;

        let references: i64 = sqlx::query_scalar(
            r#"
            SELECT
                (SELECT COUNT(*) FROM ideas WHERE stakeholder_id = ?1) +
                (SELECT COUNT(*) FROM requirement_versions WHERE stakeholder_id = ?1) +
                (SELECT COUNT(*) FROM change_requests WHERE stakeholder_id = ?1)
            "#,
        )
        .bind(stakeholder_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        let mut reassigned_to = None;
        let mut reassigned_rows = 0;

        if references > 0 {
            let replacement: String = sqlx::query_scalar(
                r#"
                SELECT id FROM stakeholders
                WHERE project_id = ? AND id != ?
                ORDER BY created_at, rowid
                LIMIT 1
                "#,
            )
            .bind(&project_id)
            .bind(stakeholder_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| {
                StorageError::InvariantViolation(format!(
                    "stakeholder {} is still referenced by {} record(s) and project {} has no other stakeholder",
                    stakeholder_id, references, project_id
                ))
            })?;

            for table in ["ideas", "requirement_versions", "change_requests"] {
                let sql = format!("UPDATE {} SET stakeholder_id = ? WHERE stakeholder_id = ?", table);
                let result = sqlx::query(&sql)
                    .bind(&replacement)
                    .bind(stakeholder_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(StorageError::Sqlx)?;
                reassigned_rows += result.rows_affected();
            }

            reassigned_to = Some(replacement);
        }

        sqlx::query("DELETE FROM stakeholders WHERE id = ?")
            .bind(stakeholder_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        info!(
            "Deleted stakeholder {} (reassigned {} record(s) to {:?})",
            stakeholder_id, reassigned_rows, reassigned_to
        );

        Ok(StakeholderDeletion {
            id: stakeholder_id.to_string(),
            reassigned_to,
            reassigned_rows,
        })
    }
}
