// ABOUTME: Change request storage and workflow
// ABOUTME: Guarded PENDING/APPROVED/REJECTED/IMPLEMENTED transitions plus an explicit administrative override

use chrono::Utc;
use reqtrack_storage::{
    ensure_stakeholder_in_project, project_of, EntityType, NewStatusChange, StorageError,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::lineage;
use crate::types::{
    ApproveInput, ChangeRequest, ChangeRequestCreateInput, ChangeRequestFilter,
    ChangeRequestStatus, ChangeRequestUpdateInput, ForceStatusInput, ImplementInput, RejectInput,
    RequirementStatus,
};

const OVERRIDE_NOTE: &str = "Administrative override";

pub struct ChangeRequestStorage {
    pool: SqlitePool,
}

impl ChangeRequestStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_change_requests(
        &self,
        filter: &ChangeRequestFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ChangeRequest>, i64), StorageError> {
        debug!("Fetching change requests ({:?})", filter);

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM change_requests
            WHERE (?1 IS NULL OR requirement_id = ?1)
              AND (?2 IS NULL OR stakeholder_id = ?2)
              AND (?3 IS NULL OR status = ?3)
            "#,
        )
        .bind(&filter.requirement_id)
        .bind(&filter.stakeholder_id)
        .bind(filter.status)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let change_requests = sqlx::query_as::<_, ChangeRequest>(
            r#"
            SELECT * FROM change_requests
            WHERE (?1 IS NULL OR requirement_id = ?1)
              AND (?2 IS NULL OR stakeholder_id = ?2)
              AND (?3 IS NULL OR status = ?3)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?4 OFFSET ?5
            "#,
        )
        .bind(&filter.requirement_id)
        .bind(&filter.stakeholder_id)
        .bind(filter.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok((change_requests, count))
    }

    /// Change requests a stakeholder raised that still await a decision
    pub async fn pending_for_stakeholder(
        &self,
        stakeholder_id: &str,
    ) -> Result<Vec<ChangeRequest>, StorageError> {
        let filter = ChangeRequestFilter {
            stakeholder_id: Some(stakeholder_id.to_string()),
            status: Some(ChangeRequestStatus::Pending),
            ..Default::default()
        };
        let (pending, _) = self.list_change_requests(&filter, i64::MAX, 0).await?;
        Ok(pending)
    }

    pub async fn get_change_request(&self, id: &str) -> Result<ChangeRequest, StorageError> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        fetch(&mut conn, id).await
    }

    /// Open a change request against an existing version of a requirement.
    /// The status always starts at PENDING.
    pub async fn create_change_request(
        &self,
        input: ChangeRequestCreateInput,
    ) -> Result<ChangeRequest, StorageError> {
        input.validate()?;
        let project_id =
            project_of(&self.pool, "requirements", "Requirement", &input.requirement_id).await?;
        ensure_stakeholder_in_project(
            &self.pool,
            "stakeholder_id",
            &input.stakeholder_id,
            &project_id,
        )
        .await?;

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        lineage::version_of(&mut tx, &input.requirement_id, &input.base_version_id).await?;
        if let Some(next_version_id) = &input.next_version_id {
            lineage::version_of(&mut tx, &input.requirement_id, next_version_id).await?;
        }

        let proposed_changes = input
            .proposed_changes
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let id = reqtrack_core::generate_id("cr");
        let now = Utc::now();

        debug!(
            "Creating change request {} for requirement {} (base {})",
            id, input.requirement_id, input.base_version_id
        );

        let change_request = sqlx::query_as::<_, ChangeRequest>(
            r#"
            INSERT INTO change_requests (
                id, requirement_id, stakeholder_id, base_version_id, next_version_id,
                title, summary, cost, benefit, proposed_changes, status, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&input.requirement_id)
        .bind(&input.stakeholder_id)
        .bind(&input.base_version_id)
        .bind(&input.next_version_id)
        .bind(&input.title)
        .bind(input.summary.trim())
        .bind(&input.cost)
        .bind(&input.benefit)
        .bind(proposed_changes)
        .bind(ChangeRequestStatus::Pending)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        NewStatusChange::new(
            EntityType::ChangeRequest,
            &change_request.id,
            ChangeRequestStatus::Pending.as_str(),
        )
        .by(Some(input.stakeholder_id.as_str()))
        .record(&mut *tx)
        .await?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        info!("Created change request {}", change_request.id);
        Ok(change_request)
    }

    /// Approve a pending change request.
    ///
    /// A new version is created and linked as `next_version_id`. Its content
    /// is `input.next_version` laid over the stored proposed changes, or over
    /// the base version (as a fresh DRAFT) when nothing was proposed. An
    /// already linked next version is kept when no content is available at
    /// all. The requirement's current version is left alone.
    pub async fn approve(
        &self,
        id: &str,
        input: ApproveInput,
    ) -> Result<ChangeRequest, StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let change_request = fetch(&mut tx, id).await?;
        guard(&change_request, ChangeRequestStatus::Approved)?;

        if let Some(approver) = &input.approved_by {
            let project_id = project_of(
                &mut *tx,
                "requirements",
                "Requirement",
                &change_request.requirement_id,
            )
            .await?;
            ensure_stakeholder_in_project(&mut *tx, "approved_by", approver, &project_id).await?;
        }

        let fields = match (&input.next_version, &change_request.proposed_changes) {
            (Some(patch), Some(proposed)) => Some(patch.apply(proposed.clone())),
            (Some(patch), None) => {
                let base = lineage::version_of(
                    &mut tx,
                    &change_request.requirement_id,
                    &change_request.base_version_id,
                )
                .await?;
                let mut fields = base.fields();
                fields.status = RequirementStatus::default();
                Some(patch.apply(fields))
            }
            (None, proposed) => proposed.clone(),
        };

        let next_version_id = match (fields, &change_request.next_version_id) {
            (Some(fields), _) => {
                fields.validate()?;
                let author = input
                    .approved_by
                    .as_deref()
                    .unwrap_or(&change_request.stakeholder_id);
                let version = lineage::insert_version(
                    &mut tx,
                    &change_request.requirement_id,
                    author,
                    &fields,
                    false,
                )
                .await?;

                NewStatusChange::new(
                    EntityType::RequirementVersion,
                    &version.id,
                    version.status.as_str(),
                )
                .by(Some(author))
                .record(&mut *tx)
                .await?;

                version.id
            }
            (None, Some(existing)) => existing.clone(),
            (None, None) => {
                return Err(StorageError::invalid(
                    "next_version",
                    "approval needs version content or a linked next version",
                ));
            }
        };

        let approved = set_status(
            &mut tx,
            &change_request,
            ChangeRequestStatus::Approved,
            Some(next_version_id.as_str()),
            input.approved_by.as_deref(),
            input.notes.as_deref(),
        )
        .await?;

        lineage::verify(&mut tx, &change_request.requirement_id).await?;
        tx.commit().await.map_err(StorageError::Sqlx)?;

        info!(
            "Approved change request {} (next version {})",
            id, next_version_id
        );
        Ok(approved)
    }

    /// Reject a pending change request. `next_version_id` is left as it is.
    pub async fn reject(&self, id: &str, input: RejectInput) -> Result<ChangeRequest, StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let change_request = fetch(&mut tx, id).await?;
        guard(&change_request, ChangeRequestStatus::Rejected)?;

        let rejected = set_status(
            &mut tx,
            &change_request,
            ChangeRequestStatus::Rejected,
            change_request.next_version_id.as_deref(),
            input.rejected_by.as_deref(),
            input.notes.as_deref(),
        )
        .await?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        info!("Rejected change request {}", id);
        Ok(rejected)
    }

    /// Mark an approved change request implemented, optionally promoting its
    /// next version to current in the same transaction
    pub async fn implement(
        &self,
        id: &str,
        input: ImplementInput,
    ) -> Result<ChangeRequest, StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let change_request = fetch(&mut tx, id).await?;
        guard(&change_request, ChangeRequestStatus::Implemented)?;

        if input.promote {
            let next_version_id = change_request.next_version_id.as_deref().ok_or_else(|| {
                StorageError::InvariantViolation(format!(
                    "change request {} has no next version to promote",
                    id
                ))
            })?;
            lineage::promote(&mut tx, &change_request.requirement_id, next_version_id).await?;
        }

        let implemented = set_status(
            &mut tx,
            &change_request,
            ChangeRequestStatus::Implemented,
            change_request.next_version_id.as_deref(),
            input.implemented_by.as_deref(),
            None,
        )
        .await?;

        lineage::verify(&mut tx, &change_request.requirement_id).await?;
        tx.commit().await.map_err(StorageError::Sqlx)?;

        info!("Implemented change request {} (promoted: {})", id, input.promote);
        Ok(implemented)
    }

    /// Edit descriptive fields. Status changes go through the workflow
    /// methods or `force_status`.
    pub async fn update_change_request(
        &self,
        id: &str,
        input: ChangeRequestUpdateInput,
    ) -> Result<ChangeRequest, StorageError> {
        debug!("Updating change request: {}", id);

        if let Some(summary) = &input.summary {
            if let Some(error) = reqtrack_core::require_non_empty("summary", summary) {
                return Err(StorageError::Validation(vec![error]));
            }
        }

        sqlx::query_as::<_, ChangeRequest>(
            r#"
            UPDATE change_requests SET
                title = COALESCE(?, title),
                summary = COALESCE(?, summary),
                cost = COALESCE(?, cost),
                benefit = COALESCE(?, benefit),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(input.title)
        .bind(input.summary.map(|s| s.trim().to_string()))
        .bind(input.cost)
        .bind(input.benefit)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?
        .ok_or_else(|| StorageError::not_found("Change request", id))
    }

    /// Set any status, ignoring the transition rules.
    ///
    /// Meant for manual correction only. The change is logged at warn level
    /// and audited as an administrative override.
    pub async fn force_status(
        &self,
        id: &str,
        input: ForceStatusInput,
    ) -> Result<ChangeRequest, StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let change_request = fetch(&mut tx, id).await?;

        warn!(
            change_request_id = %id,
            from = %change_request.status.as_str(),
            to = %input.status.as_str(),
            "Forcing change request status"
        );

        let notes = match &input.notes {
            Some(reason) => format!("{}: {}", OVERRIDE_NOTE, reason),
            None => OVERRIDE_NOTE.to_string(),
        };

        let forced = set_status(
            &mut tx,
            &change_request,
            input.status,
            change_request.next_version_id.as_deref(),
            input.changed_by.as_deref(),
            Some(notes.as_str()),
        )
        .await?;

        tx.commit().await.map_err(StorageError::Sqlx)?;
        Ok(forced)
    }

    pub async fn delete_change_request(&self, id: &str) -> Result<(), StorageError> {
        debug!("Deleting change request: {}", id);

        let result = sqlx::query("DELETE FROM change_requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Change request", id));
        }
        Ok(())
    }
}

async fn fetch(conn: &mut SqliteConnection, id: &str) -> Result<ChangeRequest, StorageError> {
    sqlx::query_as::<_, ChangeRequest>("SELECT * FROM change_requests WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?
        .ok_or_else(|| StorageError::not_found("Change request", id))
}

fn guard(change_request: &ChangeRequest, to: ChangeRequestStatus) -> Result<(), StorageError> {
    if change_request.status.can_transition_to(to) {
        Ok(())
    } else {
        Err(StorageError::InvalidTransition {
            from: change_request.status.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}

async fn set_status(
    conn: &mut SqliteConnection,
    change_request: &ChangeRequest,
    status: ChangeRequestStatus,
    next_version_id: Option<&str>,
    changed_by: Option<&str>,
    notes: Option<&str>,
) -> Result<ChangeRequest, StorageError> {
    let updated = sqlx::query_as::<_, ChangeRequest>(
        r#"
        UPDATE change_requests
        SET status = ?, next_version_id = ?, updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(status)
    .bind(next_version_id)
    .bind(Utc::now())
    .bind(&change_request.id)
    .fetch_one(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    let mut entry = NewStatusChange::new(EntityType::ChangeRequest, &updated.id, status.as_str())
        .from_status(change_request.status.as_str())
        .by(changed_by);
    if let Some(notes) = notes {
        entry = entry.with_notes(notes);
    }
    entry.record(&mut *conn).await?;

    Ok(updated)
}
