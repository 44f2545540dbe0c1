// ABOUTME: Transaction-scoped building blocks for requirement version lineage
// ABOUTME: Version insertion, promotion and the one-current-version check, all on an open connection

use chrono::Utc;
use reqtrack_storage::StorageError;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::types::{RequirementVersion, VersionFields};

/// Load a version and make sure it belongs to `requirement_id`
pub async fn version_of(
    conn: &mut SqliteConnection,
    requirement_id: &str,
    version_id: &str,
) -> Result<RequirementVersion, StorageError> {
    let version = sqlx::query_as::<_, RequirementVersion>(
        "SELECT * FROM requirement_versions WHERE id = ? AND requirement_id = ?",
    )
    .bind(version_id)
    .bind(requirement_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    version.ok_or_else(|| {
        StorageError::NotFound(format!(
            "Version '{}' of requirement '{}'",
            version_id, requirement_id
        ))
    })
}

/// Insert the next version of a requirement.
///
/// The number comes from the requirement's `last_version_number` counter,
/// so numbers stay monotonic even after versions are deleted.
pub async fn insert_version(
    conn: &mut SqliteConnection,
    requirement_id: &str,
    stakeholder_id: &str,
    fields: &VersionFields,
    is_current: bool,
) -> Result<RequirementVersion, StorageError> {
    let now = Utc::now();

    let version_number: i64 = sqlx::query_scalar(
        r#"
        UPDATE requirements
        SET last_version_number = last_version_number + 1, updated_at = ?
        WHERE id = ?
        RETURNING last_version_number
        "#,
    )
    .bind(now)
    .bind(requirement_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?
    .ok_or_else(|| StorageError::not_found("Requirement", requirement_id))?;

    let version_id = reqtrack_core::generate_id("ver");

    debug!(
        "Inserting version {} of requirement {} ({})",
        version_number, requirement_id, version_id
    );

    sqlx::query_as::<_, RequirementVersion>(
        r#"
        INSERT INTO requirement_versions (
            id, requirement_id, stakeholder_id, version_number, title, description,
            category, type, status, priority, conflicts, dependencies, is_current,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&version_id)
    .bind(requirement_id)
    .bind(stakeholder_id)
    .bind(version_number)
    .bind(fields.title.trim())
    .bind(fields.description.trim())
    .bind(fields.category.trim())
    .bind(fields.req_type)
    .bind(fields.status)
    .bind(fields.priority)
    .bind(&fields.conflicts)
    .bind(&fields.dependencies)
    .bind(is_current)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)
}

/// Make `version_id` the only current version and point the requirement at it
pub async fn promote(
    conn: &mut SqliteConnection,
    requirement_id: &str,
    version_id: &str,
) -> Result<(), StorageError> {
    version_of(conn, requirement_id, version_id).await?;

    debug!("Promoting version {} of requirement {}", version_id, requirement_id);

    let now = Utc::now();

    // Clear first: the partial unique index allows one current row at a time
    sqlx::query(
        "UPDATE requirement_versions SET is_current = 0, updated_at = ? WHERE requirement_id = ? AND is_current = 1 AND id != ?",
    )
    .bind(now)
    .bind(requirement_id)
    .bind(version_id)
    .execute(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    sqlx::query("UPDATE requirement_versions SET is_current = 1, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(version_id)
        .execute(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    sqlx::query("UPDATE requirements SET current_version_id = ?, updated_at = ? WHERE id = ?")
        .bind(version_id)
        .bind(now)
        .bind(requirement_id)
        .execute(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    Ok(())
}

/// Check that exactly one version is current and the requirement points at it
pub async fn verify(conn: &mut SqliteConnection, requirement_id: &str) -> Result<(), StorageError> {
    let pointer: Option<Option<String>> =
        sqlx::query_scalar("SELECT current_version_id FROM requirements WHERE id = ?")
            .bind(requirement_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)?;

    let pointer = pointer.ok_or_else(|| StorageError::not_found("Requirement", requirement_id))?;

    let current: Vec<String> = sqlx::query_scalar(
        "SELECT id FROM requirement_versions WHERE requirement_id = ? AND is_current = 1",
    )
    .bind(requirement_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    match (current.as_slice(), pointer.as_deref()) {
        ([only], Some(pointed)) if only == pointed => Ok(()),
        _ => Err(StorageError::InvariantViolation(format!(
            "requirement {} has current versions {:?} but points at {:?}",
            requirement_id, current, pointer
        ))),
    }
}

/// The current version of a requirement, if it has one
pub async fn current_version(
    conn: &mut SqliteConnection,
    requirement_id: &str,
) -> Result<Option<RequirementVersion>, StorageError> {
    sqlx::query_as::<_, RequirementVersion>(
        "SELECT * FROM requirement_versions WHERE requirement_id = ? AND is_current = 1",
    )
    .bind(requirement_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)
}

/// Ids of the ideas linked to a requirement
pub async fn idea_ids(
    conn: &mut SqliteConnection,
    requirement_id: &str,
) -> Result<Vec<String>, StorageError> {
    sqlx::query_scalar(
        "SELECT idea_id FROM requirement_ideas WHERE requirement_id = ? ORDER BY idea_id",
    )
    .bind(requirement_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)
}
