use sqlx::{Executor, Sqlite};

use crate::StorageError;

/// Fail with `NotFound` unless `table` has a row with this id.
///
/// `table` must be one of the schema's table names, never user input.
pub async fn ensure_exists<'e, E>(
    executor: E,
    table: &'static str,
    kind: &str,
    id: &str,
) -> Result<(), StorageError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT 1 FROM {} WHERE id = ?", table);
    let found: Option<i64> = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(StorageError::Sqlx)?;

    match found {
        Some(_) => Ok(()),
        None => Err(StorageError::not_found(kind, id)),
    }
}

/// Project that owns a row of a project-scoped table
pub async fn project_of<'e, E>(
    executor: E,
    table: &'static str,
    kind: &str,
    id: &str,
) -> Result<String, StorageError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT project_id FROM {} WHERE id = ?", table);
    let project_id: Option<String> = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(StorageError::Sqlx)?;

    project_id.ok_or_else(|| StorageError::not_found(kind, id))
}

/// `NotFound` for an unknown stakeholder, a validation error on `field`
/// when the stakeholder belongs to a different project
pub async fn ensure_stakeholder_in_project<'e, E>(
    executor: E,
    field: &str,
    stakeholder_id: &str,
    project_id: &str,
) -> Result<(), StorageError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let owner = project_of(executor, "stakeholders", "Stakeholder", stakeholder_id).await?;
    if owner != project_id {
        return Err(StorageError::invalid(
            field,
            format!(
                "stakeholder '{}' is not a member of project '{}'",
                stakeholder_id, project_id
            ),
        ));
    }
    Ok(())
}
