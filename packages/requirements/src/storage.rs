// ABOUTME: Requirement storage and version lineage manager
// ABOUTME: Every mutation runs in one transaction and re-checks the current-version invariant before commit

use chrono::Utc;
use reqtrack_storage::{
    ensure_exists, ensure_stakeholder_in_project, project_of, EntityType, NewStatusChange,
    StorageError,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::lineage;
use crate::types::{
    Requirement, RequirementCreateInput, RequirementVersion, RequirementWithVersion,
    VersionCreateInput, VersionUpdateInput,
};

pub struct RequirementStorage {
    pool: SqlitePool,
}

impl RequirementStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a requirement together with its mandatory first version
    pub async fn create_requirement(
        &self,
        input: RequirementCreateInput,
    ) -> Result<RequirementWithVersion, StorageError> {
        let mut created = self.create_requirements(vec![input], &[]).await?;
        created.pop().ok_or_else(|| {
            StorageError::InvariantViolation("no requirement was inserted".to_string())
        })
    }

    /// Create several requirements in one transaction, each linked to every
    /// idea in `idea_ids`. All inputs and links are checked before the first
    /// insert; any failure leaves the database untouched.
    pub async fn create_requirements(
        &self,
        inputs: Vec<RequirementCreateInput>,
        idea_ids: &[String],
    ) -> Result<Vec<RequirementWithVersion>, StorageError> {
        for input in &inputs {
            validate_create(input)?;
        }
        for input in &inputs {
            ensure_exists(&self.pool, "projects", "Project", &input.project_id).await?;
            ensure_stakeholder_in_project(
                &self.pool,
                "stakeholder_id",
                &input.stakeholder_id,
                &input.project_id,
            )
            .await?;
            for idea_id in idea_ids {
                let idea_project = project_of(&self.pool, "ideas", "Idea", idea_id).await?;
                if idea_project != input.project_id {
                    return Err(StorageError::invalid(
                        "idea_id",
                        format!("idea '{}' belongs to another project", idea_id),
                    ));
                }
            }
        }

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;
        let mut created = Vec::with_capacity(inputs.len());
        for input in &inputs {
            let requirement_id = insert_requirement(&mut tx, input).await?;
            for idea_id in idea_ids {
                sqlx::query(
                    "INSERT OR IGNORE INTO requirement_ideas (requirement_id, idea_id) VALUES (?, ?)",
                )
                .bind(&requirement_id)
                .bind(idea_id)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;
            }
            created.push(load_with_version(&mut tx, &requirement_id).await?);
        }
        tx.commit().await.map_err(StorageError::Sqlx)?;

        for requirement in &created {
            info!(
                "Created requirement {} with version {:?}",
                requirement.requirement.id, requirement.requirement.current_version_id
            );
        }
        Ok(created)
    }

    pub async fn get_requirement(
        &self,
        requirement_id: &str,
    ) -> Result<RequirementWithVersion, StorageError> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        load_with_version(&mut conn, requirement_id).await
    }

    pub async fn list_requirements(
        &self,
        project_id: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<RequirementWithVersion>, i64), StorageError> {
        debug!("Fetching requirements (project: {:?})", project_id);

        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM requirements WHERE (?1 IS NULL OR project_id = ?1)",
        )
        .bind(project_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

        let requirements = sqlx::query_as::<_, Requirement>(
            r#"
            SELECT * FROM requirements
            WHERE (?1 IS NULL OR project_id = ?1)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(project_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

        let mut results = Vec::with_capacity(requirements.len());
        for requirement in requirements {
            let current_version = lineage::current_version(&mut conn, &requirement.id).await?;
            let idea_ids = lineage::idea_ids(&mut conn, &requirement.id).await?;
            results.push(RequirementWithVersion {
                requirement,
                current_version,
                idea_ids,
            });
        }

        Ok((results, count))
    }

    /// Keyword match on the current version's title, description and category
    pub async fn search_requirements(
        &self,
        project_id: Option<&str>,
        query: &str,
        limit: i64,
    ) -> Result<Vec<RequirementWithVersion>, StorageError> {
        debug!("Searching requirements for {:?} (project: {:?})", query, project_id);

        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT r.id FROM requirements r
            JOIN requirement_versions v ON v.id = r.current_version_id
            WHERE (?1 IS NULL OR r.project_id = ?1)
              AND (v.title LIKE ?2 ESCAPE '\'
                   OR v.description LIKE ?2 ESCAPE '\'
                   OR v.category LIKE ?2 ESCAPE '\')
            ORDER BY r.updated_at DESC, r.rowid DESC
            LIMIT ?3
            "#,
        )
        .bind(project_id)
        .bind(reqtrack_core::like_pattern(query))
        .bind(limit)
        .fetch_all(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            results.push(load_with_version(&mut conn, &id).await?);
        }
        Ok(results)
    }

    /// Delete a requirement with all its versions, links and change requests
    pub async fn delete_requirement(&self, requirement_id: &str) -> Result<(), StorageError> {
        debug!("Deleting requirement: {}", requirement_id);

        let result = sqlx::query("DELETE FROM requirements WHERE id = ?")
            .bind(requirement_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Requirement", requirement_id));
        }

        info!("Deleted requirement {}", requirement_id);
        Ok(())
    }

    /// All versions, newest first
    pub async fn list_versions(
        &self,
        requirement_id: &str,
    ) -> Result<Vec<RequirementVersion>, StorageError> {
        ensure_exists(&self.pool, "requirements", "Requirement", requirement_id).await?;

        sqlx::query_as::<_, RequirementVersion>(
            "SELECT * FROM requirement_versions WHERE requirement_id = ? ORDER BY version_number DESC",
        )
        .bind(requirement_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }

    pub async fn get_version(
        &self,
        requirement_id: &str,
        version_id: &str,
    ) -> Result<RequirementVersion, StorageError> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        lineage::version_of(&mut conn, requirement_id, version_id).await
    }

    /// Append a version. It stays non-current unless `make_current` is set.
    pub async fn add_version(
        &self,
        requirement_id: &str,
        input: VersionCreateInput,
    ) -> Result<RequirementVersion, StorageError> {
        input.fields.validate()?;
        let project_id =
            project_of(&self.pool, "requirements", "Requirement", requirement_id).await?;
        ensure_stakeholder_in_project(
            &self.pool,
            "stakeholder_id",
            &input.stakeholder_id,
            &project_id,
        )
        .await?;

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let mut version = lineage::insert_version(
            &mut tx,
            requirement_id,
            &input.stakeholder_id,
            &input.fields,
            false,
        )
        .await?;

        if input.make_current {
            lineage::promote(&mut tx, requirement_id, &version.id).await?;
            version = lineage::version_of(&mut tx, requirement_id, &version.id).await?;
        }

        NewStatusChange::new(EntityType::RequirementVersion, &version.id, version.status.as_str())
            .by(Some(input.stakeholder_id.as_str()))
            .record(&mut *tx)
            .await?;

        lineage::verify(&mut tx, requirement_id).await?;
        tx.commit().await.map_err(StorageError::Sqlx)?;

        info!(
            "Added version {} (#{}) to requirement {}",
            version.id, version.version_number, requirement_id
        );
        Ok(version)
    }

    /// Make `version_id` the single current version of the requirement
    pub async fn set_current_version(
        &self,
        requirement_id: &str,
        version_id: &str,
    ) -> Result<RequirementWithVersion, StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        lineage::promote(&mut tx, requirement_id, version_id).await?;
        lineage::verify(&mut tx, requirement_id).await?;
        let updated = load_with_version(&mut tx, requirement_id).await?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        info!("Requirement {} now at version {}", requirement_id, version_id);
        Ok(updated)
    }

    /// Delete a version other than the last remaining one.
    ///
    /// When the current version goes, the highest remaining version number
    /// takes over as current.
    pub async fn delete_version(
        &self,
        requirement_id: &str,
        version_id: &str,
    ) -> Result<RequirementWithVersion, StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let version = lineage::version_of(&mut tx, requirement_id, version_id).await?;

        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM requirement_versions WHERE requirement_id = ?")
                .bind(requirement_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;

        if remaining <= 1 {
            return Err(StorageError::InvariantViolation(format!(
                "version {} is the only version of requirement {}",
                version_id, requirement_id
            )));
        }

        sqlx::query("DELETE FROM requirement_versions WHERE id = ?")
            .bind(version_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        if version.is_current {
            let fallback: String = sqlx::query_scalar(
                r#"
                SELECT id FROM requirement_versions
                WHERE requirement_id = ?
                ORDER BY version_number DESC
                LIMIT 1
                "#,
            )
            .bind(requirement_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

            debug!("Current version deleted, falling back to {}", fallback);
            lineage::promote(&mut tx, requirement_id, &fallback).await?;
        }

        lineage::verify(&mut tx, requirement_id).await?;
        let updated = load_with_version(&mut tx, requirement_id).await?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        info!("Deleted version {} of requirement {}", version_id, requirement_id);
        Ok(updated)
    }

    /// Edit a version in place.
    ///
    /// Status can always change. Content of a superseded version (older than
    /// the current one) is frozen.
    pub async fn update_version(
        &self,
        requirement_id: &str,
        version_id: &str,
        input: VersionUpdateInput,
    ) -> Result<RequirementVersion, StorageError> {
        input.validate()?;
        if let Some(stakeholder_id) = &input.stakeholder_id {
            let project_id =
                project_of(&self.pool, "requirements", "Requirement", requirement_id).await?;
            ensure_stakeholder_in_project(&self.pool, "stakeholder_id", stakeholder_id, &project_id)
                .await?;
        }

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let existing = lineage::version_of(&mut tx, requirement_id, version_id).await?;

        if input.touches_content() {
            let current = lineage::current_version(&mut tx, requirement_id).await?;
            if let Some(current) = current {
                if existing.version_number < current.version_number {
                    return Err(StorageError::InvariantViolation(format!(
                        "version {} is superseded by version {}; only its status can change",
                        existing.version_number, current.version_number
                    )));
                }
            }
        }

        let updated = sqlx::query_as::<_, RequirementVersion>(
            r#"
            UPDATE requirement_versions SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                category = COALESCE(?, category),
                type = COALESCE(?, type),
                status = COALESCE(?, status),
                priority = COALESCE(?, priority),
                conflicts = COALESCE(?, conflicts),
                dependencies = COALESCE(?, dependencies),
                stakeholder_id = COALESCE(?, stakeholder_id),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(input.title.map(|v| v.trim().to_string()))
        .bind(input.description.map(|v| v.trim().to_string()))
        .bind(input.category.map(|v| v.trim().to_string()))
        .bind(input.req_type)
        .bind(input.status)
        .bind(input.priority)
        .bind(input.conflicts)
        .bind(input.dependencies)
        .bind(input.stakeholder_id)
        .bind(Utc::now())
        .bind(version_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        if updated.status != existing.status {
            NewStatusChange::new(EntityType::RequirementVersion, &updated.id, updated.status.as_str())
                .from_status(existing.status.as_str())
                .by(input.changed_by.as_deref())
                .record(&mut *tx)
                .await?;
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;
        Ok(updated)
    }

    pub async fn link_idea(
        &self,
        requirement_id: &str,
        idea_id: &str,
    ) -> Result<RequirementWithVersion, StorageError> {
        let project_id =
            project_of(&self.pool, "requirements", "Requirement", requirement_id).await?;
        let idea_project = project_of(&self.pool, "ideas", "Idea", idea_id).await?;
        if idea_project != project_id {
            return Err(StorageError::invalid(
                "idea_id",
                format!("idea '{}' belongs to another project", idea_id),
            ));
        }

        debug!("Linking idea {} to requirement {}", idea_id, requirement_id);

        sqlx::query("INSERT OR IGNORE INTO requirement_ideas (requirement_id, idea_id) VALUES (?, ?)")
            .bind(requirement_id)
            .bind(idea_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        self.get_requirement(requirement_id).await
    }

    pub async fn unlink_idea(
        &self,
        requirement_id: &str,
        idea_id: &str,
    ) -> Result<RequirementWithVersion, StorageError> {
        debug!("Unlinking idea {} from requirement {}", idea_id, requirement_id);

        let result =
            sqlx::query("DELETE FROM requirement_ideas WHERE requirement_id = ? AND idea_id = ?")
                .bind(requirement_id)
                .bind(idea_id)
                .execute(&self.pool)
                .await
                .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!(
                "Link between requirement '{}' and idea '{}'",
                requirement_id, idea_id
            )));
        }

        self.get_requirement(requirement_id).await
    }
}

fn validate_create(input: &RequirementCreateInput) -> Result<(), StorageError> {
    let mut errors = Vec::new();
    if let Err(field_errors) = input.initial_version.validate() {
        errors.extend(field_errors);
    }
    errors.extend(reqtrack_core::require_non_empty(
        "stakeholder_id",
        &input.stakeholder_id,
    ));
    if errors.is_empty() {
        Ok(())
    } else {
        Err(StorageError::Validation(errors))
    }
}

/// Insert the requirement row and its first version, promoted to current
async fn insert_requirement(
    conn: &mut SqliteConnection,
    input: &RequirementCreateInput,
) -> Result<String, StorageError> {
    let requirement_id = reqtrack_core::generate_id("req");
    let now = Utc::now();

    debug!("Creating requirement: {}", requirement_id);

    sqlx::query(
        r#"
        INSERT INTO requirements (id, project_id, last_version_number, created_at, updated_at)
        VALUES (?, ?, 0, ?, ?)
        "#,
    )
    .bind(&requirement_id)
    .bind(&input.project_id)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    let version = lineage::insert_version(
        &mut *conn,
        &requirement_id,
        &input.stakeholder_id,
        &input.initial_version,
        true,
    )
    .await?;

    sqlx::query("UPDATE requirements SET current_version_id = ? WHERE id = ?")
        .bind(&version.id)
        .bind(&requirement_id)
        .execute(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    NewStatusChange::new(EntityType::RequirementVersion, &version.id, version.status.as_str())
        .by(Some(input.stakeholder_id.as_str()))
        .record(&mut *conn)
        .await?;

    lineage::verify(&mut *conn, &requirement_id).await?;
    Ok(requirement_id)
}

async fn load_with_version(
    conn: &mut SqliteConnection,
    requirement_id: &str,
) -> Result<RequirementWithVersion, StorageError> {
    let requirement = sqlx::query_as::<_, Requirement>("SELECT * FROM requirements WHERE id = ?")
        .bind(requirement_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?
        .ok_or_else(|| StorageError::not_found("Requirement", requirement_id))?;

    let current_version = lineage::current_version(conn, requirement_id).await?;
    let idea_ids = lineage::idea_ids(conn, requirement_id).await?;

    Ok(RequirementWithVersion {
        requirement,
        current_version,
        idea_ids,
    })
}
