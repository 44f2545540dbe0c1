// ABOUTME: Project storage layer using SQLite
// ABOUTME: CRUD for projects; deleting a project cascades to everything it owns

use chrono::Utc;
use reqtrack_storage::StorageError;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::types::{Project, ProjectCreateInput, ProjectUpdateInput};
use crate::validator::{validate_project_create, validate_project_update};

pub struct ProjectStorage {
    pool: SqlitePool,
}

impl ProjectStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List projects, oldest first
    pub async fn list_projects(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Project>, i64), StorageError> {
        debug!("Fetching projects (limit: {}, offset: {})", limit, offset);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let projects = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects ORDER BY created_at, rowid LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok((projects, count))
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Project, StorageError> {
        debug!("Fetching project: {}", project_id);

        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::not_found("Project", project_id))
    }

    /// The earliest created project, used as the default target for generation
    pub async fn first_project(&self) -> Result<Option<Project>, StorageError> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY created_at, rowid LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)
    }

    pub async fn create_project(&self, input: ProjectCreateInput) -> Result<Project, StorageError> {
        validate_project_create(&input)?;

        let project_id = reqtrack_core::generate_id("proj");
        let now = Utc::now();

        debug!("Creating project: {} (title: {})", project_id, input.title);

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (id, title, description, project_status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&project_id)
        .bind(input.title.trim())
        .bind(input.description.unwrap_or_default())
        .bind(input.project_status)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        info!("Created project {}", project.id);
        Ok(project)
    }

    pub async fn update_project(
        &self,
        project_id: &str,
        input: ProjectUpdateInput,
    ) -> Result<Project, StorageError> {
        debug!("Updating project: {}", project_id);
        validate_project_update(&input)?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                project_status = COALESCE(?, project_status),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(input.title.map(|t| t.trim().to_string()))
        .bind(input.description)
        .bind(input.project_status)
        .bind(Utc::now())
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        project.ok_or_else(|| StorageError::not_found("Project", project_id))
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<(), StorageError> {
        debug!("Deleting project: {}", project_id);

        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(project_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Project", project_id));
        }

        info!("Deleted project {}", project_id);
        Ok(())
    }
}
