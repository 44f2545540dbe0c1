// ABOUTME: Idea storage layer using SQLite
// ABOUTME: CRUD with status history and ICE-ranked queries computed in SQL

use chrono::Utc;
use reqtrack_storage::{
    ensure_exists, ensure_stakeholder_in_project, EntityType, NewStatusChange, StorageError,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::types::{Idea, IdeaCreateInput, IdeaFilter, IdeaStatus, IdeaUpdateInput};

pub struct IdeaStorage {
    pool: SqlitePool,
}

impl IdeaStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_ideas(
        &self,
        filter: &IdeaFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Idea>, i64), StorageError> {
        debug!("Fetching ideas ({:?})", filter);

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM ideas
            WHERE (?1 IS NULL OR project_id = ?1) AND (?2 IS NULL OR status = ?2)
            "#,
        )
        .bind(&filter.project_id)
        .bind(filter.status)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let ideas = sqlx::query_as::<_, Idea>(
            r#"
            SELECT * FROM ideas
            WHERE (?1 IS NULL OR project_id = ?1) AND (?2 IS NULL OR status = ?2)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(&filter.project_id)
        .bind(filter.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok((ideas, count))
    }

    /// Highest ICE score first; ideas without a score sort last
    pub async fn top_by_ice(&self, project_id: &str, limit: i64) -> Result<Vec<Idea>, StorageError> {
        debug!("Fetching top {} ideas by ICE for project {}", limit, project_id);

        sqlx::query_as::<_, Idea>(
            r#"
            SELECT *, CAST(impact * confidence AS REAL) / NULLIF(effort, 0) AS ice
            FROM ideas
            WHERE project_id = ?
            ORDER BY ice DESC, created_at, rowid
            LIMIT ?
            "#,
        )
        .bind(project_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }

    /// Case-insensitive keyword match on title, description and category
    pub async fn search_ideas(
        &self,
        project_id: Option<&str>,
        query: &str,
        limit: i64,
    ) -> Result<Vec<Idea>, StorageError> {
        debug!("Searching ideas for {:?} (project: {:?})", query, project_id);

        sqlx::query_as::<_, Idea>(
            r#"
            SELECT * FROM ideas
            WHERE (?1 IS NULL OR project_id = ?1)
              AND (title LIKE ?2 ESCAPE '\'
                   OR description LIKE ?2 ESCAPE '\'
                   OR category LIKE ?2 ESCAPE '\')
            ORDER BY updated_at DESC, rowid DESC
            LIMIT ?3
            "#,
        )
        .bind(project_id)
        .bind(reqtrack_core::like_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }

    pub async fn get_idea(&self, idea_id: &str) -> Result<Idea, StorageError> {
        sqlx::query_as::<_, Idea>("SELECT * FROM ideas WHERE id = ?")
            .bind(idea_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::not_found("Idea", idea_id))
    }

    /// Fetch the ideas that exist among `idea_ids`, silently skipping unknown ids
    pub async fn get_existing(&self, idea_ids: &[String]) -> Result<Vec<Idea>, StorageError> {
        let mut ideas = Vec::with_capacity(idea_ids.len());
        for idea_id in idea_ids {
            let idea = sqlx::query_as::<_, Idea>("SELECT * FROM ideas WHERE id = ?")
                .bind(idea_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(StorageError::Sqlx)?;
            ideas.extend(idea);
        }
        Ok(ideas)
    }

    pub async fn create_idea(&self, input: IdeaCreateInput) -> Result<Idea, StorageError> {
        let mut created = self.create_ideas(vec![input]).await?;
        created
            .pop()
            .ok_or_else(|| StorageError::InvariantViolation("no idea was inserted".to_string()))
    }

    /// Store a batch of ideas in one transaction. Every input is validated
    /// before the first insert, so a bad entry leaves nothing behind.
    pub async fn create_ideas(&self, inputs: Vec<IdeaCreateInput>) -> Result<Vec<Idea>, StorageError> {
        for input in &inputs {
            input.validate()?;
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
        }

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;
        let mut created = Vec::with_capacity(inputs.len());
        for input in &inputs {
            created.push(insert_idea(&mut tx, input).await?);
        }
        tx.commit().await.map_err(StorageError::Sqlx)?;

        for idea in &created {
            info!("Created idea {} (ice: {:?})", idea.id, idea.ice_score);
        }
        Ok(created)
    }

    pub async fn update_idea(
        &self,
        idea_id: &str,
        input: IdeaUpdateInput,
    ) -> Result<Idea, StorageError> {
        debug!("Updating idea: {}", idea_id);
        input.validate()?;

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let old_status: IdeaStatus = sqlx::query_scalar("SELECT status FROM ideas WHERE id = ?")
            .bind(idea_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::not_found("Idea", idea_id))?;

        let idea = sqlx::query_as::<_, Idea>(
            r#"
            UPDATE ideas SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                category = COALESCE(?, category),
                conflicts = COALESCE(?, conflicts),
                dependencies = COALESCE(?, dependencies),
                status = COALESCE(?, status),
                priority = COALESCE(?, priority),
                impact = COALESCE(?, impact),
                confidence = COALESCE(?, confidence),
                effort = COALESCE(?, effort),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(input.title)
        .bind(input.description)
        .bind(input.category.map(|c| c.trim().to_string()))
        .bind(input.conflicts)
        .bind(input.dependencies)
        .bind(input.status)
        .bind(input.priority)
        .bind(input.impact)
        .bind(input.confidence)
        .bind(input.effort)
        .bind(Utc::now())
        .bind(idea_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;

        if idea.status != old_status {
            NewStatusChange::new(EntityType::Idea, &idea.id, idea.status.as_str())
                .from_status(old_status.as_str())
                .by(input.changed_by.as_deref())
                .record(&mut *tx)
                .await?;
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;
        Ok(idea)
    }

    pub async fn delete_idea(&self, idea_id: &str) -> Result<(), StorageError> {
        debug!("Deleting idea: {}", idea_id);

        let result = sqlx::query("DELETE FROM ideas WHERE id = ?")
            .bind(idea_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Idea", idea_id));
        }
        Ok(())
    }
}

async fn insert_idea(
    conn: &mut SqliteConnection,
    input: &IdeaCreateInput,
) -> Result<Idea, StorageError> {
    let idea_id = reqtrack_core::generate_id("idea");
    let now = Utc::now();

    debug!("Creating idea: {} (category: {})", idea_id, input.category);

    let idea = sqlx::query_as::<_, Idea>(
        r#"
        INSERT INTO ideas (
            id, project_id, stakeholder_id, title, description, category,
            conflicts, dependencies, status, priority, impact, confidence, effort,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&idea_id)
    .bind(&input.project_id)
    .bind(&input.stakeholder_id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.category.trim())
    .bind(&input.conflicts)
    .bind(&input.dependencies)
    .bind(input.status)
    .bind(input.priority)
    .bind(input.impact)
    .bind(input.confidence)
    .bind(input.effort)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    NewStatusChange::new(EntityType::Idea, &idea.id, idea.status.as_str())
        .by(Some(idea.stakeholder_id.as_str()))
        .record(&mut *conn)
        .await?;

    Ok(idea)
}
