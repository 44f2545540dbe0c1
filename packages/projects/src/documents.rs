// ABOUTME: Document storage layer using SQLite
// ABOUTME: CRUD for project documents with optional stakeholder attribution

use chrono::Utc;
use reqtrack_storage::{ensure_exists, ensure_stakeholder_in_project, project_of, StorageError};
use sqlx::SqlitePool;
use tracing::debug;

use crate::types::{Document, DocumentCreateInput, DocumentUpdateInput};

pub struct DocumentStorage {
    pool: SqlitePool,
}

impl DocumentStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_documents(
        &self,
        project_id: Option<&str>,
        stakeholder_id: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Document>, i64), StorageError> {
        debug!(
            "Fetching documents (project: {:?}, stakeholder: {:?})",
            project_id, stakeholder_id
        );

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM documents
            WHERE (?1 IS NULL OR project_id = ?1) AND (?2 IS NULL OR stakeholder_id = ?2)
            "#,
        )
        .bind(project_id)
        .bind(stakeholder_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT * FROM documents
            WHERE (?1 IS NULL OR project_id = ?1) AND (?2 IS NULL OR stakeholder_id = ?2)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(project_id)
        .bind(stakeholder_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok((documents, count))
    }

    pub async fn get_document(&self, document_id: &str) -> Result<Document, StorageError> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = ?")
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or_else(|| StorageError::not_found("Document", document_id))
    }

    pub async fn create_document(
        &self,
        input: DocumentCreateInput,
    ) -> Result<Document, StorageError> {
        ensure_exists(&self.pool, "projects", "Project", &input.project_id).await?;
        if let Some(stakeholder_id) = &input.stakeholder_id {
            ensure_stakeholder_in_project(
                &self.pool,
                "stakeholder_id",
                stakeholder_id,
                &input.project_id,
            )
            .await?;
        }

        let document_id = reqtrack_core::generate_id("doc");
        let now = Utc::now();

        debug!("Creating document: {} ({:?})", document_id, input.doc_type);

        sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents
                (id, project_id, stakeholder_id, type, title, text, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&document_id)
        .bind(&input.project_id)
        .bind(&input.stakeholder_id)
        .bind(input.doc_type)
        .bind(&input.title)
        .bind(&input.text)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }

    pub async fn update_document(
        &self,
        document_id: &str,
        input: DocumentUpdateInput,
    ) -> Result<Document, StorageError> {
        debug!("Updating document: {}", document_id);

        if let Some(stakeholder_id) = &input.stakeholder_id {
            let project_id = project_of(&self.pool, "documents", "Document", document_id).await?;
            ensure_stakeholder_in_project(&self.pool, "stakeholder_id", stakeholder_id, &project_id)
                .await?;
        }

        sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents SET
                type = COALESCE(?, type),
                title = COALESCE(?, title),
                text = COALESCE(?, text),
                stakeholder_id = COALESCE(?, stakeholder_id),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(input.doc_type)
        .bind(input.title)
        .bind(input.text)
        .bind(input.stakeholder_id)
        .bind(Utc::now())
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?
        .ok_or_else(|| StorageError::not_found("Document", document_id))
    }

    pub async fn delete_document(&self, document_id: &str) -> Result<(), StorageError> {
        debug!("Deleting document: {}", document_id);

        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Document", document_id));
        }
        Ok(())
    }
}
