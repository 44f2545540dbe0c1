// ABOUTME: HTTP request handlers for project, stakeholder and document operations
// ABOUTME: Thin wrappers over the project-scoped storages with page/limit listing

use axum::extract::{Path, State};
use reqtrack_projects::{
    DocumentCreateInput, DocumentUpdateInput, ProjectCreateInput, ProjectUpdateInput,
    StakeholderCreateInput, StakeholderUpdateInput,
};
use serde::Deserialize;
use tracing::info;

use crate::extract::{ApiJson, ApiQuery};
use crate::pagination::{PaginatedResponse, PaginationParams};
use crate::response::{created, deleted, ok, ApiResult};
use crate::state::DbState;

/// Optional `?project_id=` narrowing for list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ProjectScope {
    pub project_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentQuery {
    pub project_id: Option<String>,
    pub stakeholder_id: Option<String>,
}

pub async fn list_projects(
    State(db): State<DbState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
) -> ApiResult {
    let (projects, total) = db
        .project_storage
        .list_projects(pagination.limit(), pagination.offset())
        .await?;
    ok(PaginatedResponse::new(projects, &pagination, total))
}

pub async fn get_project(State(db): State<DbState>, Path(id): Path<String>) -> ApiResult {
    ok(db.project_storage.get_project(&id).await?)
}

pub async fn create_project(
    State(db): State<DbState>,
    ApiJson(input): ApiJson<ProjectCreateInput>,
) -> ApiResult {
    info!("Creating project '{}'", input.title);
    created(db.project_storage.create_project(input).await?)
}

pub async fn update_project(
    State(db): State<DbState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ProjectUpdateInput>,
) -> ApiResult {
    ok(db.project_storage.update_project(&id, input).await?)
}

pub async fn delete_project(State(db): State<DbState>, Path(id): Path<String>) -> ApiResult {
    info!("Deleting project {}", id);
    db.project_storage.delete_project(&id).await?;
    deleted(id)
}

pub async fn list_stakeholders(
    State(db): State<DbState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
    ApiQuery(scope): ApiQuery<ProjectScope>,
) -> ApiResult {
    let (stakeholders, total) = db
        .stakeholder_storage
        .list_stakeholders(
            scope.project_id.as_deref(),
            pagination.limit(),
            pagination.offset(),
        )
        .await?;
    ok(PaginatedResponse::new(stakeholders, &pagination, total))
}

pub async fn get_stakeholder(State(db): State<DbState>, Path(id): Path<String>) -> ApiResult {
    ok(db.stakeholder_storage.get_stakeholder(&id).await?)
}

pub async fn create_stakeholder(
    State(db): State<DbState>,
    ApiJson(input): ApiJson<StakeholderCreateInput>,
) -> ApiResult {
    created(db.stakeholder_storage.create_stakeholder(input).await?)
}

pub async fn update_stakeholder(
    State(db): State<DbState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<StakeholderUpdateInput>,
) -> ApiResult {
    ok(db.stakeholder_storage.update_stakeholder(&id, input).await?)
}

/// Deleting hands the stakeholder's references to a colleague in the same project
pub async fn delete_stakeholder(State(db): State<DbState>, Path(id): Path<String>) -> ApiResult {
    info!("Deleting stakeholder {}", id);
    ok(db.stakeholder_storage.delete_stakeholder(&id).await?)
}

pub async fn list_documents(
    State(db): State<DbState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
    ApiQuery(query): ApiQuery<DocumentQuery>,
) -> ApiResult {
    let (documents, total) = db
        .document_storage
        .list_documents(
            query.project_id.as_deref(),
            query.stakeholder_id.as_deref(),
            pagination.limit(),
            pagination.offset(),
        )
        .await?;
    ok(PaginatedResponse::new(documents, &pagination, total))
}

pub async fn get_document(State(db): State<DbState>, Path(id): Path<String>) -> ApiResult {
    ok(db.document_storage.get_document(&id).await?)
}

pub async fn create_document(
    State(db): State<DbState>,
    ApiJson(input): ApiJson<DocumentCreateInput>,
) -> ApiResult {
    created(db.document_storage.create_document(input).await?)
}

pub async fn update_document(
    State(db): State<DbState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<DocumentUpdateInput>,
) -> ApiResult {
    ok(db.document_storage.update_document(&id, input).await?)
}

pub async fn delete_document(State(db): State<DbState>, Path(id): Path<String>) -> ApiResult {
    db.document_storage.delete_document(&id).await?;
    deleted(id)
}
