// ABOUTME: HTTP request handlers for requirements and their versions
// ABOUTME: Version lineage changes go through RequirementStorage so one version stays current

use axum::extract::{Path, State};
use reqtrack_requirements::{RequirementCreateInput, VersionCreateInput, VersionUpdateInput};
use serde::Deserialize;
use tracing::info;

use crate::extract::{ApiJson, ApiQuery};
use crate::pagination::{PaginatedResponse, PaginationParams};
use crate::project_handlers::ProjectScope;
use crate::response::{created, deleted, ok, ApiResult};
use crate::state::DbState;

#[derive(Debug, Deserialize)]
pub struct SetCurrentVersionRequest {
    pub version_id: String,
}

pub async fn list_requirements(
    State(db): State<DbState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
    ApiQuery(scope): ApiQuery<ProjectScope>,
) -> ApiResult {
    let (requirements, total) = db
        .requirement_storage
        .list_requirements(
            scope.project_id.as_deref(),
            pagination.limit(),
            pagination.offset(),
        )
        .await?;
    ok(PaginatedResponse::new(requirements, &pagination, total))
}

pub async fn get_requirement(State(db): State<DbState>, Path(id): Path<String>) -> ApiResult {
    ok(db.requirement_storage.get_requirement(&id).await?)
}

pub async fn create_requirement(
    State(db): State<DbState>,
    ApiJson(input): ApiJson<RequirementCreateInput>,
) -> ApiResult {
    created(db.requirement_storage.create_requirement(input).await?)
}

pub async fn delete_requirement(State(db): State<DbState>, Path(id): Path<String>) -> ApiResult {
    info!("Deleting requirement {}", id);
    db.requirement_storage.delete_requirement(&id).await?;
    deleted(id)
}

pub async fn list_versions(State(db): State<DbState>, Path(id): Path<String>) -> ApiResult {
    ok(db.requirement_storage.list_versions(&id).await?)
}

pub async fn get_version(
    State(db): State<DbState>,
    Path((id, version_id)): Path<(String, String)>,
) -> ApiResult {
    ok(db.requirement_storage.get_version(&id, &version_id).await?)
}

pub async fn add_version(
    State(db): State<DbState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<VersionCreateInput>,
) -> ApiResult {
    created(db.requirement_storage.add_version(&id, input).await?)
}

pub async fn update_version(
    State(db): State<DbState>,
    Path((id, version_id)): Path<(String, String)>,
    ApiJson(input): ApiJson<VersionUpdateInput>,
) -> ApiResult {
    ok(db
        .requirement_storage
        .update_version(&id, &version_id, input)
        .await?)
}

/// Responds with the requirement as it stands after the delete
pub async fn delete_version(
    State(db): State<DbState>,
    Path((id, version_id)): Path<(String, String)>,
) -> ApiResult {
    ok(db.requirement_storage.delete_version(&id, &version_id).await?)
}

pub async fn set_current_version(
    State(db): State<DbState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<SetCurrentVersionRequest>,
) -> ApiResult {
    ok(db
        .requirement_storage
        .set_current_version(&id, &request.version_id)
        .await?)
}

pub async fn link_idea(
    State(db): State<DbState>,
    Path((id, idea_id)): Path<(String, String)>,
) -> ApiResult {
    ok(db.requirement_storage.link_idea(&id, &idea_id).await?)
}

pub async fn unlink_idea(
    State(db): State<DbState>,
    Path((id, idea_id)): Path<(String, String)>,
) -> ApiResult {
    ok(db.requirement_storage.unlink_idea(&id, &idea_id).await?)
}
