// ABOUTME: HTTP request handlers for ideas
// ABOUTME: CRUD, filtered listing and the ICE-ranked top list

use axum::extract::{Path, State};
use reqtrack_ideas::{IdeaCreateInput, IdeaFilter, IdeaUpdateInput};
use serde::Deserialize;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiQuery};
use crate::pagination::{PaginatedResponse, PaginationParams, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::response::{created, deleted, ok, ApiResult};
use crate::state::DbState;

#[derive(Debug, Deserialize)]
pub struct TopIdeasQuery {
    pub project_id: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_ideas(
    State(db): State<DbState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
    ApiQuery(filter): ApiQuery<IdeaFilter>,
) -> ApiResult {
    let (ideas, total) = db
        .idea_storage
        .list_ideas(&filter, pagination.limit(), pagination.offset())
        .await?;
    ok(PaginatedResponse::new(ideas, &pagination, total))
}

/// Highest ICE score first; unscored ideas trail
pub async fn top_ideas(State(db): State<DbState>, ApiQuery(query): ApiQuery<TopIdeasQuery>) -> ApiResult {
    let project_id = query
        .project_id
        .ok_or_else(|| AppError::validation("project_id is required"))?;
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    ok(db.idea_storage.top_by_ice(&project_id, limit).await?)
}

pub async fn get_idea(State(db): State<DbState>, Path(id): Path<String>) -> ApiResult {
    ok(db.idea_storage.get_idea(&id).await?)
}

pub async fn create_idea(
    State(db): State<DbState>,
    ApiJson(input): ApiJson<IdeaCreateInput>,
) -> ApiResult {
    created(db.idea_storage.create_idea(input).await?)
}

pub async fn update_idea(
    State(db): State<DbState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<IdeaUpdateInput>,
) -> ApiResult {
    ok(db.idea_storage.update_idea(&id, input).await?)
}

pub async fn delete_idea(State(db): State<DbState>, Path(id): Path<String>) -> ApiResult {
    db.idea_storage.delete_idea(&id).await?;
    deleted(id)
}
