// ABOUTME: HTTP request handlers for the change request workflow
// ABOUTME: Create, review (approve/reject/implement) and the administrative status override

use axum::extract::{Path, State};
use reqtrack_requirements::{
    ApproveInput, ChangeRequestCreateInput, ChangeRequestFilter, ChangeRequestUpdateInput,
    ForceStatusInput, ImplementInput, RejectInput,
};

use crate::extract::{ApiJson, ApiQuery};
use crate::pagination::{PaginatedResponse, PaginationParams};
use crate::response::{created, deleted, ok, ApiResult};
use crate::state::DbState;

pub async fn list_change_requests(
    State(db): State<DbState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
    ApiQuery(filter): ApiQuery<ChangeRequestFilter>,
) -> ApiResult {
    let (change_requests, total) = db
        .change_request_storage
        .list_change_requests(&filter, pagination.limit(), pagination.offset())
        .await?;
    ok(PaginatedResponse::new(change_requests, &pagination, total))
}

/// Review queue: PENDING requests raised by one stakeholder
pub async fn pending_for_stakeholder(
    State(db): State<DbState>,
    Path(stakeholder_id): Path<String>,
) -> ApiResult {
    ok(db
        .change_request_storage
        .pending_for_stakeholder(&stakeholder_id)
        .await?)
}

pub async fn get_change_request(State(db): State<DbState>, Path(id): Path<String>) -> ApiResult {
    ok(db.change_request_storage.get_change_request(&id).await?)
}

pub async fn create_change_request(
    State(db): State<DbState>,
    ApiJson(input): ApiJson<ChangeRequestCreateInput>,
) -> ApiResult {
    created(db.change_request_storage.create_change_request(input).await?)
}

pub async fn update_change_request(
    State(db): State<DbState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ChangeRequestUpdateInput>,
) -> ApiResult {
    ok(db
        .change_request_storage
        .update_change_request(&id, input)
        .await?)
}

pub async fn delete_change_request(
    State(db): State<DbState>,
    Path(id): Path<String>,
) -> ApiResult {
    db.change_request_storage.delete_change_request(&id).await?;
    deleted(id)
}

/// The review bodies are optional; a bare POST uses the defaults
pub async fn approve_change_request(
    State(db): State<DbState>,
    Path(id): Path<String>,
    body: Option<ApiJson<ApproveInput>>,
) -> ApiResult {
    let input = body.map(|ApiJson(input)| input).unwrap_or_default();
    ok(db.change_request_storage.approve(&id, input).await?)
}

pub async fn reject_change_request(
    State(db): State<DbState>,
    Path(id): Path<String>,
    body: Option<ApiJson<RejectInput>>,
) -> ApiResult {
    let input = body.map(|ApiJson(input)| input).unwrap_or_default();
    ok(db.change_request_storage.reject(&id, input).await?)
}

pub async fn implement_change_request(
    State(db): State<DbState>,
    Path(id): Path<String>,
    body: Option<ApiJson<ImplementInput>>,
) -> ApiResult {
    let input = body.map(|ApiJson(input)| input).unwrap_or_default();
    ok(db.change_request_storage.implement(&id, input).await?)
}

pub async fn force_change_request_status(
    State(db): State<DbState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ForceStatusInput>,
) -> ApiResult {
    ok(db.change_request_storage.force_status(&id, input).await?)
}
