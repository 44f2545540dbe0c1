// ABOUTME: HTTP request handlers for the status history audit log

use axum::extract::State;
use reqtrack_storage::EntityType;
use serde::Deserialize;

use crate::error::AppError;
use crate::extract::ApiQuery;
use crate::pagination::{PaginatedResponse, PaginationParams};
use crate::response::{ok, ApiResult};
use crate::state::DbState;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
}

/// With `entity_id` the full trail of that entity, oldest first.
/// Otherwise the most recent changes, paginated.
pub async fn list_history(
    State(db): State<DbState>,
    ApiQuery(pagination): ApiQuery<PaginationParams>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ApiResult {
    if let Some(entity_id) = query.entity_id {
        let entity_type = query
            .entity_type
            .ok_or_else(|| AppError::validation("entity_type is required with entity_id"))?;
        return ok(db
            .history_storage
            .list_for_entity(entity_type, &entity_id)
            .await?);
    }

    let (entries, total) = db
        .history_storage
        .list_recent(query.entity_type, pagination.limit(), pagination.offset())
        .await?;
    ok(PaginatedResponse::new(entries, &pagination, total))
}
