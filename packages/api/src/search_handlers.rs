// ABOUTME: Keyword search across ideas and current requirement versions

use axum::extract::State;
use reqtrack_ideas::Idea;
use reqtrack_requirements::RequirementWithVersion;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::ApiQuery;
use crate::pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::response::{ok, ApiResult};
use crate::state::DbState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub project_id: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub ideas: Vec<Idea>,
    pub requirements: Vec<RequirementWithVersion>,
}

/// `limit` applies to each result kind separately
pub async fn search(State(db): State<DbState>, ApiQuery(query): ApiQuery<SearchQuery>) -> ApiResult {
    let text = reqtrack_core::non_empty(query.q)
        .ok_or_else(|| AppError::validation("q is required"))?;
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let project_id = query.project_id.as_deref();

    let ideas = db.idea_storage.search_ideas(project_id, &text, limit).await?;
    let requirements = db
        .requirement_storage
        .search_requirements(project_id, &text, limit)
        .await?;

    ok(SearchResults {
        query: text,
        ideas,
        requirements,
    })
}
