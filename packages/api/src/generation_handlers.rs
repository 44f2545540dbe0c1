// ABOUTME: HTTP request handlers for AI-assisted generation
// ABOUTME: Each call persists what the model proposes and returns the stored records

use axum::extract::State;
use reqtrack_ai::GenerationService;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::response::{created, ApiResult};
use crate::state::DbState;

#[derive(Debug, Deserialize)]
pub struct GenerateIdeasRequest {
    pub text: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub stakeholder_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequirementsRequest {
    pub idea_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateChangeRequestRequest {
    pub requirement_id: String,
    pub base_version_id: String,
    pub next_version_id: String,
}

fn generation(db: &DbState) -> Result<&Arc<GenerationService>, AppError> {
    db.generation.as_ref().ok_or(AppError::AiUnavailable)
}

pub async fn generate_ideas(
    State(db): State<DbState>,
    ApiJson(request): ApiJson<GenerateIdeasRequest>,
) -> ApiResult {
    let ideas = generation(&db)?
        .generate_ideas(
            &request.text,
            request.project_id.as_deref(),
            request.stakeholder_id.as_deref(),
        )
        .await?;
    info!("Generated {} ideas", ideas.len());
    created(ideas)
}

pub async fn generate_requirements(
    State(db): State<DbState>,
    ApiJson(request): ApiJson<GenerateRequirementsRequest>,
) -> ApiResult {
    if request.idea_ids.is_empty() {
        return Err(AppError::validation("idea_ids must not be empty"));
    }
    let requirements = generation(&db)?
        .generate_requirements(&request.idea_ids)
        .await?;
    info!("Generated {} requirements", requirements.len());
    created(requirements)
}

pub async fn generate_change_request(
    State(db): State<DbState>,
    ApiJson(request): ApiJson<GenerateChangeRequestRequest>,
) -> ApiResult {
    created(
        generation(&db)?
            .generate_change_request(
                &request.requirement_id,
                &request.base_version_id,
                &request.next_version_id,
            )
            .await?,
    )
}
