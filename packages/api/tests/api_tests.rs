// ABOUTME: End-to-end tests of the HTTP router against an in-memory database
// ABOUTME: Envelope shape, status code mapping and the AI routes with stub generators

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use pretty_assertions::assert_eq;
use reqtrack_ai::{
    AIServiceError, AIServiceResult, DraftedChangeRequest, GeneratedIdea, Generator,
    ProjectContext,
};
use reqtrack_api::{create_router, DbState};
use reqtrack_ideas::Idea;
use reqtrack_requirements::{RequirementVersion, VersionFields};
use serde_json::{json, Value};
use tower::ServiceExt;

struct StubGenerator;

#[async_trait]
impl Generator for StubGenerator {
    async fn extract_ideas(
        &self,
        _text: &str,
        _context: &ProjectContext,
    ) -> AIServiceResult<Vec<GeneratedIdea>> {
        Ok(vec![GeneratedIdea {
            title: Some("Offline mode".to_string()),
            category: "sync".to_string(),
            impact: Some(8),
            confidence: Some(6),
            effort: Some(4),
            ..Default::default()
        }])
    }

    async fn derive_requirements(
        &self,
        _ideas: &[Idea],
        _context: &ProjectContext,
    ) -> AIServiceResult<Vec<VersionFields>> {
        Ok(vec![VersionFields::new(
            "Cache edits locally",
            "Edits made offline are queued",
            "sync",
        )])
    }

    async fn draft_change_request(
        &self,
        _base: &RequirementVersion,
        _proposed: &RequirementVersion,
        _context: &ProjectContext,
    ) -> AIServiceResult<DraftedChangeRequest> {
        Ok(DraftedChangeRequest {
            title: None,
            summary: "Narrows the scope".to_string(),
            cost: None,
            benefit: None,
        })
    }
}

struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    async fn extract_ideas(
        &self,
        _text: &str,
        _context: &ProjectContext,
    ) -> AIServiceResult<Vec<GeneratedIdea>> {
        Err(AIServiceError::ApiError {
            status: 529,
            message: "overloaded".to_string(),
        })
    }

    async fn derive_requirements(
        &self,
        _ideas: &[Idea],
        _context: &ProjectContext,
    ) -> AIServiceResult<Vec<VersionFields>> {
        Err(AIServiceError::InvalidResponse)
    }

    async fn draft_change_request(
        &self,
        _base: &RequirementVersion,
        _proposed: &RequirementVersion,
        _context: &ProjectContext,
    ) -> AIServiceResult<DraftedChangeRequest> {
        Err(AIServiceError::InvalidResponse)
    }
}

async fn app_with(generator: Option<Arc<dyn Generator>>) -> Router {
    let pool = reqtrack_storage::connect_in_memory().await.unwrap();
    let state = DbState::new(pool);
    let state = match generator {
        Some(generator) => state.with_generator(generator),
        None => state,
    };
    create_router(state)
}

async fn app() -> Router {
    app_with(None).await
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Creates a project with one stakeholder; returns (project_id, stakeholder_id)
async fn seed(app: &Router) -> (String, String) {
    let (status, project) = send(app, "POST", "/projects", Some(json!({"title": "Atlas"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = project["data"]["id"].as_str().unwrap().to_string();

    let (status, stakeholder) = send(
        app,
        "POST",
        "/stakeholders",
        Some(json!({
            "project_id": project_id,
            "name": "Ada",
            "email": "ada@example.com",
            "role": "Product owner"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let stakeholder_id = stakeholder["data"]["id"].as_str().unwrap().to_string();

    (project_id, stakeholder_id)
}

async fn create_requirement(app: &Router, project_id: &str, stakeholder_id: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/requirements",
        Some(json!({
            "project_id": project_id,
            "stakeholder_id": stakeholder_id,
            "initial_version": {
                "title": "Login",
                "description": "Users sign in with email",
                "category": "security",
                "type": "FUNCTIONAL"
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"].clone()
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "reqtrack");
}

#[tokio::test]
async fn test_create_and_get_project_envelope() {
    let app = app().await;
    let (project_id, _) = seed(&app).await;

    let (status, body) = send(&app, "GET", &format!("/projects/{}", project_id), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["title"], "Atlas");
    assert_eq!(body["data"]["project_status"], "ACTIVE");
}

#[tokio::test]
async fn test_unknown_project_is_404() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/projects/missing", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn test_idea_validation_lists_fields() {
    let app = app().await;
    let (project_id, stakeholder_id) = seed(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/ideas",
        Some(json!({
            "project_id": project_id,
            "stakeholder_id": stakeholder_id,
            "category": "ux",
            "impact": 11,
            "effort": 0
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(
        body["error"]["details"]["impact"],
        "impact must be between 0 and 10"
    );
    assert_eq!(
        body["error"]["details"]["effort"],
        "effort must be between 1 and 10"
    );
}

#[tokio::test]
async fn test_idea_listing_is_paginated() {
    let app = app().await;
    let (project_id, stakeholder_id) = seed(&app).await;

    for category in ["ux", "perf", "sync"] {
        let (status, _) = send(
            &app,
            "POST",
            "/ideas",
            Some(json!({
                "project_id": project_id,
                "stakeholder_id": stakeholder_id,
                "category": category
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        "GET",
        &format!("/ideas?page=2&limit=2&project_id={}", project_id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["pagination"]["total_items"], 3);
    assert_eq!(body["data"]["pagination"]["total_pages"], 2);
    assert_eq!(body["data"]["pagination"]["has_next_page"], false);
}

#[tokio::test]
async fn test_top_ideas_requires_project() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/ideas/top", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_requirement_version_switch() {
    let app = app().await;
    let (project_id, stakeholder_id) = seed(&app).await;
    let requirement = create_requirement(&app, &project_id, &stakeholder_id).await;
    let requirement_id = requirement["id"].as_str().unwrap();
    assert_eq!(requirement["current_version"]["version_number"], 1);

    let (status, v2) = send(
        &app,
        "POST",
        &format!("/requirements/{}/versions", requirement_id),
        Some(json!({
            "stakeholder_id": stakeholder_id,
            "title": "Login with SSO",
            "description": "Users sign in through the company IdP",
            "category": "security"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(v2["data"]["is_current"], false);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/requirements/{}/current-version", requirement_id),
        Some(json!({"version_id": v2["data"]["id"]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["current_version"]["version_number"], 2);
    assert_eq!(body["data"]["current_version_id"], v2["data"]["id"]);
}

#[tokio::test]
async fn test_deleting_last_version_conflicts() {
    let app = app().await;
    let (project_id, stakeholder_id) = seed(&app).await;
    let requirement = create_requirement(&app, &project_id, &stakeholder_id).await;

    let (status, body) = send(
        &app,
        "DELETE",
        &format!(
            "/requirements/{}/versions/{}",
            requirement["id"].as_str().unwrap(),
            requirement["current_version"]["id"].as_str().unwrap()
        ),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVARIANT_VIOLATION");
}

#[tokio::test]
async fn test_change_request_invalid_transition() {
    let app = app().await;
    let (project_id, stakeholder_id) = seed(&app).await;
    let requirement = create_requirement(&app, &project_id, &stakeholder_id).await;

    let (status, cr) = send(
        &app,
        "POST",
        "/change-requests",
        Some(json!({
            "requirement_id": requirement["id"],
            "stakeholder_id": stakeholder_id,
            "base_version_id": requirement["current_version"]["id"],
            "summary": "Require MFA"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(cr["data"]["status"], "PENDING");
    let cr_id = cr["data"]["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/change-requests/{}/reject", cr_id),
        Some(json!({"notes": "Out of scope"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/change-requests/{}/approve", cr_id),
        Some(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_TRANSITION");
    assert_eq!(body["error"]["details"]["from"], "REJECTED");
    assert_eq!(body["error"]["details"]["to"], "APPROVED");

    let (status, history) = send(
        &app,
        "GET",
        &format!("/status-history?entity_type=change_request&entity_id={}", cr_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let statuses: Vec<&str> = history["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["new_status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["PENDING", "REJECTED"]);
}

async fn open_change_request(
    app: &Router,
    requirement: &Value,
    stakeholder_id: &str,
    proposed_changes: Option<Value>,
) -> String {
    let (status, cr) = send(
        app,
        "POST",
        "/change-requests",
        Some(json!({
            "requirement_id": requirement["id"],
            "stakeholder_id": stakeholder_id,
            "base_version_id": requirement["current_version"]["id"],
            "summary": "Require MFA",
            "proposed_changes": proposed_changes
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    cr["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_review_actions_accept_bodyless_post() {
    let app = app().await;
    let (project_id, stakeholder_id) = seed(&app).await;
    let requirement = create_requirement(&app, &project_id, &stakeholder_id).await;

    let rejected_id = open_change_request(&app, &requirement, &stakeholder_id, None).await;
    let (status, body) = send(
        &app,
        "POST",
        &format!("/change-requests/{}/reject", rejected_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "REJECTED");

    let proposal = json!({
        "title": "Login with MFA",
        "description": "Users sign in with email and a second factor",
        "category": "security",
        "type": "FUNCTIONAL"
    });
    let cr_id = open_change_request(&app, &requirement, &stakeholder_id, Some(proposal)).await;

    let (status, body) = send(&app, "POST", &format!("/change-requests/{}/approve", cr_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "APPROVED");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/change-requests/{}/implement", cr_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "IMPLEMENTED");
}

#[tokio::test]
async fn test_approve_with_title_only_keeps_current_version() {
    let app = app().await;
    let (project_id, stakeholder_id) = seed(&app).await;
    let requirement = create_requirement(&app, &project_id, &stakeholder_id).await;
    let requirement_id = requirement["id"].as_str().unwrap();
    let cr_id = open_change_request(&app, &requirement, &stakeholder_id, None).await;

    let (status, approved) = send(
        &app,
        "POST",
        &format!("/change-requests/{}/approve", cr_id),
        Some(json!({"next_version": {"title": "Login v2"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["data"]["status"], "APPROVED");

    let next_id = approved["data"]["next_version_id"].as_str().unwrap();
    let (status, next) = send(
        &app,
        "GET",
        &format!("/requirements/{}/versions/{}", requirement_id, next_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(next["data"]["version_number"], 2);
    assert_eq!(next["data"]["title"], "Login v2");
    assert_eq!(next["data"]["description"], "Users sign in with email");

    let (_, loaded) = send(&app, "GET", &format!("/requirements/{}", requirement_id), None).await;
    assert_eq!(
        loaded["data"]["current_version_id"],
        requirement["current_version"]["id"]
    );
}

#[tokio::test]
async fn test_malformed_body_uses_error_envelope() {
    let app = app().await;
    let (project_id, stakeholder_id) = seed(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/requirements",
        Some(json!({
            "project_id": project_id,
            "stakeholder_id": stakeholder_id,
            "initial_version": {
                "description": "Users sign in with email",
                "category": "security"
            }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message"].as_str().unwrap().contains("title"));
    assert!(!body["request_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_query_uses_error_envelope() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/ideas?page=first", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn test_keyword_search_over_ideas_and_requirements() {
    let app = app().await;
    let (project_id, stakeholder_id) = seed(&app).await;
    create_requirement(&app, &project_id, &stakeholder_id).await;

    for (title, category) in [("Email magic links", "auth"), ("Dark mode", "ux")] {
        let (status, _) = send(
            &app,
            "POST",
            "/ideas",
            Some(json!({
                "project_id": project_id,
                "stakeholder_id": stakeholder_id,
                "title": title,
                "category": category
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        "GET",
        &format!("/search?q=EMAIL&project_id={}", project_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["query"], "EMAIL");
    let ideas = body["data"]["ideas"].as_array().unwrap();
    assert_eq!(ideas.len(), 1);
    assert_eq!(ideas[0]["title"], "Email magic links");
    let requirements = body["data"]["requirements"].as_array().unwrap();
    assert_eq!(requirements.len(), 1);
    assert_eq!(requirements[0]["current_version"]["title"], "Login");

    let (_, body) = send(&app, "GET", "/search?q=100%25", None).await;
    assert!(body["data"]["ideas"].as_array().unwrap().is_empty());

    let (status, body) = send(&app, "GET", "/search?q=%20", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_history_entity_id_needs_type() {
    let app = app().await;
    let (status, _) = send(&app, "GET", "/status-history?entity_id=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ai_routes_unavailable_without_generator() {
    let app = app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/ai/generate-ideas",
        Some(json!({"text": "We need offline support"})),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "AI_UNAVAILABLE");
}

#[tokio::test]
async fn test_generate_ideas_and_requirements() {
    let app = app_with(Some(Arc::new(StubGenerator))).await;
    let (project_id, _) = seed(&app).await;

    let (status, ideas) = send(
        &app,
        "POST",
        "/ai/generate-ideas",
        Some(json!({"text": "We need offline support"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let idea = &ideas["data"][0];
    assert_eq!(idea["project_id"], project_id.as_str());
    assert_eq!(idea["ice_score"], 12.0);

    let (status, requirements) = send(
        &app,
        "POST",
        "/ai/generate-requirements",
        Some(json!({"idea_ids": [idea["id"]]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(requirements["data"][0]["idea_ids"][0], idea["id"]);
    assert_eq!(
        requirements["data"][0]["current_version"]["title"],
        "Cache edits locally"
    );
}

#[tokio::test]
async fn test_generation_upstream_failure_is_bad_gateway() {
    let app = app_with(Some(Arc::new(FailingGenerator))).await;
    seed(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/ai/generate-ideas",
        Some(json!({"text": "We need offline support"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "TRANSPORT_ERROR");
    assert_eq!(body["error"]["details"]["upstream_status"], "529");
}
