// ABOUTME: HTTP API layer for reqtrack providing REST endpoints and routing
// ABOUTME: Integration layer that depends on all domain packages

use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub mod change_request_handlers;
pub mod error;
pub mod extract;
pub mod generation_handlers;
pub mod health;
pub mod history_handlers;
pub mod idea_handlers;
pub mod pagination;
pub mod project_handlers;
pub mod requirement_handlers;
pub mod response;
pub mod search_handlers;
pub mod state;

pub use error::AppError;
pub use state::DbState;

/// Creates the projects API router
pub fn create_projects_router() -> Router<DbState> {
    Router::new()
        .route("/", get(project_handlers::list_projects))
        .route("/", post(project_handlers::create_project))
        .route("/{id}", get(project_handlers::get_project))
        .route("/{id}", put(project_handlers::update_project))
        .route("/{id}", delete(project_handlers::delete_project))
}

/// Creates the stakeholders API router
pub fn create_stakeholders_router() -> Router<DbState> {
    Router::new()
        .route("/", get(project_handlers::list_stakeholders))
        .route("/", post(project_handlers::create_stakeholder))
        .route("/{id}", get(project_handlers::get_stakeholder))
        .route("/{id}", put(project_handlers::update_stakeholder))
        .route("/{id}", delete(project_handlers::delete_stakeholder))
        .route(
            "/{id}/pending-change-requests",
            get(change_request_handlers::pending_for_stakeholder),
        )
}

/// Creates the documents API router
pub fn create_documents_router() -> Router<DbState> {
    Router::new()
        .route("/", get(project_handlers::list_documents))
        .route("/", post(project_handlers::create_document))
        .route("/{id}", get(project_handlers::get_document))
        .route("/{id}", put(project_handlers::update_document))
        .route("/{id}", delete(project_handlers::delete_document))
}

/// Creates the ideas API router
pub fn create_ideas_router() -> Router<DbState> {
    Router::new()
        .route("/", get(idea_handlers::list_ideas))
        .route("/", post(idea_handlers::create_idea))
        .route("/top", get(idea_handlers::top_ideas))
        .route("/{id}", get(idea_handlers::get_idea))
        .route("/{id}", put(idea_handlers::update_idea))
        .route("/{id}", delete(idea_handlers::delete_idea))
}

/// Creates the requirements API router, including version lineage and idea links
pub fn create_requirements_router() -> Router<DbState> {
    Router::new()
        .route("/", get(requirement_handlers::list_requirements))
        .route("/", post(requirement_handlers::create_requirement))
        .route("/{id}", get(requirement_handlers::get_requirement))
        .route("/{id}", delete(requirement_handlers::delete_requirement))
        .route("/{id}/versions", get(requirement_handlers::list_versions))
        .route("/{id}/versions", post(requirement_handlers::add_version))
        .route(
            "/{id}/versions/{version_id}",
            get(requirement_handlers::get_version),
        )
        .route(
            "/{id}/versions/{version_id}",
            put(requirement_handlers::update_version),
        )
        .route(
            "/{id}/versions/{version_id}",
            delete(requirement_handlers::delete_version),
        )
        .route(
            "/{id}/current-version",
            put(requirement_handlers::set_current_version),
        )
        .route(
            "/{id}/ideas/{idea_id}",
            post(requirement_handlers::link_idea),
        )
        .route(
            "/{id}/ideas/{idea_id}",
            delete(requirement_handlers::unlink_idea),
        )
}

/// Creates the change requests API router
pub fn create_change_requests_router() -> Router<DbState> {
    Router::new()
        .route("/", get(change_request_handlers::list_change_requests))
        .route("/", post(change_request_handlers::create_change_request))
        .route("/{id}", get(change_request_handlers::get_change_request))
        .route("/{id}", put(change_request_handlers::update_change_request))
        .route(
            "/{id}",
            delete(change_request_handlers::delete_change_request),
        )
        .route(
            "/{id}/approve",
            post(change_request_handlers::approve_change_request),
        )
        .route(
            "/{id}/reject",
            post(change_request_handlers::reject_change_request),
        )
        .route(
            "/{id}/implement",
            post(change_request_handlers::implement_change_request),
        )
        .route(
            "/{id}/force-status",
            post(change_request_handlers::force_change_request_status),
        )
}

/// Creates the AI generation router
pub fn create_ai_router() -> Router<DbState> {
    Router::new()
        .route(
            "/generate-ideas",
            post(generation_handlers::generate_ideas),
        )
        .route(
            "/generate-requirements",
            post(generation_handlers::generate_requirements),
        )
        .route(
            "/generate-change-request",
            post(generation_handlers::generate_change_request),
        )
}

/// Full application router with state attached
pub fn create_router(state: DbState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/projects", create_projects_router())
        .nest("/stakeholders", create_stakeholders_router())
        .nest("/documents", create_documents_router())
        .nest("/ideas", create_ideas_router())
        .nest("/requirements", create_requirements_router())
        .nest("/change-requests", create_change_requests_router())
        .route("/status-history", get(history_handlers::list_history))
        .route("/search", get(search_handlers::search))
        .nest("/ai", create_ai_router())
        .with_state(state)
}
