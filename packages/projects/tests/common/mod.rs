// ABOUTME: Shared fixtures for project store integration tests
// ABOUTME: In-memory database plus helpers that create a project and stakeholders

use reqtrack_projects::{
    Project, ProjectCreateInput, ProjectStatus, ProjectStorage, Stakeholder,
    StakeholderCreateInput, StakeholderStorage,
};
use sqlx::SqlitePool;

pub async fn setup_db() -> SqlitePool {
    reqtrack_storage::connect_in_memory().await.unwrap()
}

pub async fn create_project(pool: &SqlitePool, title: &str) -> Project {
    ProjectStorage::new(pool.clone())
        .create_project(ProjectCreateInput {
            title: title.to_string(),
            description: None,
            project_status: ProjectStatus::Active,
        })
        .await
        .unwrap()
}

pub async fn create_stakeholder(pool: &SqlitePool, project_id: &str, name: &str) -> Stakeholder {
    StakeholderStorage::new(pool.clone())
        .create_stakeholder(StakeholderCreateInput {
            project_id: project_id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role: "Product Owner".to_string(),
        })
        .await
        .unwrap()
}

/// Insert an idea row directly so reference handling can be tested here
pub async fn insert_idea(pool: &SqlitePool, project_id: &str, stakeholder_id: &str) -> String {
    let id = reqtrack_core::generate_id("idea");
    sqlx::query(
        r#"INSERT INTO ideas (id, project_id, stakeholder_id, category, created_at, updated_at)
           VALUES (?, ?, ?, 'general', datetime('now'), datetime('now'))"#,
    )
    .bind(&id)
    .bind(project_id)
    .bind(stakeholder_id)
    .execute(pool)
    .await
    .unwrap();
    id
}
