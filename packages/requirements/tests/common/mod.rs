// ABOUTME: Shared fixtures for requirement and change request tests
// ABOUTME: In-memory database seeded with a project, two stakeholders and a helper to create requirements

#![allow(dead_code)]

use reqtrack_projects::{
    ProjectCreateInput, ProjectStatus, ProjectStorage, StakeholderCreateInput, StakeholderStorage,
};
use reqtrack_requirements::{
    RequirementCreateInput, RequirementStorage, RequirementWithVersion, VersionFields, VersionPatch,
};
use sqlx::SqlitePool;

pub struct Fixture {
    pub pool: SqlitePool,
    pub project_id: String,
    pub author_id: String,
    pub reviewer_id: String,
}

pub async fn setup() -> Fixture {
    let pool = reqtrack_storage::connect_in_memory().await.unwrap();

    let project = ProjectStorage::new(pool.clone())
        .create_project(ProjectCreateInput {
            title: "Customer portal".to_string(),
            description: None,
            project_status: ProjectStatus::Active,
        })
        .await
        .unwrap();

    let stakeholders = StakeholderStorage::new(pool.clone());
    let mut ids = Vec::new();
    for name in ["Ada", "Grace"] {
        let stakeholder = stakeholders
            .create_stakeholder(StakeholderCreateInput {
                project_id: project.id.clone(),
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                role: "Analyst".to_string(),
            })
            .await
            .unwrap();
        ids.push(stakeholder.id);
    }

    Fixture {
        pool,
        project_id: project.id,
        author_id: ids.remove(0),
        reviewer_id: ids.remove(0),
    }
}

pub fn fields(title: &str) -> VersionFields {
    VersionFields::new(title, format!("{} description", title), "security")
}

/// Approve-time changes that only retitle the version
pub fn retitle(title: &str) -> VersionPatch {
    VersionPatch {
        title: Some(title.to_string()),
        ..Default::default()
    }
}

/// A second project with its own stakeholder, returned as (project_id, stakeholder_id)
pub async fn other_project(pool: &SqlitePool) -> (String, String) {
    let project = ProjectStorage::new(pool.clone())
        .create_project(ProjectCreateInput {
            title: "Billing backend".to_string(),
            description: None,
            project_status: ProjectStatus::Active,
        })
        .await
        .unwrap();
    let stakeholder = StakeholderStorage::new(pool.clone())
        .create_stakeholder(StakeholderCreateInput {
            project_id: project.id.clone(),
            name: "Linus".to_string(),
            email: "linus@example.com".to_string(),
            role: "Engineer".to_string(),
        })
        .await
        .unwrap();
    (project.id, stakeholder.id)
}

pub async fn create_requirement(f: &Fixture, title: &str) -> RequirementWithVersion {
    RequirementStorage::new(f.pool.clone())
        .create_requirement(RequirementCreateInput {
            project_id: f.project_id.clone(),
            stakeholder_id: f.author_id.clone(),
            initial_version: fields(title),
        })
        .await
        .unwrap()
}

/// Count of rows flagged current for a requirement
pub async fn current_count(pool: &SqlitePool, requirement_id: &str) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM requirement_versions WHERE requirement_id = ? AND is_current = 1",
    )
    .bind(requirement_id)
    .fetch_one(pool)
    .await
    .unwrap()
}
