// ABOUTME: Integration tests for idea storage
// ABOUTME: ICE scoring on read, ranking, validation and status history

use pretty_assertions::assert_eq;
use reqtrack_ideas::{IdeaCreateInput, IdeaFilter, IdeaStatus, IdeaStorage, IdeaUpdateInput};
use reqtrack_projects::{
    ProjectCreateInput, ProjectStatus, ProjectStorage, StakeholderCreateInput, StakeholderStorage,
};
use reqtrack_storage::{EntityType, StatusHistoryStorage, StorageError};
use sqlx::SqlitePool;

struct Fixture {
    pool: SqlitePool,
    project_id: String,
    stakeholder_id: String,
}

async fn setup() -> Fixture {
    let pool = reqtrack_storage::connect_in_memory().await.unwrap();
    let project = ProjectStorage::new(pool.clone())
        .create_project(ProjectCreateInput {
            title: "Portal".to_string(),
            description: None,
            project_status: ProjectStatus::Active,
        })
        .await
        .unwrap();
    let stakeholder = StakeholderStorage::new(pool.clone())
        .create_stakeholder(StakeholderCreateInput {
            project_id: project.id.clone(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: "PO".to_string(),
        })
        .await
        .unwrap();

    Fixture {
        pool,
        project_id: project.id,
        stakeholder_id: stakeholder.id,
    }
}

fn idea_input(f: &Fixture, title: &str, scores: (Option<i64>, Option<i64>, Option<i64>)) -> IdeaCreateInput {
    IdeaCreateInput {
        project_id: f.project_id.clone(),
        stakeholder_id: f.stakeholder_id.clone(),
        title: Some(title.to_string()),
        description: None,
        category: "auth".to_string(),
        conflicts: None,
        dependencies: None,
        status: IdeaStatus::Proposed,
        priority: Default::default(),
        impact: scores.0,
        confidence: scores.1,
        effort: scores.2,
    }
}

#[tokio::test]
async fn test_create_idea_computes_ice() {
    let f = setup().await;
    let storage = IdeaStorage::new(f.pool.clone());

    let idea = storage
        .create_idea(idea_input(&f, "SSO", (Some(9), Some(8), Some(7))))
        .await
        .unwrap();

    assert!(idea.id.starts_with("idea-"));
    let score = idea.ice_score.unwrap();
    assert!((score - 72.0 / 7.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_ice_follows_partial_updates() {
    let f = setup().await;
    let storage = IdeaStorage::new(f.pool.clone());
    let idea = storage
        .create_idea(idea_input(&f, "SSO", (Some(9), Some(8), Some(7))))
        .await
        .unwrap();

    let updated = storage
        .update_idea(
            &idea.id,
            IdeaUpdateInput {
                effort: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.ice_score, Some(36.0));
    assert_eq!(storage.get_idea(&idea.id).await.unwrap().ice_score, Some(36.0));
}

#[tokio::test]
async fn test_missing_scores_leave_ice_empty() {
    let f = setup().await;
    let storage = IdeaStorage::new(f.pool.clone());

    let idea = storage
        .create_idea(idea_input(&f, "Dark mode", (Some(3), None, Some(2))))
        .await
        .unwrap();

    assert_eq!(idea.ice_score, None);
}

#[tokio::test]
async fn test_out_of_range_scores_rejected() {
    let f = setup().await;
    let storage = IdeaStorage::new(f.pool.clone());

    let err = storage
        .create_idea(idea_input(&f, "Bad", (Some(11), Some(5), Some(0))))
        .await
        .unwrap_err();

    match err {
        StorageError::Validation(errors) => {
            let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
            assert_eq!(fields, vec!["impact", "effort"]);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_stakeholder_is_not_found() {
    let f = setup().await;
    let storage = IdeaStorage::new(f.pool.clone());
    let mut input = idea_input(&f, "SSO", (None, None, None));
    input.stakeholder_id = "stk-missing".to_string();

    assert!(matches!(
        storage.create_idea(input).await,
        Err(StorageError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_top_by_ice_orders_descending_with_unscored_last() {
    let f = setup().await;
    let storage = IdeaStorage::new(f.pool.clone());

    storage.create_idea(idea_input(&f, "low", (Some(2), Some(2), Some(4)))).await.unwrap();
    storage.create_idea(idea_input(&f, "unscored", (None, None, None))).await.unwrap();
    storage.create_idea(idea_input(&f, "high", (Some(10), Some(9), Some(1)))).await.unwrap();
    storage.create_idea(idea_input(&f, "mid", (Some(6), Some(5), Some(3)))).await.unwrap();

    let top = storage.top_by_ice(&f.project_id, 10).await.unwrap();
    let titles: Vec<_> = top.iter().map(|i| i.title.clone().unwrap()).collect();
    assert_eq!(titles, vec!["high", "mid", "low", "unscored"]);

    let top_two = storage.top_by_ice(&f.project_id, 2).await.unwrap();
    assert_eq!(top_two.len(), 2);
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let f = setup().await;
    let storage = IdeaStorage::new(f.pool.clone());
    let a = storage.create_idea(idea_input(&f, "a", (None, None, None))).await.unwrap();
    storage.create_idea(idea_input(&f, "b", (None, None, None))).await.unwrap();

    storage
        .update_idea(
            &a.id,
            IdeaUpdateInput {
                status: Some(IdeaStatus::Accepted),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let filter = IdeaFilter {
        project_id: Some(f.project_id.clone()),
        status: Some(IdeaStatus::Accepted),
    };
    let (accepted, total) = storage.list_ideas(&filter, 20, 0).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(accepted[0].id, a.id);
}

#[tokio::test]
async fn test_status_changes_are_recorded() {
    let f = setup().await;
    let storage = IdeaStorage::new(f.pool.clone());
    let idea = storage.create_idea(idea_input(&f, "SSO", (None, None, None))).await.unwrap();

    storage
        .update_idea(
            &idea.id,
            IdeaUpdateInput {
                title: Some("Single sign-on".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    storage
        .update_idea(
            &idea.id,
            IdeaUpdateInput {
                status: Some(IdeaStatus::Accepted),
                changed_by: Some(f.stakeholder_id.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let history = StatusHistoryStorage::new(f.pool.clone())
        .list_for_entity(EntityType::Idea, &idea.id)
        .await
        .unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].new_status, "PROPOSED");
    assert_eq!(history[1].old_status.as_deref(), Some("PROPOSED"));
    assert_eq!(history[1].new_status, "ACCEPTED");
}

#[tokio::test]
async fn test_get_existing_skips_unknown_ids() {
    let f = setup().await;
    let storage = IdeaStorage::new(f.pool.clone());
    let idea = storage.create_idea(idea_input(&f, "SSO", (None, None, None))).await.unwrap();

    let found = storage
        .get_existing(&[idea.id.clone(), "idea-missing".to_string()])
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, idea.id);
}

#[tokio::test]
async fn test_delete_idea() {
    let f = setup().await;
    let storage = IdeaStorage::new(f.pool.clone());
    let idea = storage.create_idea(idea_input(&f, "SSO", (None, None, None))).await.unwrap();

    storage.delete_idea(&idea.id).await.unwrap();
    assert!(matches!(
        storage.delete_idea(&idea.id).await,
        Err(StorageError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_create_idea_rejects_stakeholder_of_other_project() {
    let f = setup().await;
    let other = ProjectStorage::new(f.pool.clone())
        .create_project(ProjectCreateInput {
            title: "Billing".to_string(),
            description: None,
            project_status: ProjectStatus::Active,
        })
        .await
        .unwrap();
    let mut input = idea_input(&f, "SSO", (None, None, None));
    input.project_id = other.id.clone();

    let storage = IdeaStorage::new(f.pool.clone());
    match storage.create_idea(input).await {
        Err(StorageError::Validation(errors)) => assert_eq!(errors[0].field, "stakeholder_id"),
        other => panic!("expected validation error, got {:?}", other),
    }
    let (ideas, total) = storage
        .list_ideas(&IdeaFilter::default(), 20, 0)
        .await
        .unwrap();
    assert!(ideas.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_create_ideas_is_all_or_nothing() {
    let f = setup().await;
    let storage = IdeaStorage::new(f.pool.clone());

    let good = idea_input(&f, "SSO", (Some(8), Some(7), Some(2)));
    let bad = idea_input(&f, "Passkeys", (Some(8), Some(7), Some(0)));
    match storage.create_ideas(vec![good, bad]).await {
        Err(StorageError::Validation(errors)) => assert_eq!(errors[0].field, "effort"),
        other => panic!("expected validation error, got {:?}", other),
    }

    let (ideas, total) = storage
        .list_ideas(&IdeaFilter::default(), 20, 0)
        .await
        .unwrap();
    assert!(ideas.is_empty());
    assert_eq!(total, 0);

    let created = storage
        .create_ideas(vec![
            idea_input(&f, "SSO", (None, None, None)),
            idea_input(&f, "Passkeys", (None, None, None)),
        ])
        .await
        .unwrap();
    assert_eq!(created.len(), 2);
}
