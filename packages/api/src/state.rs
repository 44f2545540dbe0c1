// ABOUTME: Shared state handed to every API handler
// ABOUTME: SQLite pool, one storage per entity and the optional generation service

use std::sync::Arc;

use reqtrack_ai::{GenerationService, Generator};
use reqtrack_ideas::IdeaStorage;
use reqtrack_projects::{DocumentStorage, ProjectStorage, StakeholderStorage};
use reqtrack_requirements::{ChangeRequestStorage, RequirementStorage};
use reqtrack_storage::StatusHistoryStorage;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct DbState {
    pub pool: SqlitePool,
    pub project_storage: Arc<ProjectStorage>,
    pub stakeholder_storage: Arc<StakeholderStorage>,
    pub document_storage: Arc<DocumentStorage>,
    pub idea_storage: Arc<IdeaStorage>,
    pub requirement_storage: Arc<RequirementStorage>,
    pub change_request_storage: Arc<ChangeRequestStorage>,
    pub history_storage: Arc<StatusHistoryStorage>,
    /// None when no generator is configured; AI routes answer 503
    pub generation: Option<Arc<GenerationService>>,
}

impl DbState {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            project_storage: Arc::new(ProjectStorage::new(pool.clone())),
            stakeholder_storage: Arc::new(StakeholderStorage::new(pool.clone())),
            document_storage: Arc::new(DocumentStorage::new(pool.clone())),
            idea_storage: Arc::new(IdeaStorage::new(pool.clone())),
            requirement_storage: Arc::new(RequirementStorage::new(pool.clone())),
            change_request_storage: Arc::new(ChangeRequestStorage::new(pool.clone())),
            history_storage: Arc::new(StatusHistoryStorage::new(pool.clone())),
            generation: None,
            pool,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generation = Some(Arc::new(GenerationService::new(
            self.pool.clone(),
            generator,
        )));
        self
    }
}
