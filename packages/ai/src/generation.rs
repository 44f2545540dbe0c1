// ABOUTME: Generator abstraction and the service that persists generated ideas, requirements and change requests
// ABOUTME: The Anthropic-backed generator is the production implementation; tests substitute their own

use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;
use reqtrack_core::require_non_empty;
use reqtrack_ideas::{Idea, IdeaCreateInput, IdeaFilter, IdeaPriority, IdeaStatus, IdeaStorage};
use reqtrack_projects::{ProjectStorage, StakeholderStorage};
use reqtrack_requirements::{
    ChangeRequest, ChangeRequestCreateInput, ChangeRequestStorage, RequirementCreateInput,
    RequirementStorage, RequirementVersion, RequirementWithVersion, VersionFields,
};
use reqtrack_storage::StorageError;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

use crate::prompts;
use crate::service::{AIService, AIServiceError, AIServiceResult};

/// How many existing ideas and requirements are listed in prompts
const CONTEXT_LIMIT: i64 = 50;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Ai(#[from] AIServiceError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type GenerationResult<T> = Result<T, GenerationError>;

/// An idea as proposed by the generator, before it is stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedIdea {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub priority: IdeaPriority,
    #[serde(default)]
    pub impact: Option<i64>,
    #[serde(default)]
    pub confidence: Option<i64>,
    #[serde(default)]
    pub effort: Option<i64>,
    #[serde(default)]
    pub conflicts: Option<String>,
    #[serde(default)]
    pub dependencies: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExtractedIdeas {
    ideas: Vec<GeneratedIdea>,
}

#[derive(Debug, Deserialize)]
struct DerivedRequirements {
    requirements: Vec<VersionFields>,
}

/// Descriptive fields of a generated change request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftedChangeRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub cost: Option<String>,
    #[serde(default)]
    pub benefit: Option<String>,
}

/// What the generator is told about the project
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    pub project_title: String,
    pub idea_titles: Vec<String>,
    pub requirement_titles: Vec<String>,
}

impl ProjectContext {
    pub fn render(&self) -> String {
        let mut out = format!("# Project context\nProject: {}\n", self.project_title);
        for (heading, titles) in [
            ("Existing ideas", &self.idea_titles),
            ("Existing requirements", &self.requirement_titles),
        ] {
            let _ = writeln!(out, "\n## {}", heading);
            if titles.is_empty() {
                out.push_str("(none)\n");
            }
            for title in titles {
                let _ = writeln!(out, "- {}", title);
            }
        }
        out
    }
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn extract_ideas(
        &self,
        text: &str,
        context: &ProjectContext,
    ) -> AIServiceResult<Vec<GeneratedIdea>>;

    async fn derive_requirements(
        &self,
        ideas: &[Idea],
        context: &ProjectContext,
    ) -> AIServiceResult<Vec<VersionFields>>;

    async fn draft_change_request(
        &self,
        base: &RequirementVersion,
        proposed: &RequirementVersion,
        context: &ProjectContext,
    ) -> AIServiceResult<DraftedChangeRequest>;
}

/// Generator backed by the Anthropic Messages API
pub struct AnthropicGenerator {
    service: AIService,
}

impl AnthropicGenerator {
    pub fn new(service: AIService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Generator for AnthropicGenerator {
    async fn extract_ideas(
        &self,
        text: &str,
        context: &ProjectContext,
    ) -> AIServiceResult<Vec<GeneratedIdea>> {
        let response = self
            .service
            .generate_structured::<ExtractedIdeas>(
                prompts::extract_ideas_prompt(text, context),
                Some(prompts::EXTRACT_IDEAS_SYSTEM.to_string()),
            )
            .await?;
        info!(
            "Extracted {} ideas ({} tokens)",
            response.data.ideas.len(),
            response.usage.total_tokens()
        );
        Ok(response.data.ideas)
    }

    async fn derive_requirements(
        &self,
        ideas: &[Idea],
        context: &ProjectContext,
    ) -> AIServiceResult<Vec<VersionFields>> {
        let response = self
            .service
            .generate_structured::<DerivedRequirements>(
                prompts::derive_requirements_prompt(ideas, context),
                Some(prompts::DERIVE_REQUIREMENTS_SYSTEM.to_string()),
            )
            .await?;
        info!(
            "Derived {} requirements ({} tokens)",
            response.data.requirements.len(),
            response.usage.total_tokens()
        );
        Ok(response.data.requirements)
    }

    async fn draft_change_request(
        &self,
        base: &RequirementVersion,
        proposed: &RequirementVersion,
        context: &ProjectContext,
    ) -> AIServiceResult<DraftedChangeRequest> {
        let response = self
            .service
            .generate_structured::<DraftedChangeRequest>(
                prompts::draft_change_request_prompt(base, proposed, context),
                Some(prompts::DRAFT_CHANGE_REQUEST_SYSTEM.to_string()),
            )
            .await?;
        Ok(response.data)
    }
}

/// Runs a generator against the store and persists what it produces
pub struct GenerationService {
    pool: SqlitePool,
    generator: Arc<dyn Generator>,
}

impl GenerationService {
    pub fn new(pool: SqlitePool, generator: Arc<dyn Generator>) -> Self {
        Self { pool, generator }
    }

    /// Extract ideas from free text and store them as PROPOSED.
    ///
    /// Without explicit ids the first project and its first stakeholder
    /// are used.
    pub async fn generate_ideas(
        &self,
        text: &str,
        project_id: Option<&str>,
        stakeholder_id: Option<&str>,
    ) -> GenerationResult<Vec<Idea>> {
        if let Some(error) = require_non_empty("text", text) {
            return Err(StorageError::Validation(vec![error]).into());
        }

        let projects = ProjectStorage::new(self.pool.clone());
        let project = match project_id {
            Some(id) => projects.get_project(id).await?,
            None => projects
                .first_project()
                .await?
                .ok_or_else(|| StorageError::NotFound("Project".to_string()))?,
        };

        let stakeholders = StakeholderStorage::new(self.pool.clone());
        let stakeholder = match stakeholder_id {
            Some(id) => stakeholders.get_stakeholder(id).await?,
            None => stakeholders
                .first_for_project(&project.id)
                .await?
                .ok_or_else(|| {
                    StorageError::NotFound(format!("Stakeholder for project '{}'", project.id))
                })?,
        };

        let context = self.context(&project.id, &project.title).await?;
        let generated = self.generator.extract_ideas(text, &context).await?;

        let inputs: Vec<IdeaCreateInput> = generated
            .into_iter()
            .map(|idea| IdeaCreateInput {
                project_id: project.id.clone(),
                stakeholder_id: stakeholder.id.clone(),
                title: idea.title,
                description: idea.description,
                category: if idea.category.trim().is_empty() {
                    "general".to_string()
                } else {
                    idea.category
                },
                conflicts: idea.conflicts,
                dependencies: idea.dependencies,
                status: IdeaStatus::Proposed,
                priority: idea.priority,
                impact: idea.impact.map(|v| v.clamp(0, 10)),
                confidence: idea.confidence.map(|v| v.clamp(0, 10)),
                effort: idea.effort.map(|v| v.clamp(1, 10)),
            })
            .collect();

        let created = IdeaStorage::new(self.pool.clone())
            .create_ideas(inputs)
            .await?;

        info!(
            "Generated {} ideas for project {}",
            created.len(),
            project.id
        );
        Ok(created)
    }

    /// Derive requirements from stored ideas.
    ///
    /// Unknown idea ids are skipped. Every requirement is linked to all the
    /// source ideas and owned by the first idea's stakeholder.
    pub async fn generate_requirements(
        &self,
        idea_ids: &[String],
    ) -> GenerationResult<Vec<RequirementWithVersion>> {
        let ideas = IdeaStorage::new(self.pool.clone())
            .get_existing(idea_ids)
            .await?;
        let first = ideas
            .first()
            .ok_or_else(|| StorageError::NotFound("Ideas".to_string()))?;

        if ideas.len() < idea_ids.len() {
            warn!(
                "Skipping {} unknown idea ids",
                idea_ids.len() - ideas.len()
            );
        }

        let project = ProjectStorage::new(self.pool.clone())
            .get_project(&first.project_id)
            .await?;
        let context = self.context(&project.id, &project.title).await?;
        let generated = self.generator.derive_requirements(&ideas, &context).await?;

        let inputs = generated
            .into_iter()
            .map(|mut fields| {
                fields.priority = fields.priority.clamp(1, 5);
                RequirementCreateInput {
                    project_id: project.id.clone(),
                    stakeholder_id: first.stakeholder_id.clone(),
                    initial_version: fields,
                }
            })
            .collect();
        let idea_ids: Vec<String> = ideas.iter().map(|idea| idea.id.clone()).collect();
        let created = RequirementStorage::new(self.pool.clone())
            .create_requirements(inputs, &idea_ids)
            .await?;

        info!(
            "Generated {} requirements from {} ideas",
            created.len(),
            ideas.len()
        );
        Ok(created)
    }

    /// Draft a PENDING change request describing the step from `base` to `next`
    pub async fn generate_change_request(
        &self,
        requirement_id: &str,
        base_version_id: &str,
        next_version_id: &str,
    ) -> GenerationResult<ChangeRequest> {
        let requirements = RequirementStorage::new(self.pool.clone());
        let requirement = requirements.get_requirement(requirement_id).await?;
        let base = requirements.get_version(requirement_id, base_version_id).await?;
        let next = requirements.get_version(requirement_id, next_version_id).await?;

        let project = ProjectStorage::new(self.pool.clone())
            .get_project(&requirement.requirement.project_id)
            .await?;
        let context = self.context(&project.id, &project.title).await?;
        let drafted = self
            .generator
            .draft_change_request(&base, &next, &context)
            .await?;

        let change_request = ChangeRequestStorage::new(self.pool.clone())
            .create_change_request(ChangeRequestCreateInput {
                requirement_id: requirement_id.to_string(),
                stakeholder_id: next.stakeholder_id.clone(),
                base_version_id: base.id.clone(),
                next_version_id: Some(next.id.clone()),
                title: drafted.title,
                summary: drafted.summary,
                cost: drafted.cost,
                benefit: drafted.benefit,
                proposed_changes: None,
            })
            .await?;

        Ok(change_request)
    }

    async fn context(&self, project_id: &str, project_title: &str) -> GenerationResult<ProjectContext> {
        let filter = IdeaFilter {
            project_id: Some(project_id.to_string()),
            ..Default::default()
        };
        let (ideas, _) = IdeaStorage::new(self.pool.clone())
            .list_ideas(&filter, CONTEXT_LIMIT, 0)
            .await?;
        let (requirements, _) = RequirementStorage::new(self.pool.clone())
            .list_requirements(Some(project_id), CONTEXT_LIMIT, 0)
            .await?;

        Ok(ProjectContext {
            project_title: project_title.to_string(),
            idea_titles: ideas
                .into_iter()
                .map(|idea| idea.title.unwrap_or(idea.category))
                .collect(),
            requirement_titles: requirements
                .into_iter()
                .filter_map(|r| r.current_version.map(|v| v.title))
                .collect(),
        })
    }
}
