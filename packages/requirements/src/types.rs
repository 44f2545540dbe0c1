// ABOUTME: Requirement, version and change request type definitions
// ABOUTME: Enums, row structs, request inputs and the change request state machine

use chrono::{DateTime, Utc};
use reqtrack_core::{check_range, require_non_empty, ValidationError, ValidationErrors};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequirementType {
    Business,
    Stakeholder,
    #[default]
    Functional,
    NonFunctional,
    Constraint,
    System,
    Transition,
    Interface,
    User,
    Regulatory,
    Operational,
    Security,
    Performance,
}

impl RequirementType {
    /// Unknown names fall back to `FUNCTIONAL`
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "BUSINESS" => RequirementType::Business,
            "STAKEHOLDER" => RequirementType::Stakeholder,
            "NON_FUNCTIONAL" | "NONFUNCTIONAL" => RequirementType::NonFunctional,
            "CONSTRAINT" => RequirementType::Constraint,
            "SYSTEM" => RequirementType::System,
            "TRANSITION" => RequirementType::Transition,
            "INTERFACE" => RequirementType::Interface,
            "USER" => RequirementType::User,
            "REGULATORY" => RequirementType::Regulatory,
            "OPERATIONAL" => RequirementType::Operational,
            "SECURITY" => RequirementType::Security,
            "PERFORMANCE" => RequirementType::Performance,
            _ => RequirementType::Functional,
        }
    }
}

impl<'de> Deserialize<'de> for RequirementType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(RequirementType::parse_lenient(&raw))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequirementStatus {
    #[default]
    Draft,
    Review,
    Approved,
    Rejected,
    Implemented,
    Archived,
    Deprecated,
}

impl RequirementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementStatus::Draft => "DRAFT",
            RequirementStatus::Review => "REVIEW",
            RequirementStatus::Approved => "APPROVED",
            RequirementStatus::Rejected => "REJECTED",
            RequirementStatus::Implemented => "IMPLEMENTED",
            RequirementStatus::Archived => "ARCHIVED",
            RequirementStatus::Deprecated => "DEPRECATED",
        }
    }
}

fn default_priority() -> i64 {
    3
}

/// Content of a requirement version as supplied by callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionFields {
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(rename = "type", default)]
    pub req_type: RequirementType,
    #[serde(default)]
    pub status: RequirementStatus,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default)]
    pub conflicts: Option<String>,
    #[serde(default)]
    pub dependencies: Option<String>,
}

impl VersionFields {
    /// Minimal fields with defaults for everything optional
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            category: category.into(),
            req_type: RequirementType::default(),
            status: RequirementStatus::default(),
            priority: default_priority(),
            conflicts: None,
            dependencies: None,
        }
    }

    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = ValidationErrors::new();
        errors.extend(require_non_empty("title", &self.title));
        errors.extend(require_non_empty("description", &self.description));
        errors.extend(require_non_empty("category", &self.category));
        errors.extend(check_range("priority", self.priority, 1, 5));
        errors.into_result()
    }
}

/// Partial version content, laid over an existing set of fields
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VersionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub req_type: Option<RequirementType>,
    pub status: Option<RequirementStatus>,
    pub priority: Option<i64>,
    pub conflicts: Option<String>,
    pub dependencies: Option<String>,
}

impl VersionPatch {
    pub fn apply(&self, mut fields: VersionFields) -> VersionFields {
        if let Some(title) = &self.title {
            fields.title = title.clone();
        }
        if let Some(description) = &self.description {
            fields.description = description.clone();
        }
        if let Some(category) = &self.category {
            fields.category = category.clone();
        }
        if let Some(req_type) = self.req_type {
            fields.req_type = req_type;
        }
        if let Some(status) = self.status {
            fields.status = status;
        }
        if let Some(priority) = self.priority {
            fields.priority = priority;
        }
        if self.conflicts.is_some() {
            fields.conflicts = self.conflicts.clone();
        }
        if self.dependencies.is_some() {
            fields.dependencies = self.dependencies.clone();
        }
        fields
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Requirement {
    pub id: String,
    pub project_id: String,
    pub current_version_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RequirementVersion {
    pub id: String,
    pub requirement_id: String,
    pub stakeholder_id: String,
    pub version_number: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub req_type: RequirementType,
    pub status: RequirementStatus,
    pub priority: i64,
    pub conflicts: Option<String>,
    pub dependencies: Option<String>,
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RequirementVersion {
    pub fn fields(&self) -> VersionFields {
        VersionFields {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            req_type: self.req_type,
            status: self.status,
            priority: self.priority,
            conflicts: self.conflicts.clone(),
            dependencies: self.dependencies.clone(),
        }
    }
}

/// A requirement as returned to clients: its current version and linked ideas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementWithVersion {
    #[serde(flatten)]
    pub requirement: Requirement,
    pub current_version: Option<RequirementVersion>,
    pub idea_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequirementCreateInput {
    pub project_id: String,
    pub stakeholder_id: String,
    pub initial_version: VersionFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionCreateInput {
    pub stakeholder_id: String,
    #[serde(flatten)]
    pub fields: VersionFields,
    /// Promote the new version to current in the same transaction
    #[serde(default)]
    pub make_current: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionUpdateInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub req_type: Option<RequirementType>,
    pub status: Option<RequirementStatus>,
    pub priority: Option<i64>,
    pub conflicts: Option<String>,
    pub dependencies: Option<String>,
    pub stakeholder_id: Option<String>,
    pub changed_by: Option<String>,
}

impl VersionUpdateInput {
    /// True when anything other than the status would change
    pub fn touches_content(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.category.is_some()
            || self.req_type.is_some()
            || self.priority.is_some()
            || self.conflicts.is_some()
            || self.dependencies.is_some()
            || self.stakeholder_id.is_some()
    }

    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = ValidationErrors::new();
        for (field, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("category", &self.category),
        ] {
            if let Some(value) = value {
                errors.extend(require_non_empty(field, value));
            }
        }
        if let Some(priority) = self.priority {
            errors.extend(check_range("priority", priority, 1, 5));
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeRequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Implemented,
}

impl ChangeRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeRequestStatus::Pending => "PENDING",
            ChangeRequestStatus::Approved => "APPROVED",
            ChangeRequestStatus::Rejected => "REJECTED",
            ChangeRequestStatus::Implemented => "IMPLEMENTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChangeRequestStatus::Rejected | ChangeRequestStatus::Implemented
        )
    }

    /// PENDING -> APPROVED | REJECTED, APPROVED -> IMPLEMENTED
    pub fn can_transition_to(&self, next: ChangeRequestStatus) -> bool {
        use ChangeRequestStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Approved, Implemented)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub id: String,
    pub requirement_id: String,
    pub stakeholder_id: String,
    pub base_version_id: String,
    pub next_version_id: Option<String>,
    pub title: Option<String>,
    pub summary: String,
    pub cost: Option<String>,
    pub benefit: Option<String>,
    pub proposed_changes: Option<VersionFields>,
    pub status: ChangeRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for ChangeRequest {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let proposed_changes: Option<String> = row.try_get("proposed_changes")?;
        let proposed_changes = proposed_changes
            .map(|raw| serde_json::from_str::<VersionFields>(&raw))
            .transpose()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "proposed_changes".to_string(),
                source: Box::new(e),
            })?;

        Ok(ChangeRequest {
            id: row.try_get("id")?,
            requirement_id: row.try_get("requirement_id")?,
            stakeholder_id: row.try_get("stakeholder_id")?,
            base_version_id: row.try_get("base_version_id")?,
            next_version_id: row.try_get("next_version_id")?,
            title: row.try_get("title")?,
            summary: row.try_get("summary")?,
            cost: row.try_get("cost")?,
            benefit: row.try_get("benefit")?,
            proposed_changes,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeRequestCreateInput {
    pub requirement_id: String,
    pub stakeholder_id: String,
    pub base_version_id: String,
    #[serde(default)]
    pub next_version_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub cost: Option<String>,
    #[serde(default)]
    pub benefit: Option<String>,
    #[serde(default)]
    pub proposed_changes: Option<VersionFields>,
}

impl ChangeRequestCreateInput {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = ValidationErrors::new();
        errors.extend(require_non_empty("summary", &self.summary));
        errors.extend(require_non_empty("stakeholder_id", &self.stakeholder_id));
        errors.extend(require_non_empty("base_version_id", &self.base_version_id));
        if let Some(fields) = &self.proposed_changes {
            if let Err(nested) = fields.validate() {
                errors.extend(nested.into_iter().map(|e| {
                    ValidationError::new(format!("proposed_changes.{}", e.field), e.message)
                }));
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApproveInput {
    /// Changes for the new version, laid over the stored proposed changes
    /// or, without those, over the base version
    #[serde(default)]
    pub next_version: Option<VersionPatch>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RejectInput {
    #[serde(default)]
    pub rejected_by: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImplementInput {
    /// Also make the approved version the requirement's current version
    #[serde(default)]
    pub promote: bool,
    #[serde(default)]
    pub implemented_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeRequestUpdateInput {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub cost: Option<String>,
    pub benefit: Option<String>,
}

/// Administrative status override, bypassing the transition rules
#[derive(Debug, Clone, Deserialize)]
pub struct ForceStatusInput {
    pub status: ChangeRequestStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub changed_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeRequestFilter {
    pub requirement_id: Option<String>,
    pub stakeholder_id: Option<String>,
    pub status: Option<ChangeRequestStatus>,
}
