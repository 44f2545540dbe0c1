use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    Active,
    Inactive,
    Archived,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub project_status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectCreateInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_status: ProjectStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdateInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_status: Option<ProjectStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Stakeholder {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StakeholderCreateInput {
    pub project_id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StakeholderUpdateInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Document classification.
///
/// Deserialization accepts the legacy names (`SPECIFICATION`, `EMAIL`,
/// `REPORT`, `OTHER`) and maps anything unknown to `MEETING_NOTES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    PlanningDocuments,
    RequirementsDocuments,
    DesignDocuments,
    TechnicalDocuments,
    TestingDocuments,
    ManagementReports,
    MeetingNotes,
    ContractDocuments,
    UserGuides,
    ReleaseNotes,
}

impl DocumentType {
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "PLANNING_DOCUMENTS" => DocumentType::PlanningDocuments,
            "REQUIREMENTS_DOCUMENTS" | "SPECIFICATION" => DocumentType::RequirementsDocuments,
            "DESIGN_DOCUMENTS" => DocumentType::DesignDocuments,
            "TECHNICAL_DOCUMENTS" | "OTHER" => DocumentType::TechnicalDocuments,
            "TESTING_DOCUMENTS" => DocumentType::TestingDocuments,
            "MANAGEMENT_REPORTS" | "REPORT" => DocumentType::ManagementReports,
            "CONTRACT_DOCUMENTS" => DocumentType::ContractDocuments,
            "USER_GUIDES" => DocumentType::UserGuides,
            "RELEASE_NOTES" => DocumentType::ReleaseNotes,
            _ => DocumentType::MeetingNotes,
        }
    }
}

impl<'de> Deserialize<'de> for DocumentType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(DocumentType::parse_lenient(&raw))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: String,
    pub project_id: String,
    pub stakeholder_id: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub doc_type: DocumentType,
    pub title: Option<String>,
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentCreateInput {
    pub project_id: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub title: Option<String>,
    pub text: Option<String>,
    pub stakeholder_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentUpdateInput {
    #[serde(rename = "type")]
    pub doc_type: Option<DocumentType>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub stakeholder_id: Option<String>,
}
