use chrono::{DateTime, Utc};
use reqtrack_core::{check_range, require_non_empty, ValidationError, ValidationErrors};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdeaStatus {
    #[default]
    Proposed,
    Accepted,
    Rejected,
    Implemented,
    Archived,
}

impl IdeaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaStatus::Proposed => "PROPOSED",
            IdeaStatus::Accepted => "ACCEPTED",
            IdeaStatus::Rejected => "REJECTED",
            IdeaStatus::Implemented => "IMPLEMENTED",
            IdeaStatus::Archived => "ARCHIVED",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdeaPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// An idea with its derived ICE score.
///
/// `ice_score` is never stored; it is filled from the row's impact,
/// confidence and effort every time an idea is read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
    pub id: String,
    pub project_id: String,
    pub stakeholder_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub conflicts: Option<String>,
    pub dependencies: Option<String>,
    pub status: IdeaStatus,
    pub priority: IdeaPriority,
    pub impact: Option<i64>,
    pub confidence: Option<i64>,
    pub effort: Option<i64>,
    pub ice_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Idea {
    pub fn compute_ice(impact: Option<i64>, confidence: Option<i64>, effort: Option<i64>) -> Option<f64> {
        reqtrack_core::ice_score(impact?, confidence?, effort?)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Idea {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let impact: Option<i64> = row.try_get("impact")?;
        let confidence: Option<i64> = row.try_get("confidence")?;
        let effort: Option<i64> = row.try_get("effort")?;

        Ok(Idea {
            id: row.try_get("id")?,
            project_id: row.try_get("project_id")?,
            stakeholder_id: row.try_get("stakeholder_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            conflicts: row.try_get("conflicts")?,
            dependencies: row.try_get("dependencies")?,
            status: row.try_get("status")?,
            priority: row.try_get("priority")?,
            impact,
            confidence,
            effort,
            ice_score: Idea::compute_ice(impact, confidence, effort),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdeaCreateInput {
    pub project_id: String,
    pub stakeholder_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub conflicts: Option<String>,
    pub dependencies: Option<String>,
    #[serde(default)]
    pub status: IdeaStatus,
    #[serde(default)]
    pub priority: IdeaPriority,
    pub impact: Option<i64>,
    pub confidence: Option<i64>,
    pub effort: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdeaUpdateInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub conflicts: Option<String>,
    pub dependencies: Option<String>,
    pub status: Option<IdeaStatus>,
    pub priority: Option<IdeaPriority>,
    pub impact: Option<i64>,
    pub confidence: Option<i64>,
    pub effort: Option<i64>,
    /// Stakeholder credited with a status change
    pub changed_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdeaFilter {
    pub project_id: Option<String>,
    pub status: Option<IdeaStatus>,
}

fn check_scores(
    errors: &mut ValidationErrors,
    impact: Option<i64>,
    confidence: Option<i64>,
    effort: Option<i64>,
) {
    if let Some(v) = impact {
        errors.extend(check_range("impact", v, 0, 10));
    }
    if let Some(v) = confidence {
        errors.extend(check_range("confidence", v, 0, 10));
    }
    if let Some(v) = effort {
        errors.extend(check_range("effort", v, 1, 10));
    }
}

impl IdeaCreateInput {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = ValidationErrors::new();
        errors.extend(require_non_empty("category", &self.category));
        errors.extend(require_non_empty("stakeholder_id", &self.stakeholder_id));
        check_scores(&mut errors, self.impact, self.confidence, self.effort);
        errors.into_result()
    }
}

impl IdeaUpdateInput {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = ValidationErrors::new();
        if let Some(category) = &self.category {
            errors.extend(require_non_empty("category", category));
        }
        check_scores(&mut errors, self.impact, self.confidence, self.effort);
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_ice_requires_all_inputs() {
        assert_eq!(Idea::compute_ice(Some(9), Some(8), None), None);
        assert_eq!(Idea::compute_ice(None, Some(8), Some(2)), None);
        assert_eq!(Idea::compute_ice(Some(6), Some(5), Some(3)), Some(10.0));
    }

    #[test]
    fn test_effort_zero_is_rejected_by_validation() {
        let input = IdeaUpdateInput {
            effort: Some(0),
            ..Default::default()
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors[0].field, "effort");
    }

    #[test]
    fn test_scores_out_of_range() {
        let input = IdeaUpdateInput {
            impact: Some(11),
            confidence: Some(-1),
            ..Default::default()
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
