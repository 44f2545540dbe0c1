use reqtrack_core::{require_non_empty, ValidationError, ValidationErrors};

use crate::types::{
    ProjectCreateInput, ProjectUpdateInput, StakeholderCreateInput, StakeholderUpdateInput,
};

pub fn validate_project_create(input: &ProjectCreateInput) -> Result<(), Vec<ValidationError>> {
    let mut errors = ValidationErrors::new();
    errors.extend(require_non_empty("title", &input.title));
    errors.into_result()
}

pub fn validate_project_update(input: &ProjectUpdateInput) -> Result<(), Vec<ValidationError>> {
    let mut errors = ValidationErrors::new();
    if let Some(title) = &input.title {
        errors.extend(require_non_empty("title", title));
    }
    errors.into_result()
}

pub fn validate_stakeholder_create(
    input: &StakeholderCreateInput,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = ValidationErrors::new();
    errors.extend(require_non_empty("name", &input.name));
    errors.extend(require_non_empty("email", &input.email));
    errors.extend(require_non_empty("role", &input.role));
    if !input.email.trim().is_empty() && !input.email.contains('@') {
        errors.push(ValidationError::new("email", "email must contain '@'"));
    }
    errors.into_result()
}

pub fn validate_stakeholder_update(
    input: &StakeholderUpdateInput,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = ValidationErrors::new();
    for (field, value) in [
        ("name", &input.name),
        ("email", &input.email),
        ("role", &input.role),
    ] {
        if let Some(value) = value {
            errors.extend(require_non_empty(field, value));
        }
    }
    if let Some(email) = &input.email {
        if !email.trim().is_empty() && !email.contains('@') {
            errors.push(ValidationError::new("email", "email must contain '@'"));
        }
    }
    errors.into_result()
}
