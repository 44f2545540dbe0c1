// ABOUTME: Core types and utilities for reqtrack
// ABOUTME: Foundational package providing ids, validation and scoring shared by all packages

pub mod constants;
pub mod scoring;
pub mod utils;
pub mod validation;

// Re-export constants
pub use constants::{database_file, reqtrack_dir, DATABASE_FILE_NAME};

// Re-export utilities
pub use utils::{generate_id, like_pattern, non_empty};

// Re-export scoring
pub use scoring::ice_score;

// Re-export validation
pub use validation::{check_range, require_non_empty, ValidationError, ValidationErrors};
