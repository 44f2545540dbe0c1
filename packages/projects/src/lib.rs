// ABOUTME: Project-scoped entity store for reqtrack
// ABOUTME: Projects, stakeholders and documents with SQLite-backed CRUD

pub mod documents;
pub mod projects;
pub mod stakeholders;
pub mod types;
pub mod validator;

pub use documents::DocumentStorage;
pub use projects::ProjectStorage;
pub use stakeholders::{StakeholderDeletion, StakeholderStorage};
pub use types::{
    Document, DocumentCreateInput, DocumentType, DocumentUpdateInput, Project,
    ProjectCreateInput, ProjectStatus, ProjectUpdateInput, Stakeholder, StakeholderCreateInput,
    StakeholderUpdateInput,
};
