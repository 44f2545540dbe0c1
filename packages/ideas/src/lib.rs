// ABOUTME: Idea management for reqtrack
// ABOUTME: Idea CRUD, status history and ICE-ranked listings

pub mod storage;
pub mod types;

pub use storage::IdeaStorage;
pub use types::{Idea, IdeaCreateInput, IdeaFilter, IdeaPriority, IdeaStatus, IdeaUpdateInput};
