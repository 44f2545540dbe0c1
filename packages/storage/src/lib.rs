// ABOUTME: Data layer and persistence for reqtrack
// ABOUTME: SQLite pool setup, embedded migrations, shared storage errors and the status audit log

pub mod database;
pub mod error;
pub mod history;
pub mod lookup;

pub use database::{connect, connect_in_memory, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use lookup::{ensure_exists, ensure_stakeholder_in_project, project_of};
pub use history::{EntityType, NewStatusChange, StatusHistoryEntry, StatusHistoryStorage};
