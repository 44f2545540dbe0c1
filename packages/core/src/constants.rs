use std::env;
use std::path::PathBuf;

/// File name of the SQLite database inside the data directory
pub const DATABASE_FILE_NAME: &str = "reqtrack.db";

/// Get the path to the reqtrack directory (~/.reqtrack)
pub fn reqtrack_dir() -> PathBuf {
    // HOME first so tests can point it at a temp dir
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".reqtrack")
    } else {
        dirs::home_dir()
            .unwrap_or_else(env::temp_dir)
            .join(".reqtrack")
    }
}

/// Get the path to the default database file (~/.reqtrack/reqtrack.db)
pub fn database_file() -> PathBuf {
    reqtrack_dir().join(DATABASE_FILE_NAME)
}
