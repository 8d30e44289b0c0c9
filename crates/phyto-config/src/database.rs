//! Local libSQL database configuration.

use serde::{Deserialize, Serialize};

fn default_path() -> String {
    ".phyto/phyto.db".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path of the local database file, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

impl DatabaseConfig {
    /// Whether the database lives only in memory (tests, dry runs).
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }
}
