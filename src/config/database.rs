use serde::{Deserialize, Serialize};

/// Job-state persistence configuration.
///
/// The persisted purge job is the only record the service keeps, so the
/// database needs are tiny; SQLite covers every real deployment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum DatabaseConfig {
    /// No database. Job state lives in memory: a restart abandons any
    /// in-flight job. Local mode only.
    #[default]
    None,

    /// SQLite database file.
    #[cfg(feature = "database-sqlite")]
    Sqlite(SqliteConfig),
}

impl DatabaseConfig {
    pub fn is_none(&self) -> bool {
        matches!(self, DatabaseConfig::None)
    }
}

/// SQLite configuration.
#[cfg(feature = "database-sqlite")]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteConfig {
    /// Path to the SQLite database file.
    pub path: String,

    /// Create the database file if it doesn't exist.
    #[serde(default = "default_true")]
    pub create_if_missing: bool,
}

#[cfg(feature = "database-sqlite")]
fn default_true() -> bool {
    true
}
