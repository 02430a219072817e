//! Store configuration, loadable from TOML.
//!
//! ```toml
//! path = "bookmarks.db"
//! busy_timeout_ms = 2000
//!
//! [[schema.tables]]
//! name = "bookmarks"
//! columns = [
//!     { name = "id", clause = "integer primary key autoincrement" },
//!     { name = "title", clause = "text not null" },
//! ]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::schema::Schema;

/// Table store configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
    /// How long to wait on a lock held by another connection before
    /// failing with "database is locked". Unset keeps the engine default.
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
    /// Tables created when the store is opened
    #[serde(default)]
    pub schema: Schema,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>, schema: Schema) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: None,
            schema,
        }
    }

    pub fn with_busy_timeout_ms(mut self, ms: u64) -> Self {
        self.busy_timeout_ms = Some(ms);
        self
    }

    pub fn from_toml_str(content: &str) -> StoreResult<Self> {
        toml::from_str(content)
            .map_err(|e| StoreError::Config(format!("failed to parse TOML config: {e}")))
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), tables = config.schema.tables.len(), "store config loaded");
        Ok(config)
    }
}
