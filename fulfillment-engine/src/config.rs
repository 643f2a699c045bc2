//! Engine configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | DATA_DIR | ./data | Directory holding the database file |
//! | DB_FILE | inventory.redb | Database file name |
//! | LOG_LEVEL | info | tracing level filter |

use std::path::PathBuf;

/// Engine configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding the database file
    pub data_dir: String,
    /// Database file name inside `data_dir`
    pub db_file: String,
    /// Log level: trace | debug | info | warn | error
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            db_file: "inventory.redb".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// Reads a `.env` file first if one is present; unset variables fall
    /// back to the defaults above.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let defaults = Self::default();
        Self {
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            db_file: std::env::var("DB_FILE").unwrap_or(defaults.db_file),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    /// Full path of the database file
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.db_file)
    }
}
