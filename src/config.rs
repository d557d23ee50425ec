//! Server configuration loaded from environment variables.

use std::path::PathBuf;

use anyhow::{Context, Result};

const APP_NAME: &str = "sheetdesk";
const DB_FILE: &str = "sheetdesk.db";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind (from SHEETDESK_HOST)
    pub host: String,
    /// Port for the HTTP API (from SHEETDESK_PORT)
    pub port: u16,
    /// SQLite file (from SHEETDESK_DB). Defaults to the platform data directory.
    pub database_path: Option<PathBuf>,
    /// Bearer key required on admin routes (from SHEETDESK_ADMIN_KEY)
    pub admin_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_path: None,
            admin_key: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let port = match lookup("SHEETDESK_PORT") {
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("Invalid SHEETDESK_PORT value: {value}"))?,
            None => defaults.port,
        };

        Ok(Self {
            host: lookup("SHEETDESK_HOST").unwrap_or(defaults.host),
            port,
            database_path: lookup("SHEETDESK_DB").map(PathBuf::from),
            admin_key: lookup("SHEETDESK_ADMIN_KEY").filter(|key| !key.is_empty()),
        })
    }

    /// Where the database lives: the configured path, or the platform data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }
        let dirs = directories::ProjectDirs::from("", "", APP_NAME)
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join(DB_FILE))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
