//! Application settings, read from `settings.toml` in the working
//! directory.
//!
//! The `server` section is optional: without it the process has nothing
//! to supervise and exits right away.

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level for the tracing filter, e.g. `info` or `debug`.
    pub level: String,
}

/// Database backing the server.
///
/// In TOML either `database = "memory"` or `database = { sqlite = "path" }`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub database: Database,
    /// Bind address, defaults to 127.0.0.1.
    pub bind: Option<String>,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}
