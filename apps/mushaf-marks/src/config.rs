//! Configuration management for the Mushaf Marks service

use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Writable annotations database, created on demand
    pub marks_url: String,
    /// Read-only verse text database
    pub verses_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    pub timeout_ms: u64,
}

impl PersistenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                marks_url: "sqlite:./marks.db".to_string(),
                verses_url: "sqlite:./resources/database/quran.db".to_string(),
            },
            persistence: PersistenceConfig { timeout_ms: 5000 },
        }
    }
}

impl Config {
    /// Read settings from the environment; each unset or unparsable key
    /// keeps its default independently of the others.
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.server.port),
            },
            database: DatabaseConfig {
                marks_url: env::var("MARKS_DATABASE_URL").unwrap_or(defaults.database.marks_url),
                verses_url: env::var("VERSES_DATABASE_URL")
                    .unwrap_or(defaults.database.verses_url),
            },
            persistence: PersistenceConfig {
                timeout_ms: env::var("PERSISTENCE_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.persistence.timeout_ms),
            },
        }
    }
}
