use crate::errors::{IntakeError, IntakeResult};
use config::{ConfigError, Environment};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    /// Upper bound for JSON bodies; signatures arrive inline as data URLs
    pub max_payload_bytes: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Filesystem,
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub upload_dir: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScoringConfig {
    /// Reject unknown answer tags instead of scoring them as zero
    pub strict_tags: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            // Server defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8090)?
            .set_default("server.workers", 4)?
            .set_default("server.max_payload_bytes", 4 * 1024 * 1024)?
            // Storage defaults
            .set_default("storage.backend", "filesystem")?
            .set_default("storage.upload_dir", "./public/uploads")?
            // Scoring
            .set_default("scoring.strict_tags", false)?;

        builder = builder.add_source(Environment::with_prefix("INTAKE_SERVICE").separator("__"));

        // Override from environment variables
        if let Ok(port) = env::var("SERVICE_PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        if let Ok(upload_dir) = env::var("UPLOAD_DIR") {
            builder = builder.set_override("storage.upload_dir", upload_dir)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> IntakeResult<()> {
        if self.server.workers == 0 {
            return Err(IntakeError::Configuration(
                "server.workers must be greater than 0".to_string(),
            ));
        }

        if self.server.max_payload_bytes == 0 {
            return Err(IntakeError::Configuration(
                "server.max_payload_bytes must be greater than 0".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::Filesystem
            && self.storage.upload_dir.as_os_str().is_empty()
        {
            return Err(IntakeError::Configuration(
                "storage.upload_dir is required for the filesystem backend".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8090,
                workers: 4,
                max_payload_bytes: 4 * 1024 * 1024,
            },
            storage: StorageConfig {
                backend: StorageBackend::Filesystem,
                upload_dir: PathBuf::from("./public/uploads"),
            },
            scoring: ScoringConfig { strict_tags: false },
        }
    }
}
