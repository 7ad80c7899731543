//! Configuration loading for the Delivery Tracker API.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `TRACKER_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const ENV_PREFIX: &str = "TRACKER_";

/// Application configuration derived from `TRACKER_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Populate the store with demo suppliers, deliveries and stats at startup.
    #[serde(default = "default_seed_demo_data")]
    pub seed_demo_data: bool,
    /// Directory receiving uploaded documents.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Maximum accepted size of an upload request body.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default)]
    pub processing: ProcessingConfig,
}

/// Simulated extraction worker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ProcessingConfig {
    /// Delay before an uploaded document is marked processed (default: 2000)
    ///
    /// Environment variable: `TRACKER_PROCESSING_DOCUMENT_DELAY_MS`
    #[serde(default = "default_document_delay_ms")]
    pub document_delay_ms: u64,

    /// Delay before an incoming message is marked processed (default: 1000)
    ///
    /// Environment variable: `TRACKER_PROCESSING_MESSAGE_DELAY_MS`
    #[serde(default = "default_message_delay_ms")]
    pub message_delay_ms: u64,

    /// Capacity of the job queue between intake handlers and the worker (default: 256)
    ///
    /// Environment variable: `TRACKER_PROCESSING_QUEUE_CAPACITY`
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl ProcessingConfig {
    pub fn document_delay(&self) -> Duration {
        Duration::from_millis(self.document_delay_ms)
    }

    pub fn message_delay(&self) -> Duration {
        Duration::from_millis(self.message_delay_ms)
    }

    /// Validate worker configuration bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidQueueCapacity {
                value: self.queue_capacity,
            });
        }

        // Keep simulated delays under ten minutes.
        for (field, value) in [
            ("document delay", self.document_delay_ms),
            ("message delay", self.message_delay_ms),
        ] {
            if value > 600_000 {
                return Err(ConfigError::InvalidProcessingDelay {
                    field: field.to_string(),
                    value,
                });
            }
        }

        Ok(())
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            document_delay_ms: default_document_delay_ms(),
            message_delay_ms: default_message_delay_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            seed_demo_data: default_seed_demo_data(),
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Returns the configured bind address as a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// Returns a pretty JSON representation suitable for startup logs.
    ///
    /// The current schema carries no secrets, so nothing is redacted yet.
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidLogFormat {
                value: self.log_format.clone(),
            });
        }

        if self.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidMaxUploadBytes {
                value: self.max_upload_bytes,
            });
        }

        if self.upload_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingUploadDir);
        }

        self.processing.validate()?;

        Ok(())
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_api_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_seed_demo_data() -> bool {
    true
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024 // 10 MiB
}

fn default_document_delay_ms() -> u64 {
    2000
}

fn default_message_delay_ms() -> u64 {
    1000
}

fn default_queue_capacity() -> usize {
    256
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
    #[error("log format must be 'json' or 'pretty', got '{value}'")]
    InvalidLogFormat { value: String },
    #[error("max upload size must be positive, got {value}")]
    InvalidMaxUploadBytes { value: usize },
    #[error("upload directory must not be empty")]
    MissingUploadDir,
    #[error("processing queue capacity must be positive, got {value}")]
    InvalidQueueCapacity { value: usize },
    #[error("processing {field} must not exceed 600000 ms, got {value}")]
    InvalidProcessingDelay { field: String, value: u64 },
}

/// Loads configuration using layered `.env` files and `TRACKER_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads and validates the configuration.
    ///
    /// Precedence, lowest first: `.env`, `.env.local`, `.env.{profile}`,
    /// `.env.{profile}.local`, then the process environment.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = layered
            .remove("PROFILE")
            .filter(|v| !v.is_empty())
            .unwrap_or(profile_hint);
        let api_bind_addr = layered
            .remove("API_BIND_ADDR")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_api_bind_addr);
        let log_level = layered
            .remove("LOG_LEVEL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_level);
        let log_format = layered
            .remove("LOG_FORMAT")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_format);
        let upload_dir = layered
            .remove("UPLOAD_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_upload_dir);

        let seed_demo_data =
            parse_layered(&mut layered, "SEED_DEMO_DATA")?.unwrap_or_else(default_seed_demo_data);
        let max_upload_bytes = parse_layered(&mut layered, "MAX_UPLOAD_BYTES")?
            .unwrap_or_else(default_max_upload_bytes);

        let processing = ProcessingConfig {
            document_delay_ms: parse_layered(&mut layered, "PROCESSING_DOCUMENT_DELAY_MS")?
                .unwrap_or_else(default_document_delay_ms),
            message_delay_ms: parse_layered(&mut layered, "PROCESSING_MESSAGE_DELAY_MS")?
                .unwrap_or_else(default_message_delay_ms),
            queue_capacity: parse_layered(&mut layered, "PROCESSING_QUEUE_CAPACITY")?
                .unwrap_or_else(default_queue_capacity),
        };

        let config = AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            seed_demo_data,
            upload_dir,
            max_upload_bytes,
            processing,
        };

        config.validate()?;

        match config.bind_addr() {
            Ok(_) => Ok(config),
            Err(source) => Err(ConfigError::InvalidBindAddr {
                value: config.api_bind_addr.clone(),
                source,
            }),
        }
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var(format!("{ENV_PREFIX}PROFILE"))
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes `key` from the layered values and parses it; empty values count as unset.
fn parse_layered<T: std::str::FromStr>(
    layered: &mut BTreeMap<String, String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match layered.remove(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: format!("{ENV_PREFIX}{key}"),
                value: raw,
            }),
    }
}
