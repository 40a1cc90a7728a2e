//! Configuration System
//!
//! Layered configuration: built-in defaults, the global config file, the
//! project's `.ferry.toml`, an explicit `--config` file and finally `FERRY_*`
//! environment variables (`FERRY_HTTP__REQUEST_TIMEOUT_SECS=30`,
//! `FERRY_IGNORE='*.tmp:.git'`). Later layers override earlier ones.

use crate::error::SyncError;
use crate::ignore::IgnoreFilter;
use crate::logging::LoggingConfig;
use crate::place::remote::HttpSettings;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

mod merge;
mod sources;

pub use merge::merge_policy::DEFAULT_SERVER;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FerryConfig {
    /// Server base URL
    #[serde(default = "default_server")]
    pub server: String,

    /// Directory holding the stored credentials (defaults to the user config dir)
    #[serde(default)]
    pub credentials_dir: Option<PathBuf>,

    /// Ignored file name globs
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_server() -> String {
    DEFAULT_SERVER.to_string()
}

fn default_ignore() -> Vec<String> {
    crate::ignore::DEFAULT_IGNORES
        .iter()
        .map(|pattern| pattern.to_string())
        .collect()
}

impl Default for FerryConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            credentials_dir: None,
            ignore: default_ignore(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl HttpConfig {
    pub fn settings(&self) -> HttpSettings {
        HttpSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Server(String),
    Ignore(String),
    Http(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Server(msg) => write!(f, "Server: {}", msg),
            ValidationError::Ignore(msg) => write!(f, "Ignore: {}", msg),
            ValidationError::Http(msg) => write!(f, "HTTP: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl FerryConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.server_url() {
            errors.push(ValidationError::Server(e.to_string()));
        }
        if let Err(e) = self.ignore_filter() {
            errors.push(ValidationError::Ignore(e.to_string()));
        }
        if self.http.connect_timeout_secs == 0 || self.http.request_timeout_secs == 0 {
            errors.push(ValidationError::Http(
                "timeouts must be at least one second".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Parsed server URL; only `http` and `https` are accepted.
    pub fn server_url(&self) -> Result<Url, SyncError> {
        let url = Url::parse(&self.server)
            .map_err(|e| SyncError::Config(format!("invalid server URL {:?}: {}", self.server, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(SyncError::Config(format!(
                "unsupported server URL scheme {:?}",
                scheme
            ))),
        }
    }

    pub fn ignore_filter(&self) -> Result<IgnoreFilter, SyncError> {
        IgnoreFilter::new(&self.ignore)
    }

    /// Credential directory, falling back to the per-user default.
    pub fn credentials_dir(&self) -> Result<PathBuf, SyncError> {
        self.credentials_dir
            .clone()
            .or_else(crate::session::default_credentials_dir)
            .ok_or_else(|| {
                SyncError::Config("cannot determine the credentials directory".to_string())
            })
    }
}

/// Loads [`FerryConfig`] from all configuration layers.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load every layer. `explicit` is a file given on the command line.
    pub fn load(project_dir: &Path, explicit: Option<&Path>) -> Result<FerryConfig, SyncError> {
        Self::build(project_dir, explicit, true)
    }

    /// Load defaults plus a single file, ignoring user and environment layers.
    pub fn load_from_file(path: &Path) -> Result<FerryConfig, SyncError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        Self::finish(builder.add_source(toml_file(path, true)))
    }

    fn build(
        project_dir: &Path,
        explicit: Option<&Path>,
        user_layers: bool,
    ) -> Result<FerryConfig, SyncError> {
        let mut builder = merge::merge_policy::builder_with_defaults()?;
        if user_layers {
            builder = sources::global_file::add_to_builder(builder);
        }
        builder = sources::project_file::add_to_builder(builder, project_dir);
        if let Some(path) = explicit {
            builder = builder.add_source(toml_file(path, true));
        }
        if user_layers {
            builder = builder.add_source(
                Environment::with_prefix("FERRY")
                    .separator("__")
                    .list_separator(":")
                    .with_list_parse_key("ignore")
                    .try_parsing(true),
            );
        }
        Self::finish(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<FerryConfig, SyncError> {
        let config: FerryConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            SyncError::Config(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;
        debug!(server = %config.server, ignore = ?config.ignore, "Configuration loaded");
        Ok(config)
    }
}

fn toml_file(path: &Path, required: bool) -> File<config::FileSourceFile, FileFormat> {
    File::from(path).format(FileFormat::Toml).required(required)
}
