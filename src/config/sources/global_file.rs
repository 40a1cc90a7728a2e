//! Global config file source: $XDG_CONFIG_HOME/ferry/config.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::File;
use config::FileFormat;
use std::path::PathBuf;
use tracing::trace;

/// Path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("ferry").join("config.toml"))
}

/// Add the global config file source to builder if it exists.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    match global_config_path() {
        Some(path) if path.exists() => {
            trace!(config_path = %path.display(), "Using global config file");
            builder.add_source(File::from(path).format(FileFormat::Toml).required(false))
        }
        _ => builder,
    }
}
