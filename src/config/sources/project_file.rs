//! Project config file source: .ferry.toml in the working directory

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::File;
use config::FileFormat;
use std::path::{Path, PathBuf};
use tracing::trace;

pub const PROJECT_CONFIG_FILE: &str = ".ferry.toml";

pub fn project_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(PROJECT_CONFIG_FILE)
}

/// Add the project config file to builder if it exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    project_dir: &Path,
) -> ConfigBuilder<DefaultState> {
    let path = project_config_path(project_dir);
    if !path.exists() {
        return builder;
    }
    trace!(config_path = %path.display(), "Using project config file");
    builder.add_source(File::from(path).format(FileFormat::Toml).required(false))
}
