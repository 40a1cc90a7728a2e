//! Merge rules: defaults, override order, conflict handling.

use crate::ignore::DEFAULT_IGNORES;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Address of the public server.
pub const DEFAULT_SERVER: &str = "http://www.akshell.com";

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override earlier ones key by key; lists such as `ignore`
/// are replaced as a whole, never concatenated.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("server", DEFAULT_SERVER)?
        .set_default("ignore", DEFAULT_IGNORES.to_vec())?
        .set_default("http.connect_timeout_secs", 10)?
        .set_default("http.request_timeout_secs", 120)
}
