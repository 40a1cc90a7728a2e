//! CLI command-name contract for logging.

use crate::cli::parse::Commands;

/// Command name string for log records (e.g. "get", "eval").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Get { .. } => "get",
        Commands::Put { .. } => "put",
        Commands::Eval { .. } => "eval",
        Commands::Logout => "logout",
    }
}
