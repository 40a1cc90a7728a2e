//! CLI domain: parse, route, help and output only.
//! No sync logic; a single route table dispatches to the engine.

mod help;
mod output;
mod parse;
mod route;

pub use help::command_name;
pub use output::{format_report_text, map_error, Mark, ReportLine};
pub use parse::{Cli, Commands, TransferArgs};
pub use route::RunContext;
