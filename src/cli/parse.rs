//! CLI parse: clap types for ferry. No behavior; definitions only.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Ferry CLI - mirror code between a local directory and a remote app
#[derive(Parser)]
#[command(name = "ferry", version)]
#[command(about = "Mirror release or spot code between a local directory and the server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global and project files)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Server base URL (overrides configuration)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stderr, stdout, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Get release or spot code from the server
    ///
    /// Prints deleted entries (D), created directories (C) and saved files (S)
    /// unless --quiet is given.
    Get {
        #[command(flatten)]
        transfer: TransferArgs,
    },
    /// Put release or spot code to the server
    ///
    /// Prints deleted entries (D), created directories (C) and saved files (S)
    /// unless --quiet is given.
    Put {
        #[command(flatten)]
        transfer: TransferArgs,

        /// Evaluate EXPR after put and print the value or exception
        #[arg(short, long)]
        expr: Option<String>,
    },
    /// Evaluate an expression in release or spot code
    Eval {
        /// APP[:SPOT]
        target: String,

        /// Expression to evaluate
        expr: String,

        /// Don't ask for confirmation of release code actions
        #[arg(short, long)]
        force: bool,
    },
    /// Remove stored credentials
    Logout,
}

/// Arguments shared by `get` and `put`.
#[derive(Args, Clone)]
pub struct TransferArgs {
    /// APP[:[OWNER@]SPOT][/REMOTE_PATH]
    pub target: String,

    /// Local path (defaults to REMOTE_PATH base name, or the current directory)
    pub local_path: Option<PathBuf>,

    /// Remove destination entries which don't have corresponding sources
    #[arg(short, long)]
    pub clean: bool,

    /// Replace entries of the other kind and don't ask for confirmation of release code actions
    #[arg(short, long)]
    pub force: bool,

    /// Print nothing
    #[arg(short, long)]
    pub quiet: bool,

    /// Colon separated list of ignored file name wildcards (default "*~:*.bak:.*:#*")
    #[arg(short, long, value_name = "LIST")]
    pub ignore: Option<String>,

    /// Output format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,
}

impl Commands {
    /// Whether the command asked for silence.
    pub fn is_quiet(&self) -> bool {
        match self {
            Commands::Get { transfer } | Commands::Put { transfer, .. } => transfer.quiet,
            Commands::Eval { .. } | Commands::Logout => false,
        }
    }
}
