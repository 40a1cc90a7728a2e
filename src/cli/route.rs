//! CLI route: single route table and run context. Dispatches to the sync engine and output.

use crate::cli::output::{
    format_report_json, format_report_text, Mark, ReportLine, TransferReport,
};
use crate::cli::parse::{Commands, TransferArgs};
use crate::config::{ConfigLoader, FerryConfig};
use crate::deploy::Callbacks;
use crate::error::SyncError;
use crate::ignore::IgnoreFilter;
use crate::place::remote::{evaluate, HttpClient, RemoteTarget, RemoteTree};
use crate::place::LocalPlace;
use crate::session::Session;
use crate::sync::{transfer, Direction, TransferOptions};
use crate::types::Route;
use std::cell::RefCell;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Runtime context for CLI execution: resolved configuration and project directory.
pub struct RunContext {
    config: FerryConfig,
    project_dir: PathBuf,
}

impl RunContext {
    /// Load configuration for `project_dir`. `server` overrides the configured server.
    pub fn new(
        project_dir: PathBuf,
        config_path: Option<PathBuf>,
        server: Option<String>,
    ) -> Result<Self, SyncError> {
        let mut config = ConfigLoader::load(&project_dir, config_path.as_deref())?;
        if let Some(server) = server {
            config.server = server;
            config.server_url()?;
        }
        Ok(Self::with_config(project_dir, config))
    }

    pub fn with_config(project_dir: PathBuf, config: FerryConfig) -> Self {
        Self {
            config,
            project_dir,
        }
    }

    pub fn config(&self) -> &FerryConfig {
        &self.config
    }

    pub fn execute(&self, command: &Commands) -> Result<String, SyncError> {
        match command {
            Commands::Get { transfer } => self.handle_transfer(Direction::Get, transfer, None),
            Commands::Put { transfer, expr } => {
                self.handle_transfer(Direction::Put, transfer, expr.as_deref())
            }
            Commands::Eval {
                target,
                expr,
                force,
            } => self.handle_eval(target, expr, *force),
            Commands::Logout => self.handle_logout(),
        }
    }

    fn handle_transfer(
        &self,
        direction: Direction,
        args: &TransferArgs,
        expr: Option<&str>,
    ) -> Result<String, SyncError> {
        let target: RemoteTarget = args.target.parse()?;
        let ignore = match &args.ignore {
            Some(list) => IgnoreFilter::parse_list(list)?,
            None => self.config.ignore_filter()?,
        };
        let local_path = args
            .local_path
            .clone()
            .unwrap_or_else(|| default_local_path(&target));

        if direction == Direction::Put
            && target.is_release()
            && !args.force
            && !confirm("Put release code")?
        {
            return Ok(String::new());
        }

        let session = self.session()?;
        let client = HttpClient::new(&self.config.http.settings(), &session)?;
        let server = self.config.server_url()?;
        let remote_tree = RemoteTree::connect(client.clone(), &server, &target, &session)?;
        let remote = remote_tree.place(&target.path);
        let local = LocalPlace::new(self.project_dir.join(&local_path));

        info!(
            direction = %direction,
            target = %target,
            local_path = %local_path.display(),
            "Starting transfer"
        );

        let report = RefCell::new(Vec::new());
        let record = |mark: Mark, route: &Route| {
            report.borrow_mut().push(ReportLine {
                mark,
                path: display_path(direction, &target, &local_path, route),
            });
        };
        let callbacks = Callbacks::new()
            .on_delete(|route| record(Mark::Delete, route))
            .on_create(|route| record(Mark::Create, route))
            .on_save(|route| record(Mark::Save, route));

        let options = TransferOptions {
            force: args.force,
            clean: args.clean,
            ignore,
        };
        let (source, destination) = direction.orient(&local, &remote);
        let diff = transfer(source, destination, &options, &callbacks)?;
        drop(callbacks);
        let applied = report.into_inner();
        debug!(planned = diff.len(), applied = applied.len(), "Transfer finished");

        let mut output = Vec::new();
        if !args.quiet {
            let rendered = if args.format == "json" {
                format_report_json(&TransferReport {
                    direction: if direction == Direction::Get { "get" } else { "put" },
                    target: target.to_string(),
                    local_path: local_path.display().to_string(),
                    diff: &diff,
                    applied: &applied,
                })?
            } else {
                format_report_text(&applied, use_color())
            };
            if !rendered.is_empty() {
                output.push(rendered);
            }
        }
        if let Some(expr) = expr {
            let evaluation = evaluate(&client, &server, &target.app, target.spot.as_deref(), expr)?;
            output.push(evaluation.output);
        }
        Ok(output.join("\n"))
    }

    fn handle_eval(&self, target: &str, expr: &str, force: bool) -> Result<String, SyncError> {
        let target: RemoteTarget = target.parse()?;
        if target.owner.is_some() || !target.path.is_root() {
            return Err(SyncError::InvalidTarget(format!(
                "\"{}\" must have the form APP[:SPOT]",
                target
            )));
        }
        if target.is_release() && !force && !confirm("Evaluate in release code")? {
            return Ok(String::new());
        }

        let session = self.session()?;
        let client = HttpClient::new(&self.config.http.settings(), &session)?;
        let evaluation = evaluate(
            &client,
            &self.config.server_url()?,
            &target.app,
            target.spot.as_deref(),
            expr,
        )?;
        Ok(evaluation.output)
    }

    fn handle_logout(&self) -> Result<String, SyncError> {
        let dir = self.config.credentials_dir()?;
        Session::clear(&dir)?;
        Ok(format!("Removed stored credentials from {}", dir.display()))
    }

    fn session(&self) -> Result<Session, SyncError> {
        Session::load(&self.config.credentials_dir()?)
    }
}

/// Base name of the remote path, or the current directory.
fn default_local_path(target: &RemoteTarget) -> PathBuf {
    target
        .path
        .name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Reported path: local for `get`, remote for `put`.
fn display_path(direction: Direction, target: &RemoteTarget, local_path: &Path, route: &Route) -> String {
    match direction {
        Direction::Get => {
            let mut path = local_path.to_path_buf();
            path.extend(route.segments());
            path.display().to_string()
        }
        Direction::Put => target.path.concat(route).to_slash_path(),
    }
}

fn confirm(question: &str) -> Result<bool, SyncError> {
    dialoguer::Confirm::new()
        .with_prompt(question)
        .default(false)
        .interact()
        .map_err(|e| SyncError::Config(format!("Failed to get user input: {}", e)))
}

fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}
