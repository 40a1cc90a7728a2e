//! Transfer orchestration: traverse, diff, read, deploy

use crate::deploy::{Deployer, TransferObserver};
use crate::error::SyncError;
use crate::ignore::IgnoreFilter;
use crate::place::Place;
use crate::tree::diff::{diff, Diff};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Options of one transfer.
#[derive(Debug, Clone)]
pub struct TransferOptions {
    /// Replace destination entries whose kind differs from the source.
    pub force: bool,
    /// Remove destination entries absent from the source.
    pub clean: bool,
    /// Names left out of both trees.
    pub ignore: IgnoreFilter,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            force: false,
            clean: false,
            ignore: IgnoreFilter::defaults(),
        }
    }
}

/// Which side of a local/remote pair is the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Remote to local.
    Get,
    /// Local to remote.
    Put,
}

impl Direction {
    /// Order `(local, remote)` as `(source, destination)`.
    pub fn orient<'a>(
        self,
        local: &'a dyn Place,
        remote: &'a dyn Place,
    ) -> (&'a dyn Place, &'a dyn Place) {
        match self {
            Direction::Get => (remote, local),
            Direction::Put => (local, remote),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Get => f.write_str("get"),
            Direction::Put => f.write_str("put"),
        }
    }
}

/// Make `destination` mirror `source` and return the diff that was applied.
///
/// The source must exist; a missing destination is created from scratch.
/// Mutations are reported to `observer` as they succeed. On error the
/// destination may be partially updated; running the transfer again converges.
#[instrument(skip_all, fields(source = %source.describe(), destination = %destination.describe()))]
pub fn transfer(
    source: &dyn Place,
    destination: &dyn Place,
    options: &TransferOptions,
    observer: &dyn TransferObserver,
) -> Result<Diff, SyncError> {
    let started = Instant::now();

    let source_tree = source
        .traverse(&options.ignore)?
        .ok_or_else(|| SyncError::DoesNotExist(source.describe()))?;
    let destination_tree = destination.traverse(&options.ignore)?;
    debug!(
        source_nodes = source_tree.node_count(),
        destination_exists = destination_tree.is_some(),
        "Trees built"
    );

    let diff = diff(&source_tree, destination_tree.as_ref(), options.clean);
    debug!(
        delete = diff.delete.len(),
        create = diff.create.len(),
        save = diff.save.len(),
        "Diff computed"
    );

    let contents = source.read_files(&diff.save)?;
    Deployer::new(options.force, observer).deploy(destination, &source_tree, &diff, contents)?;

    info!(
        actions = diff.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "Transfer completed"
    );
    Ok(diff)
}
