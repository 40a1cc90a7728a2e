//! Tree builder assembling an [`Entry`] snapshot from pre-order records

use crate::error::SyncError;
use crate::tree::entry::Entry;
use crate::types::{Fingerprint, Route};
use std::time::Instant;
use tracing::{debug, trace};

/// Builds a directory snapshot one record at a time.
///
/// Records must arrive parent-first: a route can only be added once its
/// parent directory has been added. Backends feed it from a filesystem walk
/// or from a flattened remote listing.
pub struct TreeBuilder {
    root: Entry,
    started: Instant,
    records: usize,
}

impl TreeBuilder {
    /// Start an empty root directory
    pub fn new() -> Self {
        Self {
            root: Entry::dir(),
            started: Instant::now(),
            records: 0,
        }
    }

    /// Add a directory at `route`
    pub fn add_dir(&mut self, route: &Route) -> Result<(), SyncError> {
        trace!(route = %route, "Adding directory");
        self.add(route, Entry::dir())
    }

    /// Add a file at `route`
    pub fn add_file(&mut self, route: &Route, fingerprint: Fingerprint) -> Result<(), SyncError> {
        trace!(route = %route, fingerprint = %fingerprint, "Adding file");
        self.add(route, Entry::file(fingerprint))
    }

    fn add(&mut self, route: &Route, entry: Entry) -> Result<(), SyncError> {
        if !self.root.insert(route, entry) {
            return Err(SyncError::Protocol(format!(
                "entry \"{}\" has no parent directory",
                route
            )));
        }
        self.records += 1;
        Ok(())
    }

    /// Finish and return the root directory
    pub fn build(self) -> Entry {
        debug!(
            node_count = self.records + 1,
            duration_ms = self.started.elapsed().as_millis() as u64,
            "Tree build completed"
        );
        self.root
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
