//! Places: cursors over one location of a storage backend
//!
//! A place addresses one location in either the local filesystem or the remote
//! tree. The diff and deploy code only ever talks to the [`Place`] trait, so
//! backend specifics (redirects, content-type discrimination, caching) stay
//! inside the two implementations.

pub mod local;
pub mod remote;

use crate::error::SyncError;
use crate::ignore::IgnoreFilter;
use crate::tree::entry::Entry;
use crate::types::{Fingerprint, Route};

pub use local::LocalPlace;
pub use remote::{RemotePlace, RemoteTree};

/// Result of [`Place::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    /// The backend proved the content equals the fingerprint it was given.
    Unchanged,
    File {
        content: Vec<u8>,
        fingerprint: Fingerprint,
    },
    /// Names of the directory's children.
    Dir { names: Vec<String> },
}

/// Result of [`Place::probe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Missing,
    File,
    Dir,
    /// A file whose content matches the fingerprint the probe was given.
    Unchanged,
}

/// Capability interface shared by the local and remote backends.
pub trait Place {
    /// Logical route of this place relative to the transfer root.
    fn route(&self) -> &Route;

    /// Human-readable location for messages.
    fn describe(&self) -> String;

    /// Content identity at this location; `None` for directories and missing entries.
    fn fingerprint(&self) -> Result<Option<Fingerprint>, SyncError>;

    /// Load the entry at this location.
    ///
    /// Fails with [`SyncError::DoesNotExist`] when nothing is there.
    fn fetch(&self, if_different_than: Option<&Fingerprint>) -> Result<Fetched, SyncError>;

    /// Determine the shape of this location without transferring content.
    fn probe(&self, if_different_than: Option<&Fingerprint>) -> Result<Probe, SyncError>;

    /// Persist file content at this location.
    fn write(&self, content: &[u8]) -> Result<(), SyncError>;

    /// Delete the file, or recursively the directory, at this location.
    fn remove(&self) -> Result<(), SyncError>;

    /// Create an empty directory; the parent must exist.
    fn create_dir(&self) -> Result<(), SyncError>;

    /// Place for `name` nested under this one.
    fn child(&self, name: &str) -> Box<dyn Place>;

    /// Build the tree rooted here, leaving out ignored names.
    ///
    /// Returns `None` when the location does not exist.
    fn traverse(&self, ignore: &IgnoreFilter) -> Result<Option<Entry>, SyncError>;

    /// Content of the files at `routes` (relative to this place), in order.
    fn read_files(&self, routes: &[Route]) -> Result<Vec<Vec<u8>>, SyncError> {
        routes
            .iter()
            .map(|route| {
                let fetched = match descend(self, route) {
                    Some(place) => place.fetch(None)?,
                    None => self.fetch(None)?,
                };
                match fetched {
                    Fetched::File { content, .. } => Ok(content),
                    Fetched::Dir { .. } => Err(SyncError::Protocol(format!(
                        "expected a file at {}",
                        describe_route(self, route)
                    ))),
                    Fetched::Unchanged => Err(SyncError::Protocol(format!(
                        "unconditional fetch of {} answered unchanged",
                        describe_route(self, route)
                    ))),
                }
            })
            .collect()
    }
}

/// Navigate from `place` along `route`; `None` for the empty route.
pub fn descend<P: Place + ?Sized>(place: &P, route: &Route) -> Option<Box<dyn Place>> {
    let mut segments = route.segments().iter();
    let first = segments.next()?;
    let mut current = place.child(first);
    for name in segments {
        current = current.child(name);
    }
    Some(current)
}

fn describe_route<P: Place + ?Sized>(place: &P, route: &Route) -> String {
    match descend(place, route) {
        Some(child) => child.describe(),
        None => place.describe(),
    }
}
