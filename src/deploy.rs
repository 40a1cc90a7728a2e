//! Deploy engine
//!
//! Applies a [`Diff`] to a destination place. The diff is first turned into a
//! plan tree with one node per touched route, validated against the source
//! snapshot and the retrieved contents, and only then applied top-down. The
//! destination is probed before each mutation, so a diff computed against a
//! destination that changed since still converges.

use crate::error::SyncError;
use crate::place::{Place, Probe};
use crate::tree::diff::Diff;
use crate::tree::entry::Entry;
use crate::types::{Fingerprint, Route};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, instrument, trace};

/// Notified after each successful destination mutation, never on failure.
pub trait TransferObserver {
    fn on_save(&self, _route: &Route) {}
    fn on_create(&self, _route: &Route) {}
    fn on_delete(&self, _route: &Route) {}
}

/// Observer that ignores every notification.
impl TransferObserver for () {}

type Callback<'a> = Box<dyn Fn(&Route) + 'a>;

/// Observer assembled from optional closures.
#[derive(Default)]
pub struct Callbacks<'a> {
    save: Option<Callback<'a>>,
    create: Option<Callback<'a>>,
    delete: Option<Callback<'a>>,
}

impl<'a> Callbacks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_save(mut self, callback: impl Fn(&Route) + 'a) -> Self {
        self.save = Some(Box::new(callback));
        self
    }

    pub fn on_create(mut self, callback: impl Fn(&Route) + 'a) -> Self {
        self.create = Some(Box::new(callback));
        self
    }

    pub fn on_delete(mut self, callback: impl Fn(&Route) + 'a) -> Self {
        self.delete = Some(Box::new(callback));
        self
    }
}

impl TransferObserver for Callbacks<'_> {
    fn on_save(&self, route: &Route) {
        if let Some(callback) = &self.save {
            callback(route);
        }
    }

    fn on_create(&self, route: &Route) {
        if let Some(callback) = &self.create {
            callback(route);
        }
    }

    fn on_delete(&self, route: &Route) {
        if let Some(callback) = &self.delete {
            callback(route);
        }
    }
}

#[derive(Debug)]
enum Op {
    CreateDir,
    Save {
        content: Vec<u8>,
        fingerprint: Fingerprint,
    },
}

#[derive(Debug, Default)]
struct PlanNode {
    op: Option<Op>,
    /// Destination-only children to remove.
    deletes: Vec<String>,
    children: BTreeMap<String, PlanNode>,
}

impl PlanNode {
    fn node_mut(&mut self, route: &Route) -> &mut PlanNode {
        let mut node = self;
        for name in route.segments() {
            node = node.children.entry(name.clone()).or_default();
        }
        node
    }
}

/// Validated, ready-to-apply form of a diff.
#[derive(Debug)]
pub struct Plan {
    root: PlanNode,
    mutations: usize,
}

impl Plan {
    /// Check `diff` against the source snapshot and pair saves with contents.
    ///
    /// `contents` holds one payload per `diff.save` route, in order.
    pub fn build(source: &Entry, diff: &Diff, contents: Vec<Vec<u8>>) -> Result<Self, SyncError> {
        if contents.len() != diff.save.len() {
            return Err(SyncError::InvalidDiff(format!(
                "{} files to save but {} contents",
                diff.save.len(),
                contents.len()
            )));
        }

        let mut root = PlanNode::default();
        let mut seen = HashSet::new();

        for route in &diff.create {
            match source.lookup(route) {
                Some(entry) if entry.is_dir() => {}
                _ => {
                    return Err(SyncError::InvalidDiff(format!(
                        "\"{}\" is not a source directory",
                        route
                    )))
                }
            }
            claim(&mut seen, route)?;
            root.node_mut(route).op = Some(Op::CreateDir);
        }

        for (route, content) in diff.save.iter().zip(contents) {
            let fingerprint = source
                .lookup(route)
                .and_then(Entry::fingerprint)
                .cloned()
                .ok_or_else(|| {
                    SyncError::InvalidDiff(format!("\"{}\" is not a source file", route))
                })?;
            claim(&mut seen, route)?;
            root.node_mut(route).op = Some(Op::Save {
                content,
                fingerprint,
            });
        }

        let mut mutations = diff.create.len() + diff.save.len();
        for route in &diff.delete {
            // A type flip is resolved by the create/save at the same route.
            if seen.contains(route) {
                continue;
            }
            if source.lookup(route).is_some() {
                return Err(SyncError::InvalidDiff(format!(
                    "\"{}\" is deleted but exists in the source",
                    route
                )));
            }
            let (Some(parent), Some(name)) = (route.parent(), route.name()) else {
                return Err(SyncError::InvalidDiff(
                    "the transfer root cannot be deleted".to_string(),
                ));
            };
            root.node_mut(&parent).deletes.push(name.to_string());
            mutations += 1;
        }

        Ok(Self { root, mutations })
    }

    /// Upper bound on the number of mutations applying the plan performs.
    pub fn len(&self) -> usize {
        self.mutations
    }

    pub fn is_empty(&self) -> bool {
        self.mutations == 0
    }
}

fn claim(seen: &mut HashSet<Route>, route: &Route) -> Result<(), SyncError> {
    if !seen.insert(route.clone()) {
        return Err(SyncError::InvalidDiff(format!(
            "\"{}\" is listed more than once",
            route
        )));
    }
    Ok(())
}

/// Applies plans to a destination, notifying an observer.
pub struct Deployer<'a> {
    force: bool,
    observer: &'a dyn TransferObserver,
}

impl<'a> Deployer<'a> {
    pub fn new(force: bool, observer: &'a dyn TransferObserver) -> Self {
        Self { force, observer }
    }

    /// Validate and apply `diff` onto `destination`.
    ///
    /// Nothing is mutated when the diff is inconsistent with `source` or
    /// `contents`. A type mismatch without `force` aborts the remainder;
    /// earlier mutations stay applied.
    #[instrument(skip_all, fields(destination = %destination.describe(), force = self.force))]
    pub fn deploy(
        &self,
        destination: &dyn Place,
        source: &Entry,
        diff: &Diff,
        contents: Vec<Vec<u8>>,
    ) -> Result<(), SyncError> {
        let plan = Plan::build(source, diff, contents)?;
        if plan.is_empty() {
            debug!("Nothing to deploy");
            return Ok(());
        }
        debug!(planned = plan.len(), "Applying plan");
        self.apply(destination, &plan.root, false)
    }

    fn apply(&self, place: &dyn Place, node: &PlanNode, known_missing: bool) -> Result<(), SyncError> {
        let mut children_missing = known_missing;

        match &node.op {
            None => {}
            Some(Op::CreateDir) => {
                let state = if known_missing {
                    Probe::Missing
                } else {
                    place.probe(None)?
                };
                match state {
                    Probe::Missing => {
                        self.create_dir(place)?;
                        children_missing = true;
                    }
                    Probe::Dir => trace!(route = %place.route(), "Directory already present"),
                    Probe::File | Probe::Unchanged => {
                        self.replace(place)?;
                        self.create_dir(place)?;
                        children_missing = true;
                    }
                }
            }
            Some(Op::Save {
                content,
                fingerprint,
            }) => {
                let state = if known_missing {
                    Probe::Missing
                } else {
                    place.probe(Some(fingerprint))?
                };
                match state {
                    Probe::Missing | Probe::File => self.write(place, content)?,
                    Probe::Unchanged => trace!(route = %place.route(), "File already up to date"),
                    Probe::Dir => {
                        self.replace(place)?;
                        self.write(place, content)?;
                    }
                }
            }
        }

        if !children_missing {
            for name in &node.deletes {
                let child = place.child(name);
                if child.probe(None)? == Probe::Missing {
                    trace!(route = %child.route(), "Already removed");
                    continue;
                }
                child.remove()?;
                self.observer.on_delete(child.route());
            }
        }

        for (name, child_node) in &node.children {
            let child = place.child(name);
            self.apply(child.as_ref(), child_node, children_missing)?;
        }
        Ok(())
    }

    /// Remove a conflicting entry, or refuse without `force`.
    fn replace(&self, place: &dyn Place) -> Result<(), SyncError> {
        if !self.force {
            return Err(SyncError::Mismatch {
                route: place.route().clone(),
            });
        }
        debug!(route = %place.route(), "Replacing entry of the other kind");
        place.remove()?;
        self.observer.on_delete(place.route());
        Ok(())
    }

    fn create_dir(&self, place: &dyn Place) -> Result<(), SyncError> {
        place.create_dir()?;
        self.observer.on_create(place.route());
        Ok(())
    }

    fn write(&self, place: &dyn Place, content: &[u8]) -> Result<(), SyncError> {
        place.write(content)?;
        self.observer.on_save(place.route());
        Ok(())
    }
}
