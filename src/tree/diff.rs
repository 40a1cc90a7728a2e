//! Diff computation between two tree snapshots

use crate::tree::entry::Entry;
use crate::types::Route;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered action plan turning a destination tree into a copy of a source tree.
///
/// `create` lists a directory before any of its descendants. `delete` names
/// only the topmost node of a removed subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    pub delete: Vec<Route>,
    pub create: Vec<Route>,
    pub save: Vec<Route>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.create.is_empty() && self.save.is_empty()
    }

    /// Total number of scheduled actions.
    pub fn len(&self) -> usize {
        self.delete.len() + self.create.len() + self.save.len()
    }
}

/// Compute the diff that makes `destination` mirror `source`.
///
/// A missing destination schedules the whole source tree. With `clean`,
/// destination-only entries are scheduled for deletion once per subtree root.
pub fn diff(source: &Entry, destination: Option<&Entry>, clean: bool) -> Diff {
    let mut result = Diff::default();
    let root = Route::root();
    match destination {
        Some(destination) => diff_at(source, destination, clean, &mut result, &root),
        None => create_at(source, &mut result, &root),
    }
    result
}

/// Schedule `source` as if nothing existed at `route`.
fn create_at(source: &Entry, diff: &mut Diff, route: &Route) {
    match source {
        Entry::File { .. } => diff.save.push(route.clone()),
        Entry::Dir { children } => {
            diff.create.push(route.clone());
            for (name, child) in children {
                create_at(child, diff, &route.join(name));
            }
        }
    }
}

fn diff_at(source: &Entry, destination: &Entry, clean: bool, diff: &mut Diff, route: &Route) {
    match (source, destination) {
        (Entry::File { fingerprint: src }, Entry::File { fingerprint: dst }) => {
            if src != dst {
                diff.save.push(route.clone());
            }
        }
        (Entry::File { .. }, Entry::Dir { .. }) | (Entry::Dir { .. }, Entry::File { .. }) => {
            diff.delete.push(route.clone());
            create_at(source, diff, route);
        }
        (Entry::Dir { children: src }, Entry::Dir { children: dst }) => {
            diff_children(src, dst, clean, diff, route);
        }
    }
}

fn diff_children(
    source: &BTreeMap<String, Entry>,
    destination: &BTreeMap<String, Entry>,
    clean: bool,
    diff: &mut Diff,
    route: &Route,
) {
    for (name, src_child) in source {
        let child_route = route.join(name);
        match destination.get(name) {
            Some(dst_child) => diff_at(src_child, dst_child, clean, diff, &child_route),
            None => create_at(src_child, diff, &child_route),
        }
    }
    if clean {
        for name in destination.keys() {
            if !source.contains_key(name) {
                diff.delete.push(route.join(name));
            }
        }
    }
}
