//! Snapshot of a tree of files and directories

use crate::types::{Fingerprint, Route};
use std::collections::BTreeMap;

/// One node of a tree snapshot.
///
/// Children are kept in a sorted map so every walk over a snapshot visits
/// siblings in the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    File { fingerprint: Fingerprint },
    Dir { children: BTreeMap<String, Entry> },
}

impl Entry {
    pub fn file(fingerprint: Fingerprint) -> Self {
        Entry::File { fingerprint }
    }

    /// An empty directory.
    pub fn dir() -> Self {
        Entry::Dir {
            children: BTreeMap::new(),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Entry::Dir { .. })
    }

    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        match self {
            Entry::File { fingerprint } => Some(fingerprint),
            Entry::Dir { .. } => None,
        }
    }

    pub fn children(&self) -> Option<&BTreeMap<String, Entry>> {
        match self {
            Entry::Dir { children } => Some(children),
            Entry::File { .. } => None,
        }
    }

    /// Find the entry at `route` below this one.
    pub fn lookup(&self, route: &Route) -> Option<&Entry> {
        let mut current = self;
        for name in route.segments() {
            current = current.children()?.get(name)?;
        }
        Some(current)
    }

    /// Insert `entry` at `route`, whose parent must already be a directory.
    ///
    /// Returns `false` (and leaves the tree untouched) when the parent is
    /// missing or is a file, or when `route` is the root.
    pub fn insert(&mut self, route: &Route, entry: Entry) -> bool {
        let Some((name, parents)) = route.segments().split_last() else {
            return false;
        };
        let mut current = self;
        for parent in parents {
            current = match current {
                Entry::Dir { children } => match children.get_mut(parent) {
                    Some(child) => child,
                    None => return false,
                },
                Entry::File { .. } => return false,
            };
        }
        match current {
            Entry::Dir { children } => {
                children.insert(name.clone(), entry);
                true
            }
            Entry::File { .. } => false,
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        match self {
            Entry::File { .. } => 1,
            Entry::Dir { children } => 1 + children.values().map(Entry::node_count).sum::<usize>(),
        }
    }
}
