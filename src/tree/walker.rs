//! Filesystem walker for traversing local directory structures

use crate::error::SyncError;
use crate::ignore::IgnoreFilter;
use crate::types::Route;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Filesystem entry found below the walk root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEntry {
    /// A file with its route from the walk root
    File { route: Route },
    /// A directory with its route from the walk root
    Directory { route: Route },
}

impl WalkEntry {
    pub fn route(&self) -> &Route {
        match self {
            WalkEntry::File { route } | WalkEntry::Directory { route } => route,
        }
    }
}

/// Filesystem walker configuration
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Whether to follow symbolic links (default: true, links look like their targets)
    pub follow_symlinks: bool,
    /// Names to leave out, together with everything beneath them
    pub ignore: IgnoreFilter,
}

/// Filesystem walker
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    /// Create a walker with custom configuration
    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    /// Walk below the root and collect all entries
    ///
    /// Entries come in pre-order (a directory before its contents) with
    /// siblings sorted by name. The root itself is not reported.
    pub fn walk(&self) -> Result<Vec<WalkEntry>, SyncError> {
        let ignore = &self.config.ignore;
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !ignore.is_ignored(&entry.file_name().to_string_lossy())
            });

        let mut entries = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.root.clone());
                SyncError::io(path, e.into())
            })?;

            let route = self.route_of(entry.path());
            let file_type = entry.file_type();
            if file_type.is_dir() {
                entries.push(WalkEntry::Directory { route });
            } else if file_type.is_file() {
                entries.push(WalkEntry::File { route });
            }
            // Sockets, fifos and dangling links have no counterpart in a tree
        }

        Ok(entries)
    }

    fn route_of(&self, path: &Path) -> Route {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect()
    }
}
