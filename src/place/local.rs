//! Local filesystem backend
//!
//! Routes map onto nested paths below a root directory. File content is read
//! at most once per transfer: every place derived from the same root shares one
//! content cache, so fingerprinting during traversal and the later content
//! retrieval never read the same file twice.

use crate::error::SyncError;
use crate::ignore::IgnoreFilter;
use crate::place::{Fetched, Place, Probe};
use crate::tree::builder::TreeBuilder;
use crate::tree::entry::Entry;
use crate::tree::hasher;
use crate::tree::walker::{WalkEntry, Walker, WalkerConfig};
use crate::types::{Fingerprint, Route};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, instrument, trace};

#[derive(Debug, Clone)]
struct CachedFile {
    content: Rc<Vec<u8>>,
    fingerprint: Fingerprint,
}

#[derive(Debug)]
struct LocalRoot {
    path: PathBuf,
    files: RefCell<HashMap<Route, CachedFile>>,
}

/// Place in the local filesystem
#[derive(Debug, Clone)]
pub struct LocalPlace {
    root: Rc<LocalRoot>,
    route: Route,
}

impl LocalPlace {
    /// Place for the transfer root at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            root: Rc::new(LocalRoot {
                path: path.into(),
                files: RefCell::new(HashMap::new()),
            }),
            route: Route::root(),
        }
    }

    /// Filesystem path of this place
    pub fn path(&self) -> PathBuf {
        self.path_of(&self.route)
    }

    fn path_of(&self, route: &Route) -> PathBuf {
        let mut path = self.root.path.clone();
        path.extend(route.segments());
        path
    }

    fn at(&self, route: Route) -> LocalPlace {
        LocalPlace {
            root: Rc::clone(&self.root),
            route,
        }
    }

    /// Read (or recall) the content of the file at this place
    fn load(&self) -> Result<CachedFile, SyncError> {
        if let Some(cached) = self.root.files.borrow().get(&self.route) {
            trace!(route = %self.route, "Content cache hit");
            return Ok(cached.clone());
        }
        let path = self.path();
        let content = fs::read(&path).map_err(|e| self.map_io(&path, e))?;
        Ok(self.remember(content))
    }

    fn remember(&self, content: Vec<u8>) -> CachedFile {
        let cached = CachedFile {
            fingerprint: hasher::compute_fingerprint(&content),
            content: Rc::new(content),
        };
        self.root
            .files
            .borrow_mut()
            .insert(self.route.clone(), cached.clone());
        cached
    }

    fn forget(&self) {
        self.root
            .files
            .borrow_mut()
            .retain(|route, _| !route.starts_with(&self.route));
    }

    fn map_io(&self, path: &Path, error: std::io::Error) -> SyncError {
        if error.kind() == ErrorKind::NotFound {
            SyncError::DoesNotExist(self.describe())
        } else {
            SyncError::io(path, error)
        }
    }

    fn metadata(&self) -> Result<Option<fs::Metadata>, SyncError> {
        let path = self.path();
        match fs::metadata(&path) {
            Ok(metadata) => Ok(Some(metadata)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SyncError::io(path, e)),
        }
    }
}

impl Place for LocalPlace {
    fn route(&self) -> &Route {
        &self.route
    }

    fn describe(&self) -> String {
        format!("Local entry {:?}", self.path())
    }

    fn fingerprint(&self) -> Result<Option<Fingerprint>, SyncError> {
        match self.metadata()? {
            Some(metadata) if metadata.is_file() => Ok(Some(self.load()?.fingerprint)),
            _ => Ok(None),
        }
    }

    fn fetch(&self, _if_different_than: Option<&Fingerprint>) -> Result<Fetched, SyncError> {
        // No cheaper way to prove equality locally than reading the file.
        let Some(metadata) = self.metadata()? else {
            return Err(SyncError::DoesNotExist(self.describe()));
        };
        if metadata.is_dir() {
            let path = self.path();
            let mut names = fs::read_dir(&path)
                .map_err(|e| SyncError::io(&path, e))?
                .map(|entry| {
                    entry
                        .map(|e| e.file_name().to_string_lossy().into_owned())
                        .map_err(|e| SyncError::io(&path, e))
                })
                .collect::<Result<Vec<_>, _>>()?;
            names.sort();
            return Ok(Fetched::Dir { names });
        }
        let cached = self.load()?;
        Ok(Fetched::File {
            content: cached.content.as_ref().clone(),
            fingerprint: cached.fingerprint,
        })
    }

    fn probe(&self, if_different_than: Option<&Fingerprint>) -> Result<Probe, SyncError> {
        let Some(metadata) = self.metadata()? else {
            return Ok(Probe::Missing);
        };
        if metadata.is_dir() {
            return Ok(Probe::Dir);
        }
        match if_different_than {
            Some(expected) if self.load()?.fingerprint == *expected => Ok(Probe::Unchanged),
            _ => Ok(Probe::File),
        }
    }

    fn write(&self, content: &[u8]) -> Result<(), SyncError> {
        let path = self.path();
        fs::write(&path, content).map_err(|e| SyncError::io(&path, e))?;
        self.remember(content.to_vec());
        debug!(path = %path.display(), bytes = content.len(), "Wrote file");
        Ok(())
    }

    fn remove(&self) -> Result<(), SyncError> {
        let path = self.path();
        let metadata = fs::symlink_metadata(&path).map_err(|e| self.map_io(&path, e))?;
        let removed = if metadata.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| SyncError::io(&path, e))?;
        self.forget();
        debug!(path = %path.display(), "Removed entry");
        Ok(())
    }

    fn create_dir(&self) -> Result<(), SyncError> {
        let path = self.path();
        fs::create_dir(&path).map_err(|e| SyncError::io(&path, e))?;
        debug!(path = %path.display(), "Created directory");
        Ok(())
    }

    fn child(&self, name: &str) -> Box<dyn Place> {
        Box::new(self.at(self.route.join(name)))
    }

    #[instrument(skip(self, ignore), fields(path = %self.path().display()))]
    fn traverse(&self, ignore: &IgnoreFilter) -> Result<Option<Entry>, SyncError> {
        let Some(metadata) = self.metadata()? else {
            debug!("Local root does not exist");
            return Ok(None);
        };
        if !metadata.is_dir() {
            return Ok(Some(Entry::file(self.load()?.fingerprint)));
        }

        let config = WalkerConfig {
            follow_symlinks: true,
            ignore: ignore.clone(),
        };
        let mut builder = TreeBuilder::new();
        for entry in Walker::with_config(self.path(), config).walk()? {
            match entry {
                WalkEntry::Directory { route } => builder.add_dir(&route)?,
                WalkEntry::File { route } => {
                    let fingerprint = self.at(self.route.concat(&route)).load()?.fingerprint;
                    builder.add_file(&route, fingerprint)?;
                }
            }
        }
        Ok(Some(builder.build()))
    }
}
