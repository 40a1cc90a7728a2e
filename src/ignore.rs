//! Ignore filter for tree traversal.
//!
//! Patterns are shell globs matched against a single entry name (never a whole
//! path). A matching entry is left out of the tree together with everything
//! beneath it, so ignored names are invisible to diffing and to clean deletion.

use crate::error::SyncError;
use glob::{MatchOptions, Pattern};
use tracing::trace;

/// Built-in ignore patterns: editor backups, dotfiles and lock files.
pub const DEFAULT_IGNORES: &[&str] = &["*~", "*.bak", ".*", "#*"];

/// Separator for ignore lists given on the command line or in the environment.
const LIST_SEPARATOR: char = ':';

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled set of ignore globs.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    patterns: Vec<Pattern>,
}

impl IgnoreFilter {
    /// Filter that ignores nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Compile a list of glob patterns.
    pub fn new<I, S>(patterns: I) -> Result<Self, SyncError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Pattern::new(p).map_err(|e| SyncError::InvalidPattern(format!("{}: {}", p, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Filter with the built-in defaults.
    pub fn defaults() -> Self {
        Self {
            patterns: DEFAULT_IGNORES
                .iter()
                .filter_map(|p| Pattern::new(p).ok())
                .collect(),
        }
    }

    /// Parse a colon-separated pattern list; empty items are skipped.
    pub fn parse_list(list: &str) -> Result<Self, SyncError> {
        Self::new(list.split(LIST_SEPARATOR).filter(|p| !p.is_empty()))
    }

    /// Whether an entry called `name` is left out of trees.
    pub fn is_ignored(&self, name: &str) -> bool {
        let ignored = self
            .patterns
            .iter()
            .any(|pattern| pattern.matches_with(name, MATCH_OPTIONS));
        if ignored {
            trace!(name, "Ignoring entry");
        }
        ignored
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Pattern::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
