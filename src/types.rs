//! Core value types shared by the tree model, the places and the deploy engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque content identity of a file.
///
/// Only ever compared for equality; never decoded. Locally computed values come
/// from [`crate::tree::hasher::compute_fingerprint`], remote values are whatever
/// the server reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered path segments locating an entry relative to a transfer root.
///
/// The empty route is the transfer root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route(Vec<String>);

impl Route {
    /// The transfer root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Route of a direct child of this route.
    pub fn join(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }

    /// Route of the parent, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Last segment, `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Whether `self` equals `other` or lies beneath it.
    pub fn starts_with(&self, other: &Route) -> bool {
        self.0.starts_with(&other.0)
    }

    /// Concatenation of two routes.
    pub fn concat(&self, other: &Route) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    /// Slash-joined form used on the wire and in reports.
    pub fn to_slash_path(&self) -> String {
        self.0.join("/")
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_slash_path())
    }
}

impl<S: Into<String>> FromIterator<S> for Route {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Route {
    fn from(segments: [S; N]) -> Self {
        segments.into_iter().collect()
    }
}

impl From<Vec<String>> for Route {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}
