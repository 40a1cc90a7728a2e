//! Tree snapshots and diffing
//!
//! Represents one side of a transfer as a tree of named files (identified by
//! content fingerprints) and directories, and computes the minimal set of
//! actions turning one tree into another.

pub mod builder;
pub mod diff;
pub mod entry;
pub mod hasher;
pub mod walker;

pub use diff::{diff, Diff};
pub use entry::Entry;
