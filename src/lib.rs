//! Ferry: mirror file trees between a local directory and a remote code host
//!
//! Both sides are snapshotted as trees of named files (identified by content
//! fingerprints) and directories, the minimal diff between them is computed,
//! and only that diff is applied to the destination.

pub mod cli;
pub mod config;
pub mod deploy;
pub mod error;
pub mod ignore;
pub mod logging;
pub mod place;
pub mod session;
pub mod sync;
pub mod tree;
pub mod types;

pub use deploy::{Callbacks, TransferObserver};
pub use error::SyncError;
pub use ignore::IgnoreFilter;
pub use place::{LocalPlace, Place, RemotePlace};
pub use sync::{transfer, Direction, TransferOptions};
pub use tree::{diff, Diff, Entry};
pub use types::{Fingerprint, Route};
