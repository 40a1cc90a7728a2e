//! Remote directory listings
//!
//! One line per entry: `name/` for a directory, `name fingerprint` for a
//! file. Recursive listings carry full relative paths; the parent of a line is
//! the nearest still-open directory whose path prefixes it.

use crate::error::SyncError;
use crate::ignore::IgnoreFilter;
use crate::tree::builder::TreeBuilder;
use crate::tree::entry::Entry;
use crate::types::{Fingerprint, Route};

struct OpenDir {
    prefix: String,
    route: Route,
    ignored: bool,
}

/// Parse a (possibly recursive) listing into a directory snapshot.
pub fn parse_listing(body: &str, ignore: &IgnoreFilter) -> Result<Entry, SyncError> {
    let mut builder = TreeBuilder::new();
    let mut open = vec![OpenDir {
        prefix: String::new(),
        route: Route::root(),
        ignored: false,
    }];

    for line in body.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        // The root prefix matches every line, so the stack never empties.
        while open.len() > 1 && !line.starts_with(open[open.len() - 1].prefix.as_str()) {
            open.pop();
        }
        let parent = &open[open.len() - 1];
        let rest = &line[parent.prefix.len()..];

        if let Some(name) = rest.strip_suffix('/') {
            check_name(name, line)?;
            let route = parent.route.join(name);
            let ignored = parent.ignored || ignore.is_ignored(name);
            if !ignored {
                builder.add_dir(&route)?;
            }
            open.push(OpenDir {
                prefix: line.to_string(),
                route,
                ignored,
            });
        } else {
            let (name, fingerprint) = rest.rsplit_once(' ').ok_or_else(|| {
                SyncError::Protocol(format!("listing line \"{}\" has no fingerprint", line))
            })?;
            check_name(name, line)?;
            if !(parent.ignored || ignore.is_ignored(name)) {
                builder.add_file(&parent.route.join(name), Fingerprint::new(fingerprint))?;
            }
        }
    }

    Ok(builder.build())
}

fn check_name(name: &str, line: &str) -> Result<(), SyncError> {
    if name.is_empty() || name.contains('/') {
        return Err(SyncError::Protocol(format!(
            "listing line \"{}\" does not name a direct child",
            line
        )));
    }
    Ok(())
}
