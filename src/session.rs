//! Stored credentials
//!
//! The credential directory holds two optional files: `name`, the user's own
//! name, and `cookie`, a Netscape/Mozilla cookie jar with the authentication
//! cookie. Logging in is out of scope; this module only reads and removes them.

use crate::error::SyncError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const NAME_FILE: &str = "name";
const COOKIE_FILE: &str = "cookie";
const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// One cookie from the jar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// Credentials loaded from the credential directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    own_name: Option<String>,
    cookies: Vec<Cookie>,
}

impl Session {
    /// Session without credentials.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(own_name: Option<String>, cookies: Vec<Cookie>) -> Self {
        Self { own_name, cookies }
    }

    /// Read the credential directory. Missing files are not an error.
    pub fn load(dir: &Path) -> Result<Self, SyncError> {
        let own_name = read_optional(&dir.join(NAME_FILE))?
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        let cookies = read_optional(&dir.join(COOKIE_FILE))?
            .map(|jar| parse_cookie_jar(&jar))
            .unwrap_or_default();
        debug!(
            dir = %dir.display(),
            has_name = own_name.is_some(),
            cookies = cookies.len(),
            "Loaded session"
        );
        Ok(Self { own_name, cookies })
    }

    /// Remove the stored credentials.
    pub fn clear(dir: &Path) -> Result<(), SyncError> {
        match fs::remove_dir_all(dir) {
            Ok(()) => {
                debug!(dir = %dir.display(), "Removed credentials");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::io(dir, e)),
        }
    }

    pub fn own_name(&self) -> Option<&str> {
        self.own_name.as_deref()
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Value for the `Cookie` request header, if any cookies are stored.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|cookie| format!("{}={}", cookie.name, cookie.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Default credential directory under the user's config home.
pub fn default_credentials_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "ferry").map(|dirs| dirs.config_dir().join("credentials"))
}

fn read_optional(path: &Path) -> Result<Option<String>, SyncError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SyncError::io(path, e)),
    }
}

/// Parse the tab-separated cookie jar format.
///
/// Fields: domain, subdomains flag, path, secure flag, expiry, name, value.
fn parse_cookie_jar(jar: &str) -> Vec<Cookie> {
    jar.lines()
        .filter_map(|line| {
            let line = line.strip_prefix(HTTP_ONLY_PREFIX).unwrap_or(line);
            if line.trim().is_empty() || line.starts_with('#') {
                return None;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 7 {
                warn!(line, "Skipping malformed cookie jar line");
                return None;
            }
            Some(Cookie {
                name: fields[5].to_string(),
                value: fields[6].trim_end().to_string(),
            })
        })
        .collect()
}
