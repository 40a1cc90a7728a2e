//! Remote target addresses: `APP[:[OWNER@]SPOT][/REMOTE_PATH]`

use crate::error::SyncError;
use crate::session::Session;
use crate::types::Route;
use reqwest::Url;
use std::fmt;
use std::str::FromStr;

/// Parsed remote target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub app: String,
    pub owner: Option<String>,
    /// `None` addresses the release code.
    pub spot: Option<String>,
    pub path: Route,
}

impl RemoteTarget {
    /// Whether the target addresses release code rather than a spot.
    pub fn is_release(&self) -> bool {
        self.spot.is_none()
    }

    /// URL of the code root (without the remote path).
    ///
    /// A spot without an explicit owner belongs to the logged-in user, so the
    /// session must know its own name.
    pub fn code_url(&self, server: &Url, session: &Session) -> Result<Url, SyncError> {
        let mut segments = vec!["apps".to_string(), self.app.clone()];
        match &self.spot {
            None => segments.push("code".to_string()),
            Some(spot) => {
                let owner = match &self.owner {
                    Some(owner) => owner.as_str(),
                    None => session.own_name().ok_or(SyncError::LoginRequired)?,
                };
                segments.push("devs".to_string());
                segments.push(owner_slug(owner));
                segments.push("spots".to_string());
                segments.push(spot.clone());
            }
        }
        extend_url(server, &segments[..])
    }
}

impl FromStr for RemoteTarget {
    type Err = SyncError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (app_part, path) = match value.split_once('/') {
            Some((app_part, path)) => (app_part, path),
            None => (value, ""),
        };
        let (app, owner, spot) = match app_part.split_once(':') {
            None => (app_part, None, None),
            Some((app, owner_spot)) => match owner_spot.split_once('@') {
                Some((owner, spot)) => (app, Some(owner), Some(spot)),
                None => (app, None, Some(owner_spot)),
            },
        };

        if app.is_empty() {
            return Err(SyncError::InvalidTarget(format!(
                "\"{}\" does not name an app",
                value
            )));
        }
        if matches!(owner, Some("")) {
            return Err(SyncError::InvalidTarget(format!(
                "\"{}\" has an empty owner name",
                value
            )));
        }
        let spot = spot.filter(|spot| !spot.is_empty());
        if owner.is_some() && spot.is_none() {
            return Err(SyncError::InvalidTarget(format!(
                "\"{}\" names an owner without a spot",
                value
            )));
        }

        Ok(Self {
            app: app.to_string(),
            owner: owner.map(str::to_string),
            spot: spot.map(str::to_string),
            path: path.split('/').filter(|segment| !segment.is_empty()).collect(),
        })
    }
}

impl fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.app)?;
        if let Some(spot) = &self.spot {
            f.write_str(":")?;
            if let Some(owner) = &self.owner {
                write!(f, "{}@", owner)?;
            }
            f.write_str(spot)?;
        }
        if !self.path.is_root() {
            write!(f, "/{}", self.path)?;
        }
        Ok(())
    }
}

/// Owner names appear lowercased with spaces replaced by dashes.
fn owner_slug(owner: &str) -> String {
    owner.to_lowercase().replace(' ', "-")
}

/// Append percent-encoded path segments to `base`.
pub fn extend_url<S: AsRef<str>>(base: &Url, segments: &[S]) -> Result<Url, SyncError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| SyncError::InvalidTarget(format!("{} cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(segments.iter().map(|segment| segment.as_ref()));
    Ok(url)
}
