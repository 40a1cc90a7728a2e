//! Remote tree backend
//!
//! A remote place addresses one entry under the code root of an app's release
//! code or of a developer spot. Reads use plain and conditional `GET`/`HEAD`
//! requests; every mutation is a `deploy` form posted to the code root.

pub mod client;
pub mod eval;
pub mod listing;
pub mod multipart;
pub mod target;

use crate::error::SyncError;
use crate::ignore::IgnoreFilter;
use crate::place::{Fetched, Place, Probe};
use crate::session::Session;
use crate::tree::entry::Entry;
use crate::tree::hasher;
use crate::types::{Fingerprint, Route};
use client::{status_error, Reply};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::{Method, StatusCode, Url};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use target::extend_url;
use tracing::{debug, instrument, trace};

pub use client::{HttpClient, HttpSettings};
pub use eval::{evaluate, Evaluation};
pub use target::RemoteTarget;

#[derive(Debug, Clone)]
struct CachedFile {
    content: Option<Rc<Vec<u8>>>,
    fingerprint: Fingerprint,
}

#[derive(Debug)]
struct RemoteRoot {
    client: HttpClient,
    code_url: Url,
    base: Route,
    files: RefCell<HashMap<Route, CachedFile>>,
}

/// Code root of one app or spot on a server.
#[derive(Debug, Clone)]
pub struct RemoteTree {
    client: HttpClient,
    code_url: Url,
}

impl RemoteTree {
    /// Resolve `target` against `server`. Fails with
    /// [`SyncError::LoginRequired`] when a spot of the logged-in user is
    /// addressed but the session does not know its name.
    pub fn connect(
        client: HttpClient,
        server: &Url,
        target: &RemoteTarget,
        session: &Session,
    ) -> Result<Self, SyncError> {
        let code_url = target.code_url(server, session)?;
        debug!(code_url = %code_url, "Resolved remote code root");
        Ok(Self { client, code_url })
    }

    /// Transfer root at `path` below the code root.
    pub fn place(&self, path: &Route) -> RemotePlace {
        RemotePlace {
            root: Rc::new(RemoteRoot {
                client: self.client.clone(),
                code_url: self.code_url.clone(),
                base: path.clone(),
                files: RefCell::new(HashMap::new()),
            }),
            route: Route::root(),
        }
    }
}

enum Mutation<'a> {
    Save(&'a [u8]),
    Create,
    Delete,
}

/// Place in the remote tree
#[derive(Debug, Clone)]
pub struct RemotePlace {
    root: Rc<RemoteRoot>,
    route: Route,
}

impl RemotePlace {
    /// Route from the code root, as used on the wire.
    pub fn full_route(&self) -> Route {
        self.root.base.concat(&self.route)
    }

    fn at(&self, route: Route) -> RemotePlace {
        RemotePlace {
            root: Rc::clone(&self.root),
            route,
        }
    }

    fn url(&self) -> Result<Url, SyncError> {
        extend_url(&self.root.code_url, self.full_route().segments())
    }

    /// Directory form of the URL (trailing slash), for listing and batch reads.
    fn dir_url(&self) -> Result<Url, SyncError> {
        let mut segments = self.full_route().segments().to_vec();
        segments.push(String::new());
        extend_url(&self.root.code_url, &segments[..])
    }

    fn cached(&self) -> Option<CachedFile> {
        self.root.files.borrow().get(&self.route).cloned()
    }

    fn remember(&self, content: Option<Vec<u8>>, fingerprint: Fingerprint) {
        self.root.files.borrow_mut().insert(
            self.route.clone(),
            CachedFile {
                content: content.map(Rc::new),
                fingerprint,
            },
        );
    }

    fn forget(&self) {
        self.root
            .files
            .borrow_mut()
            .retain(|route, _| !route.starts_with(&self.route));
    }

    /// Record file content from a reply and return its fingerprint.
    fn remember_reply(&self, reply: Reply) -> Fingerprint {
        let fingerprint = reply
            .etag()
            .unwrap_or_else(|| hasher::compute_fingerprint(&reply.body));
        self.remember(Some(reply.body), fingerprint.clone());
        fingerprint
    }

    /// A listing request for a file is moved permanently to the file itself.
    /// A temporary redirect, or one leaving the code root, is the login page.
    fn follow_listing_redirect(&self, url: &Url, reply: Reply) -> Result<Reply, SyncError> {
        if !client::is_redirect(reply.status) {
            return Ok(reply);
        }
        if reply.status == StatusCode::FOUND || reply.status == StatusCode::SEE_OTHER {
            debug!(status = reply.status.as_u16(), "Listing redirected to login");
            return Err(SyncError::LoginRequired);
        }
        let target = client::redirect_target(url, &reply)?;
        if !self.within_code_root(&target) {
            debug!(to = %target, "Listing redirected outside the code root");
            return Err(SyncError::LoginRequired);
        }
        self.root.client.follow(Method::GET, url, target, None)
    }

    fn within_code_root(&self, url: &Url) -> bool {
        let code_url = &self.root.code_url;
        let root = code_url.path().trim_end_matches('/');
        let path = url.path();
        url.origin() == code_url.origin()
            && (path == root || path.starts_with(&format!("{}/", root)))
    }

    fn mutate(&self, mutation: Mutation<'_>) -> Result<(), SyncError> {
        let path = self.full_route();
        if path.is_root() {
            return Err(SyncError::InvalidTarget(
                "the code root itself cannot be replaced".to_string(),
            ));
        }
        let slash_path = path.to_slash_path();
        // Paths go out verbatim; the default encoding would turn `/` into `%2F`.
        let form = Form::new().percent_encode_noop().text("op", "deploy");
        let (form, op) = match mutation {
            Mutation::Save(content) => (
                form.part(
                    "save",
                    Part::bytes(content.to_vec()).file_name(slash_path.clone()),
                ),
                "save",
            ),
            Mutation::Create => (form.text("create", slash_path.clone()), "create"),
            Mutation::Delete => (form.text("delete", slash_path.clone()), "delete"),
        };

        let url = extend_url(&self.root.code_url, &[""])?;
        let reply = self.root.client.post_multipart(url, form)?;
        let accepted = reply.status.is_success()
            || reply.status == StatusCode::FOUND
            || reply.status == StatusCode::SEE_OTHER;
        if !accepted {
            return Err(status_error(&reply, &self.describe()));
        }
        self.forget();
        debug!(path = %slash_path, op, "Deployed remote change");
        Ok(())
    }

    fn listing_text(reply: &Reply) -> Result<&str, SyncError> {
        std::str::from_utf8(&reply.body)
            .map_err(|_| SyncError::Protocol("directory listing is not valid UTF-8".to_string()))
    }
}

impl Place for RemotePlace {
    fn route(&self) -> &Route {
        &self.route
    }

    fn describe(&self) -> String {
        format!("Remote entry \"/{}\"", self.full_route())
    }

    fn fingerprint(&self) -> Result<Option<Fingerprint>, SyncError> {
        if let Some(cached) = self.cached() {
            return Ok(Some(cached.fingerprint));
        }
        let reply = self.root.client.head(self.url()?, None)?;
        if reply.status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !reply.status.is_success() {
            return Err(status_error(&reply, &self.describe()));
        }
        if reply.is_listing() {
            return Ok(None);
        }
        match reply.etag() {
            Some(fingerprint) => {
                self.remember(None, fingerprint.clone());
                Ok(Some(fingerprint))
            }
            None => match self.fetch(None)? {
                Fetched::File { fingerprint, .. } => Ok(Some(fingerprint)),
                _ => Ok(None),
            },
        }
    }

    fn fetch(&self, if_different_than: Option<&Fingerprint>) -> Result<Fetched, SyncError> {
        if let Some(CachedFile {
            content: Some(content),
            fingerprint,
        }) = self.cached()
        {
            trace!(route = %self.route, "Content cache hit");
            if if_different_than == Some(&fingerprint) {
                return Ok(Fetched::Unchanged);
            }
            return Ok(Fetched::File {
                content: content.as_ref().clone(),
                fingerprint,
            });
        }

        let reply = self.root.client.get(self.url()?, if_different_than)?;
        if reply.is_not_modified() {
            return Ok(Fetched::Unchanged);
        }
        if !reply.status.is_success() {
            return Err(status_error(&reply, &self.describe()));
        }
        if reply.is_listing() {
            let listing = listing::parse_listing(Self::listing_text(&reply)?, &IgnoreFilter::none())?;
            let names = listing
                .children()
                .map(|children| children.keys().cloned().collect())
                .unwrap_or_default();
            return Ok(Fetched::Dir { names });
        }
        let content = reply.body.clone();
        let fingerprint = self.remember_reply(reply);
        Ok(Fetched::File {
            content,
            fingerprint,
        })
    }

    fn probe(&self, if_different_than: Option<&Fingerprint>) -> Result<Probe, SyncError> {
        let reply = self.root.client.head(self.url()?, if_different_than)?;
        if reply.is_not_modified() {
            return Ok(Probe::Unchanged);
        }
        if reply.status == StatusCode::NOT_FOUND {
            return Ok(Probe::Missing);
        }
        if !reply.status.is_success() {
            return Err(status_error(&reply, &self.describe()));
        }
        if reply.is_listing() {
            return Ok(Probe::Dir);
        }
        match (if_different_than, reply.etag()) {
            (Some(expected), Some(actual)) if *expected == actual => Ok(Probe::Unchanged),
            _ => Ok(Probe::File),
        }
    }

    fn write(&self, content: &[u8]) -> Result<(), SyncError> {
        self.mutate(Mutation::Save(content))
    }

    fn remove(&self) -> Result<(), SyncError> {
        self.mutate(Mutation::Delete)
    }

    fn create_dir(&self) -> Result<(), SyncError> {
        self.mutate(Mutation::Create)
    }

    fn child(&self, name: &str) -> Box<dyn Place> {
        Box::new(self.at(self.route.join(name)))
    }

    #[instrument(skip(self, ignore), fields(path = %self.full_route()))]
    fn traverse(&self, ignore: &IgnoreFilter) -> Result<Option<Entry>, SyncError> {
        let mut url = self.dir_url()?;
        url.set_query(Some("etag&recursive"));
        let reply = self.root.client.get_once(url.clone())?;
        let reply = self.follow_listing_redirect(&url, reply)?;
        if reply.status == StatusCode::NOT_FOUND {
            debug!("Remote root does not exist");
            return Ok(None);
        }
        if !reply.status.is_success() {
            return Err(status_error(&reply, &self.describe()));
        }
        if reply.is_listing() {
            return listing::parse_listing(Self::listing_text(&reply)?, ignore).map(Some);
        }
        let fingerprint = self.remember_reply(reply);
        Ok(Some(Entry::file(fingerprint)))
    }

    fn read_files(&self, routes: &[Route]) -> Result<Vec<Vec<u8>>, SyncError> {
        match routes {
            [] => return Ok(Vec::new()),
            [route] if route.is_root() => {
                return match self.fetch(None)? {
                    Fetched::File { content, .. } => Ok(vec![content]),
                    _ => Err(SyncError::Protocol(format!(
                        "expected a file at {}",
                        self.describe()
                    ))),
                };
            }
            _ => {}
        }

        let joined = routes
            .iter()
            .map(Route::to_slash_path)
            .collect::<Vec<_>>()
            .join("\n");
        let mut url = self.dir_url()?;
        url.query_pairs_mut().append_pair("files", &joined);

        debug!(count = routes.len(), "Reading remote files in one batch");
        let reply = self.root.client.get(url, None)?;
        if !reply.status.is_success() {
            return Err(status_error(&reply, &self.describe()));
        }
        let boundary = reply
            .content_type()
            .and_then(multipart::boundary)
            .ok_or_else(|| {
                SyncError::Protocol("batched content response is not multipart".to_string())
            })?;
        let parts = multipart::parse_parts(&reply.body, &boundary)?;
        if parts.len() != routes.len() {
            return Err(SyncError::Protocol(format!(
                "requested {} files but received {}",
                routes.len(),
                parts.len()
            )));
        }
        Ok(parts)
    }
}
