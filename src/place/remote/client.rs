//! Blocking HTTP client for the remote tree
//!
//! Redirects are never followed by reqwest itself: reads follow exactly one
//! `Location` hop by hand, listings inspect the first answer themselves, and
//! mutations treat `302`/`303` as success.

use crate::error::SyncError;
use crate::session::Session;
use crate::types::Fingerprint;
use reqwest::blocking::multipart::Form;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, COOKIE, ETAG, IF_NONE_MATCH, LOCATION};
use reqwest::redirect::Policy;
use reqwest::{Method, StatusCode, Url};
use std::time::Duration;
use tracing::{debug, trace};

/// Content type the server uses for directory listings.
pub const DIRECTORY_CONTENT_TYPE: &str = "application/x-directory";

const USER_AGENT: &str = concat!("ferry/", env!("CARGO_PKG_VERSION"));

/// Timeouts applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// A fully read response.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE)?.to_str().ok()
    }

    /// Whether the body is a directory listing rather than file content.
    pub fn is_listing(&self) -> bool {
        self.content_type()
            .and_then(|value| value.split(';').next())
            .map(|mime| mime.trim().eq_ignore_ascii_case(DIRECTORY_CONTENT_TYPE))
            .unwrap_or(false)
    }

    /// Fingerprint reported in the `ETag` header, without quotes or weak marker.
    pub fn etag(&self) -> Option<Fingerprint> {
        let raw = self.headers.get(ETAG)?.to_str().ok()?.trim();
        let raw = raw.strip_prefix("W/").unwrap_or(raw);
        let value = raw.trim_matches('"');
        (!value.is_empty()).then(|| Fingerprint::new(value))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_not_modified(&self) -> bool {
        self.status == StatusCode::NOT_MODIFIED
    }
}

/// HTTP client bound to one credential store.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    cookie: Option<HeaderValue>,
}

impl HttpClient {
    pub fn new(settings: &HttpSettings, session: &Session) -> Result<Self, SyncError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/plain"));

        let client = Client::builder()
            .redirect(Policy::none())
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| SyncError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        let cookie = session
            .cookie_header()
            .map(|value| {
                HeaderValue::from_str(&value)
                    .map_err(|_| SyncError::Config("stored cookie is not a valid header".to_string()))
            })
            .transpose()?;

        Ok(Self { client, cookie })
    }

    /// `GET`, following at most one redirect.
    pub fn get(&self, url: Url, if_none_match: Option<&Fingerprint>) -> Result<Reply, SyncError> {
        self.read(Method::GET, url, if_none_match)
    }

    /// `HEAD`, following at most one redirect.
    pub fn head(&self, url: Url, if_none_match: Option<&Fingerprint>) -> Result<Reply, SyncError> {
        self.read(Method::HEAD, url, if_none_match)
    }

    /// `POST` a multipart form. Redirect answers are returned as they are.
    pub fn post_multipart(&self, url: Url, form: Form) -> Result<Reply, SyncError> {
        debug!(url = %url, "POST multipart");
        self.send(self.request(Method::POST, url).multipart(form))
    }

    /// `POST` an urlencoded form. Redirect answers are returned as they are.
    pub fn post_form(&self, url: Url, fields: &[(&str, &str)]) -> Result<Reply, SyncError> {
        debug!(url = %url, "POST form");
        self.send(self.request(Method::POST, url).form(fields))
    }

    /// `GET` without following a redirect; the caller decides what it means.
    pub fn get_once(&self, url: Url) -> Result<Reply, SyncError> {
        debug!(url = %url, "Sending request");
        self.send(self.request(Method::GET, url))
    }

    /// Re-issue `method` at `target`, the redirect answer to a request for `from`.
    /// A second redirect is a protocol error.
    pub fn follow(
        &self,
        method: Method,
        from: &Url,
        target: Url,
        if_none_match: Option<&Fingerprint>,
    ) -> Result<Reply, SyncError> {
        debug!(from = %from, to = %target, "Following redirect");
        let reply = self.send(self.conditional(method, target, if_none_match))?;
        if is_redirect(reply.status) {
            return Err(SyncError::Protocol(format!(
                "{} redirected more than once",
                from
            )));
        }
        Ok(reply)
    }

    fn read(
        &self,
        method: Method,
        url: Url,
        if_none_match: Option<&Fingerprint>,
    ) -> Result<Reply, SyncError> {
        debug!(method = %method, url = %url, "Sending request");
        let reply = self.send(self.conditional(method.clone(), url.clone(), if_none_match))?;
        if !is_redirect(reply.status) {
            return Ok(reply);
        }
        let target = redirect_target(&url, &reply)?;
        self.follow(method, &url, target, if_none_match)
    }

    fn conditional(
        &self,
        method: Method,
        url: Url,
        if_none_match: Option<&Fingerprint>,
    ) -> RequestBuilder {
        let request = self.request(method, url);
        match if_none_match {
            Some(fingerprint) => request.header(IF_NONE_MATCH, format!("\"{}\"", fingerprint)),
            None => request,
        }
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.cookie {
            Some(cookie) => request.header(COOKIE, cookie.clone()),
            None => request,
        }
    }

    fn send(&self, request: RequestBuilder) -> Result<Reply, SyncError> {
        let response = request.send().map_err(map_http_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().map_err(map_http_error)?.to_vec();
        trace!(status = status.as_u16(), bytes = body.len(), "Received response");
        Ok(Reply {
            status,
            headers,
            body,
        })
    }
}

pub fn is_redirect(status: StatusCode) -> bool {
    status.is_redirection() && status != StatusCode::NOT_MODIFIED
}

pub fn redirect_target(base: &Url, reply: &Reply) -> Result<Url, SyncError> {
    let location = reply
        .headers
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            SyncError::Protocol(format!(
                "redirect from {} without a Location header",
                base
            ))
        })?;
    base.join(location)
        .map_err(|e| SyncError::Protocol(format!("invalid redirect location {:?}: {}", location, e)))
}

/// Translate a non-success reply into an error. `404` names `location`.
pub fn status_error(reply: &Reply, location: &str) -> SyncError {
    match reply.status.as_u16() {
        401 | 403 => SyncError::LoginRequired,
        404 => SyncError::DoesNotExist(location.to_string()),
        status => SyncError::Request {
            status,
            message: reply.text().trim().to_string(),
        },
    }
}

/// Map a transport-level reqwest failure.
pub fn map_http_error(error: reqwest::Error) -> SyncError {
    if error.is_timeout() {
        SyncError::Transport(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        SyncError::Transport(format!("Connection error: {}", error))
    } else {
        SyncError::Transport(format!("HTTP error: {}", error))
    }
}
