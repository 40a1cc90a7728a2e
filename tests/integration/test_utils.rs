//! Shared test utilities for integration tests
//!
//! Builds file trees on disk and runs a mock HTTP server for the remote
//! backend. The mock server lives on its own tokio runtime; the blocking
//! client under test is driven from the test thread, outside any async context.

use ferry::place::remote::{HttpClient, HttpSettings, RemoteTarget, RemoteTree};
use ferry::session::Session;
use ferry::{RemotePlace, Route, TransferObserver};
use reqwest::Url;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tokio::runtime::Runtime;
use wiremock::{Mock, MockServer, Request};

/// Create files (and their parent directories) below `root`.
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    fs::create_dir_all(root).unwrap();
    for (path, content) in files {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }
}

/// Every entry below `root`: directories map to `None`, files to their content.
pub fn read_tree(root: &Path) -> BTreeMap<String, Option<String>> {
    let mut entries = BTreeMap::new();
    for entry in walkdir::WalkDir::new(root).min_depth(1) {
        let entry = entry.unwrap();
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap()
            .to_string_lossy()
            .replace('\\', "/");
        let content = if entry.file_type().is_dir() {
            None
        } else {
            Some(fs::read_to_string(entry.path()).unwrap())
        };
        entries.insert(relative, content);
    }
    entries
}

/// Observer recording notifications as `"<mark> <route>"` strings.
#[derive(Default)]
pub struct Recorder {
    events: RefCell<Vec<String>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }
}

impl TransferObserver for Recorder {
    fn on_save(&self, route: &Route) {
        self.events.borrow_mut().push(format!("S {}", route));
    }

    fn on_create(&self, route: &Route) {
        self.events.borrow_mut().push(format!("C {}", route));
    }

    fn on_delete(&self, route: &Route) {
        self.events.borrow_mut().push(format!("D {}", route));
    }
}

/// Mock server standing in for the remote code host.
pub struct MockRemote {
    server: MockServer,
    runtime: Runtime,
}

impl MockRemote {
    pub fn start() -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    pub fn url(&self) -> Url {
        Url::parse(&self.server.uri()).unwrap()
    }

    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub fn received(&self) -> Vec<Request> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }

    /// Received requests with the given method, as `(path?query, body)` pairs.
    pub fn received_with(&self, method: &str) -> Vec<(String, String)> {
        self.received()
            .into_iter()
            .filter(|request| request.method.as_str() == method)
            .map(|request| {
                let target = match request.url.query() {
                    Some(query) => format!("{}?{}", request.url.path(), query),
                    None => request.url.path().to_string(),
                };
                (target, String::from_utf8_lossy(&request.body).into_owned())
            })
            .collect()
    }

    pub fn client(&self, session: &Session) -> HttpClient {
        HttpClient::new(&HttpSettings::default(), session).unwrap()
    }

    /// Transfer root for `target` with an anonymous session.
    pub fn place(&self, target: &str) -> RemotePlace {
        self.place_with(target, &Session::anonymous())
    }

    pub fn place_with(&self, target: &str, session: &Session) -> RemotePlace {
        let target: RemoteTarget = target.parse().unwrap();
        let tree = RemoteTree::connect(self.client(session), &self.url(), &target, session).unwrap();
        tree.place(&target.path)
    }
}

/// Multipart body holding `parts` in order, with its content type.
pub fn multipart_body(parts: &[&str]) -> (String, String) {
    let boundary = "ferry-test-boundary";
    let mut body = String::new();
    for part in parts {
        body.push_str(&format!(
            "--{}\r\nContent-Type: application/octet-stream\r\n\r\n{}\r\n",
            boundary, part
        ));
    }
    body.push_str(&format!("--{}--\r\n", boundary));
    (body, format!("multipart/mixed; boundary={}", boundary))
}
