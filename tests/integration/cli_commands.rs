//! Integration tests running the ferry binary end to end.

use super::test_utils::{multipart_body, MockRemote};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

/// Run the binary in `project` with config and credential lookups confined to `home`.
fn run_ferry(project: &Path, home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ferry"))
        .current_dir(project)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env_remove("FERRY_SERVER")
        .env_remove("FERRY_IGNORE")
        .env_remove("FERRY_LOG")
        .args(args)
        .output()
        .unwrap()
}

fn mount_spot(remote: &MockRemote) {
    remote.mount(
        Mock::given(method("GET"))
            .and(path("/apps/blog/devs/me/spots/dev/"))
            .and(query_param("recursive", ""))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("a 1\nb/\nb/c 2\n", "application/x-directory"),
            ),
    );
    let (body, content_type) = multipart_body(&["x", "y"]);
    remote.mount(
        Mock::given(method("GET"))
            .and(path("/apps/blog/devs/me/spots/dev/"))
            .and(query_param("files", "a\nb/c"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, content_type.as_str())),
    );
}

#[test]
fn test_get_prints_report_grouped_by_mark() {
    let remote = MockRemote::start();
    mount_spot(&remote);
    let temp_dir = TempDir::new().unwrap();
    let server = remote.url().to_string();

    let output = run_ferry(
        temp_dir.path(),
        temp_dir.path(),
        &["--server", &server, "get", "blog:me@dev", "out"],
    );

    assert!(
        output.status.success(),
        "ferry get should succeed: stderr={:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["C out", "C out/b", "S out/a", "S out/b/c"]);
    assert_eq!(fs::read_to_string(temp_dir.path().join("out/b/c")).unwrap(), "y");
}

#[test]
fn test_quiet_get_prints_nothing() {
    let remote = MockRemote::start();
    mount_spot(&remote);
    let temp_dir = TempDir::new().unwrap();
    let server = remote.url().to_string();

    let output = run_ferry(
        temp_dir.path(),
        temp_dir.path(),
        &["--server", &server, "get", "--quiet", "blog:me@dev", "out"],
    );

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert!(output.stderr.is_empty());
    assert!(temp_dir.path().join("out").join("a").exists());
}

#[test]
fn test_json_report_uses_project_config_server() {
    let remote = MockRemote::start();
    mount_spot(&remote);
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join(".ferry.toml"),
        format!("server = \"{}\"\n", remote.url()),
    )
    .unwrap();

    let output = run_ferry(
        temp_dir.path(),
        temp_dir.path(),
        &["get", "--format", "json", "blog:me@dev", "out"],
    );

    assert!(
        output.status.success(),
        "stderr={:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["direction"], "get");
    assert_eq!(report["diff"]["save"].as_array().unwrap().len(), 2);
    assert_eq!(report["applied"].as_array().unwrap().len(), 4);
}

#[test]
fn test_login_required_exits_with_hint() {
    let remote = MockRemote::start();
    let temp_dir = TempDir::new().unwrap();
    let server = remote.url().to_string();

    let output = run_ferry(
        temp_dir.path(),
        temp_dir.path(),
        &["--server", &server, "get", "blog:dev", "out"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Login required"), "stderr={}", stderr);
    assert!(remote.received().is_empty());
}

#[test]
fn test_invalid_target_fails() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_ferry(temp_dir.path(), temp_dir.path(), &["get", ":dev/x"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid target"));
}

#[test]
fn test_logout_removes_stored_credentials() {
    let temp_dir = TempDir::new().unwrap();
    let credentials = temp_dir.path().join("config").join("ferry").join("credentials");
    fs::create_dir_all(&credentials).unwrap();
    fs::write(credentials.join("name"), "me").unwrap();

    let output = run_ferry(temp_dir.path(), temp_dir.path(), &["logout"]);

    assert!(output.status.success());
    assert!(!credentials.exists());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Removed stored credentials"));

    // A second logout has nothing to remove but still succeeds.
    let output = run_ferry(temp_dir.path(), temp_dir.path(), &["logout"]);
    assert!(output.status.success());
}

#[test]
fn test_eval_release_with_force() {
    let remote = MockRemote::start();
    remote.mount(
        Mock::given(method("POST"))
            .and(path("/apps/blog/eval/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK\n'hello'")),
    );
    let temp_dir = TempDir::new().unwrap();
    let server = remote.url().to_string();

    let output = run_ferry(
        temp_dir.path(),
        temp_dir.path(),
        &["--server", &server, "eval", "--force", "blog", "greeting"],
    );

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "'hello'");
}
