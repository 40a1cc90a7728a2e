//! Integration tests for the configuration layers

use ferry::config::ConfigLoader;
use ferry::IgnoreFilter;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

#[test]
fn test_config_file_drives_ignore_and_http() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("ferry.toml");
    fs::write(
        &config_file,
        r#"
server = "https://code.example.org"
ignore = ["*.tmp", "node_modules"]
credentials_dir = "/tmp/ferry-credentials"

[http]
connect_timeout_secs = 3
request_timeout_secs = 30

[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();

    assert_eq!(config.server_url().unwrap().host_str(), Some("code.example.org"));
    let filter: IgnoreFilter = config.ignore_filter().unwrap();
    assert!(filter.is_ignored("node_modules"));
    assert!(filter.is_ignored("a.tmp"));
    assert!(!filter.is_ignored("a.bak"), "an ignore list replaces the defaults");
    assert_eq!(config.http.settings().connect_timeout.as_secs(), 3);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(
        config.credentials_dir().unwrap(),
        std::path::PathBuf::from("/tmp/ferry-credentials")
    );
}

#[test]
fn test_invalid_values_fail_to_load() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("ferry.toml");
    fs::write(&config_file, "server = \"ftp://example.org\"\nignore = [\"[\"]\n").unwrap();

    let err = ConfigLoader::load_from_file(&config_file).unwrap_err();
    let message = err.to_string();

    assert!(message.contains("Server"), "{}", message);
    assert!(message.contains("Ignore"), "{}", message);
}

#[test]
fn test_environment_overrides_project_file() {
    let temp_dir = TempDir::new().unwrap();
    let home = temp_dir.path().join("home");
    let project = temp_dir.path().join("project");
    fs::create_dir_all(&home).unwrap();
    fs::create_dir_all(project.join("site")).unwrap();
    fs::write(project.join("site").join("a.tmp"), "t").unwrap();
    fs::write(project.join(".ferry.toml"), "server = \"http://127.0.0.1:9\"\n").unwrap();

    // An unreachable server proves the project file was read; the environment
    // swaps in an unsupported scheme that must be rejected before any request.
    let output = Command::new(env!("CARGO_BIN_EXE_ferry"))
        .current_dir(&project)
        .env("HOME", &home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("FERRY_SERVER", "ftp://example.org")
        .args(["put", "--force", "blog", "site"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ftp"), "stderr={}", stderr);
}
