use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::metadata_json;

fn autopatch(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("autopatch").unwrap();
    cmd.env("AUTOPATCH_CONFIG_PATH", config)
        .env("AUTOPATCH_NO_PROGRESS", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &TempDir, base_url: &str, auto_update: bool) -> std::path::PathBuf {
    let config = dir.path().join("config.toml");
    let state_dir = dir.path().join("state");
    std::fs::write(
        &config,
        format!(
            "[upgrade]\nauto_update = {auto_update}\nmetadata_url = \"{base_url}/\"\nbinary_url = \"{base_url}/\"\npatch_url = \"{base_url}/\"\nstate_dir = '{}'\nhttp_timeout = 5\n",
            state_dir.display()
        ),
    )
    .unwrap();
    config
}

#[test]
fn test_help_lists_commands() {
    let temp = TempDir::new().unwrap();
    autopatch(&temp.path().join("config.toml"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_path_honors_env() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("custom.toml");

    autopatch(&config)
        .args(["--no-update-check", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"))
        .stdout(predicate::str::contains("does not exist"));
}

#[test]
fn test_config_init_then_show() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("nested").join("config.toml");

    autopatch(&config)
        .args(["--no-update-check", "config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default configuration"));
    assert!(config.exists());

    autopatch(&config)
        .args(["--no-update-check", "config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    autopatch(&config)
        .args(["--no-update-check", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[upgrade]"))
        .stdout(predicate::str::contains("auto_update = true"));
}

#[test]
fn test_invalid_config_fails() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.toml");
    std::fs::write(&config, "[upgrade\n").unwrap();

    autopatch(&config)
        .arg("version")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse global config"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_version_skips_check_when_auto_update_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let config = write_config(&temp, &server.uri(), false);

    autopatch(&config).arg("version").assert().success().stdout(predicate::str::contains("autopatch"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_version_runs_opportunistic_check_quietly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/autopatch/[a-z0-9]+-[a-z0-9]+\.json$"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let config = write_config(&temp, &server.uri(), true);

    autopatch(&config).arg("version").assert().success().stdout(predicate::str::contains("autopatch"));

    // Gate is closed now; a second run makes no request
    autopatch(&config).arg("version").assert().success();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_reports_available_update() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/autopatch/[a-z0-9]+-[a-z0-9]+\.json$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(metadata_json("99.0.0", b"future binary")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let config = write_config(&temp, &server.uri(), true);

    autopatch(&config)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Update available"))
        .stdout(predicate::str::contains("99.0.0"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_json_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(metadata_json("99.0.0", b"future binary")),
        )
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let config = write_config(&temp, &server.uri(), false);

    autopatch(&config)
        .args(["check", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""latest": "99.0.0""#))
        .stdout(predicate::str::contains(r#""update_available": true"#));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_reports_unreachable_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let config = write_config(&temp, &server.uri(), false);

    autopatch(&config)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to check for updates"))
        .stderr(predicate::str::contains("404"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unwritable_state_dir_is_silent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("state-is-a-file");
    std::fs::write(&blocker, "not a directory").unwrap();
    let config = temp.path().join("config.toml");
    std::fs::write(
        &config,
        format!(
            "[upgrade]\nauto_update = true\nmetadata_url = \"{0}/\"\nbinary_url = \"{0}/\"\npatch_url = \"{0}/\"\nstate_dir = '{1}'\n",
            server.uri(),
            blocker.display()
        ),
    )
    .unwrap();

    for _ in 0..2 {
        autopatch(&config)
            .arg("version")
            .assert()
            .success()
            .stderr(predicate::str::contains("checkpoint").not());
    }
}
