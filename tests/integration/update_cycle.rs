use anyhow::Result;
use autopatch_cli::core::UpdateError;
use autopatch_cli::upgrade::{CycleOutcome, PayloadOrigin, SelfUpdater, Stage};
use chrono::Utc;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{
    NEW_BINARY, OLD_BINARY, config_for, gzip, install_fake_exe, make_patch, metadata_json,
};

const METADATA_PATH: &str = "/autopatch/linux-amd64.json";
const PATCH_PATH: &str = "/autopatch/2.5.0/3.0.0/linux-amd64";
const BINARY_PATH: &str = "/autopatch/3.0.0/linux-amd64.gz";

async fn serve_metadata(server: &MockServer, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(METADATA_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(times)
        .mount(server)
        .await;
}

async fn serve_bytes(server: &MockServer, at: &str, status: u16, body: Vec<u8>, times: u64) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body))
        .expect(times)
        .mount(server)
        .await;
}

/// Patch tier succeeds: the executable is rebuilt from the delta and the full
/// binary is never requested.
#[tokio::test]
async fn test_update_via_patch() -> Result<()> {
    let server = MockServer::start().await;
    let temp = TempDir::new()?;
    let exe = install_fake_exe(temp.path());

    serve_metadata(&server, metadata_json("3.0.0", NEW_BINARY), 1).await;
    serve_bytes(&server, PATCH_PATH, 200, make_patch(OLD_BINARY, NEW_BINARY), 1).await;
    serve_bytes(&server, BINARY_PATH, 200, gzip(NEW_BINARY), 0).await;

    let updater = SelfUpdater::new(config_for(&server.uri(), exe.clone(), "2.5.0"))?;
    let outcome = updater.check_and_apply().await?;

    assert_eq!(
        outcome,
        CycleOutcome::Updated {
            from: "2.5.0".to_string(),
            to: "3.0.0".to_string(),
            via: PayloadOrigin::Patch,
        }
    );
    assert_eq!(std::fs::read(&exe)?, NEW_BINARY);
    assert!(temp.path().join("state").join("cktime").exists());
    Ok(())
}

/// A missing patch falls back to exactly one full download.
#[tokio::test]
async fn test_missing_patch_falls_back_to_full_binary() -> Result<()> {
    let server = MockServer::start().await;
    let temp = TempDir::new()?;
    let exe = install_fake_exe(temp.path());

    serve_metadata(&server, metadata_json("3.0.0", NEW_BINARY), 1).await;
    serve_bytes(&server, PATCH_PATH, 404, Vec::new(), 1).await;
    serve_bytes(&server, BINARY_PATH, 200, gzip(NEW_BINARY), 1).await;

    let updater = SelfUpdater::new(config_for(&server.uri(), exe.clone(), "2.5.0"))?;
    let outcome = updater.check_and_apply().await?;

    assert!(matches!(
        outcome,
        CycleOutcome::Updated {
            via: PayloadOrigin::Full,
            ..
        }
    ));
    assert_eq!(std::fs::read(&exe)?, NEW_BINARY);
    Ok(())
}

/// A patch that applies cleanly but yields bytes other than the published
/// binary fails verification, so the full binary is used instead.
#[tokio::test]
async fn test_patched_digest_mismatch_falls_back_to_full_binary() -> Result<()> {
    let server = MockServer::start().await;
    let temp = TempDir::new()?;
    let exe = install_fake_exe(temp.path());

    let stale_patch = make_patch(OLD_BINARY, b"\x7fELF autopatch 3.0.0 -- corrupted in transit");
    serve_metadata(&server, metadata_json("3.0.0", NEW_BINARY), 1).await;
    serve_bytes(&server, PATCH_PATH, 200, stale_patch, 1).await;
    serve_bytes(&server, BINARY_PATH, 200, gzip(NEW_BINARY), 1).await;

    let updater = SelfUpdater::new(config_for(&server.uri(), exe.clone(), "2.5.0"))?;
    let outcome = updater.check_and_apply().await?;

    assert!(matches!(
        outcome,
        CycleOutcome::Updated {
            via: PayloadOrigin::Full,
            ..
        }
    ));
    assert_eq!(std::fs::read(&exe)?, NEW_BINARY);
    Ok(())
}

/// When neither tier produces the published digest the cycle fails with a
/// hash mismatch and the executable is untouched.
#[tokio::test]
async fn test_corrupt_payloads_leave_executable_untouched() -> Result<()> {
    let server = MockServer::start().await;
    let temp = TempDir::new()?;
    let exe = install_fake_exe(temp.path());
    let tampered = b"\x7fELF autopatch 3.0.0 -- tampered";

    serve_metadata(&server, metadata_json("3.0.0", NEW_BINARY), 1).await;
    serve_bytes(&server, PATCH_PATH, 200, make_patch(OLD_BINARY, tampered), 1).await;
    serve_bytes(&server, BINARY_PATH, 200, gzip(tampered), 1).await;

    let updater = SelfUpdater::new(config_for(&server.uri(), exe.clone(), "2.5.0"))?;
    let err = updater.check_and_apply().await.unwrap_err();

    assert!(matches!(err, UpdateError::HashMismatch { .. }));
    assert_eq!(std::fs::read(&exe)?, OLD_BINARY);
    Ok(())
}

/// Undecodable metadata aborts quietly before any payload request.
#[tokio::test]
async fn test_malformed_metadata_aborts() -> Result<()> {
    let server = MockServer::start().await;
    let temp = TempDir::new()?;
    let exe = install_fake_exe(temp.path());

    serve_metadata(&server, r#"{"Version": "3.0.0", "Sha256": "c2hvcnQ="}"#.to_string(), 1)
        .await;
    serve_bytes(&server, PATCH_PATH, 200, Vec::new(), 0).await;
    serve_bytes(&server, BINARY_PATH, 200, Vec::new(), 0).await;

    let updater = SelfUpdater::new(config_for(&server.uri(), exe.clone(), "2.5.0"))?;
    let outcome = updater.check_and_apply().await?;

    assert!(matches!(
        outcome,
        CycleOutcome::Aborted {
            stage: Stage::Checking,
            error: UpdateError::MalformedMetadata { .. },
        }
    ));
    assert_eq!(std::fs::read(&exe)?, OLD_BINARY);
    Ok(())
}

/// A server error on the metadata endpoint is reported with its status.
#[tokio::test]
async fn test_metadata_server_error_aborts() -> Result<()> {
    let server = MockServer::start().await;
    let temp = TempDir::new()?;
    let exe = install_fake_exe(temp.path());

    serve_bytes(&server, METADATA_PATH, 503, Vec::new(), 1).await;

    let updater = SelfUpdater::new(config_for(&server.uri(), exe, "2.5.0"))?;
    let outcome = updater.check_and_apply().await?;

    assert!(matches!(
        outcome,
        CycleOutcome::Aborted {
            stage: Stage::Checking,
            error: UpdateError::HttpStatus { status: 503, .. },
        }
    ));
    Ok(())
}

/// The gate allows one check per interval, even when the check failed.
#[tokio::test]
async fn test_gate_limits_requests() -> Result<()> {
    let server = MockServer::start().await;
    let temp = TempDir::new()?;
    let exe = install_fake_exe(temp.path());

    serve_metadata(&server, metadata_json("2.5.0", OLD_BINARY), 1).await;

    let updater = SelfUpdater::new(config_for(&server.uri(), exe, "2.5.0"))?;
    let now = Utc::now();

    let first = updater.check_and_apply_at(now).await?;
    assert_eq!(
        first,
        CycleOutcome::UpToDate {
            version: "2.5.0".to_string()
        }
    );

    let second = updater.check_and_apply_at(now + chrono::Duration::hours(1)).await?;
    assert_eq!(second, CycleOutcome::Skipped);
    Ok(())
}

/// A forced cycle runs even right after a recorded check.
#[tokio::test]
async fn test_force_upgrade_bypasses_gate() -> Result<()> {
    let server = MockServer::start().await;
    let temp = TempDir::new()?;
    let exe = install_fake_exe(temp.path());

    serve_metadata(&server, metadata_json("3.0.0", NEW_BINARY), 1).await;
    serve_bytes(&server, PATCH_PATH, 200, make_patch(OLD_BINARY, NEW_BINARY), 1).await;

    let updater = SelfUpdater::new(config_for(&server.uri(), exe.clone(), "2.5.0"))?;
    updater.gate().record_check(Utc::now()).await?;

    let outcome = updater.force_upgrade().await?;

    assert!(matches!(outcome, CycleOutcome::Updated { .. }));
    assert_eq!(std::fs::read(&exe)?, NEW_BINARY);
    Ok(())
}

/// Requests identify the client.
#[tokio::test]
async fn test_requests_carry_user_agent() -> Result<()> {
    let server = MockServer::start().await;
    let temp = TempDir::new()?;
    let exe = install_fake_exe(temp.path());

    Mock::given(method("GET"))
        .and(path(METADATA_PATH))
        .and(header("user-agent", concat!("autopatch/", env!("CARGO_PKG_VERSION"))))
        .respond_with(ResponseTemplate::new(200).set_body_string(metadata_json("2.5.0", OLD_BINARY)))
        .expect(1)
        .mount(&server)
        .await;

    let updater = SelfUpdater::new(config_for(&server.uri(), exe, "2.5.0"))?;
    let info = updater.fetch_latest().await?;

    assert_eq!(info.version, "2.5.0");
    Ok(())
}
