//! Helpers shared by the integration tests.

use std::io::Write;
use std::path::{Path, PathBuf};

use autopatch_cli::upgrade::{ChecksumVerifier, UpdateConfig, UpgradeSettings};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::write::GzEncoder;
use qbsdiff::Bsdiff;

pub const PLATFORM: &str = "linux-amd64";

pub const OLD_BINARY: &[u8] = b"\x7fELF autopatch 2.5.0 -- original build, plenty of shared bytes";
pub const NEW_BINARY: &[u8] =
    b"\x7fELF autopatch 3.0.0 -- original build, plenty of shared bytes and a new feature";

/// Metadata document advertising `version` with the digest of `binary`.
pub fn metadata_json(version: &str, binary: &[u8]) -> String {
    let digest = STANDARD.encode(ChecksumVerifier::sha256(binary));
    format!(r#"{{"Version": "{version}", "Sha256": "{digest}"}}"#)
}

pub fn make_patch(old: &[u8], new: &[u8]) -> Vec<u8> {
    let mut patch = Vec::new();
    Bsdiff::new(old, new).compare(&mut patch).unwrap();
    patch
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Write `OLD_BINARY` as a fake installed executable.
pub fn install_fake_exe(dir: &Path) -> PathBuf {
    let exe = dir.join("autopatch");
    std::fs::write(&exe, OLD_BINARY).unwrap();
    exe
}

/// Updater configuration pointing every endpoint at `base_url`.
pub fn config_for(base_url: &str, exe: PathBuf, version: &str) -> UpdateConfig {
    let settings = UpgradeSettings {
        metadata_url: format!("{base_url}/"),
        binary_url: base_url.to_string(),
        patch_url: format!("{base_url}/"),
        http_timeout: 10,
        ..UpgradeSettings::default()
    };
    let state_dir = exe.parent().unwrap().join("state");
    let mut config = UpdateConfig::for_executable(&settings, version, exe)
        .unwrap()
        .with_state_dir(state_dir);
    config.platform_tag = PLATFORM.to_string();
    config
}
