//! Remote version metadata.
//!
//! The update server publishes one JSON document per command and platform:
//!
//! ```text
//! GET {metadata_base_url}/{cmd}/{platform}.json
//!
//! 200 OK
//! {
//!     "Version": "3.0.0",
//!     "Sha256": "<base64 of the 32-byte digest of the full binary>"
//! }
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};
use tracing::debug;

use crate::core::UpdateError;
use crate::upgrade::config::UpdateConfig;
use crate::upgrade::http::HttpClient;
use crate::upgrade::verification::{ChecksumVerifier, DIGEST_LEN};

/// Latest published version and the SHA-256 digest of its binary.
///
/// Fetched fresh on every check cycle and never persisted. The digest is a
/// fixed-size array, so a constructed `VersionInfo` always holds a valid
/// 32-byte value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// Version string published by the server, e.g. `"3.0.0"`.
    pub version: String,
    /// Expected SHA-256 of the target binary.
    pub sha256: [u8; DIGEST_LEN],
}

impl VersionInfo {
    /// Decode a metadata document.
    ///
    /// Field names match case-insensitively (`Version`, `version`, `SHA256`
    /// all work), preferring an exact match when several keys fold together.
    /// The digest must be standard base64 encoding exactly 32 bytes.
    pub fn from_json(body: &[u8]) -> Result<Self, String> {
        let document: Map<String, Value> =
            serde_json::from_slice(body).map_err(|e| format!("invalid JSON: {e}"))?;

        let version = string_field(&document, "Version")?;
        let encoded = string_field(&document, "Sha256")?;

        let digest =
            STANDARD.decode(encoded.trim()).map_err(|e| format!("invalid base64 digest: {e}"))?;

        let sha256: [u8; DIGEST_LEN] = digest.as_slice().try_into().map_err(|_| {
            format!("digest must be {DIGEST_LEN} bytes, got {}", digest.len())
        })?;

        if version.trim().is_empty() {
            return Err("empty version".to_string());
        }

        Ok(Self {
            version: version.to_string(),
            sha256,
        })
    }

    /// Hex rendering of the expected digest.
    pub fn sha256_hex(&self) -> String {
        ChecksumVerifier::hex_digest(&self.sha256)
    }

    /// Whether this version is newer than `current` under semver ordering.
    ///
    /// Returns `None` when either side is not a valid semantic version; the
    /// updater itself only compares versions for equality.
    pub fn is_newer_than(&self, current: &str) -> Option<bool> {
        let latest = semver::Version::parse(self.version.trim_start_matches('v')).ok()?;
        let current = semver::Version::parse(current.trim_start_matches('v')).ok()?;
        Some(latest > current)
    }
}

fn string_field<'a>(document: &'a Map<String, Value>, name: &str) -> Result<&'a str, String> {
    let value = document
        .get(name)
        .or_else(|| {
            document.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, value)| value)
        })
        .ok_or_else(|| format!("missing field `{name}`"))?;

    value.as_str().ok_or_else(|| format!("field `{name}` must be a string"))
}

/// Fetch the latest version information for the configured command and platform.
///
/// Issues a single GET with no retry.
///
/// # Errors
///
/// - [`UpdateError::Network`] on transport failure
/// - [`UpdateError::HttpStatus`] when the status is not 200
/// - [`UpdateError::MalformedMetadata`] when the body does not decode or the
///   digest is not exactly 32 bytes
pub async fn fetch_info(
    client: &HttpClient,
    config: &UpdateConfig,
) -> Result<VersionInfo, UpdateError> {
    let url = config.metadata_url();
    let body = client.get_bytes(&url).await?;

    let info = VersionInfo::from_json(&body).map_err(|reason| UpdateError::MalformedMetadata {
        url: url.clone(),
        reason,
    })?;

    debug!("Remote version {} (sha256 {})", info.version, info.sha256_hex());
    Ok(info)
}
