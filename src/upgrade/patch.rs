//! Delta patch retrieval and application.
//!
//! Patches are BSDIFF40 documents transforming the binary of one published
//! version into the next:
//!
//! ```text
//! GET {patch_base_url}/{cmd}/{from}/{to}/{platform}
//!
//! 200 OK
//! [bsdiff data]
//! ```

use std::path::Path;

use qbsdiff::Bspatch;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::core::UpdateError;
use crate::upgrade::config::UpdateConfig;
use crate::upgrade::http::HttpClient;

/// Read the running executable into memory.
///
/// The file is opened read-only and its handle is closed before this function
/// returns, so the installer can later rename or overwrite it.
pub async fn read_executable(path: &Path) -> Result<Vec<u8>, UpdateError> {
    let mut file = fs::File::open(path).await.map_err(|e| UpdateError::PatchApply {
        reason: format!("cannot open current executable {}: {e}", path.display()),
    })?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).await.map_err(|e| UpdateError::PatchApply {
        reason: format!("cannot read current executable {}: {e}", path.display()),
    })?;
    drop(file);

    Ok(bytes)
}

/// Fetch the patch from `from_version` to `to_version` and apply it to `old`.
///
/// `old` is never modified; the reconstructed binary is returned in memory.
///
/// # Errors
///
/// - [`UpdateError::PatchFetch`] when the patch cannot be downloaded
/// - [`UpdateError::PatchApply`] when the patch is corrupt or does not fit `old`
///
/// Both are recoverable: the caller falls back to a full download.
pub async fn apply_patch(
    client: &HttpClient,
    config: &UpdateConfig,
    old: &[u8],
    from_version: &str,
    to_version: &str,
) -> Result<Vec<u8>, UpdateError> {
    let url = config.patch_url(from_version, to_version);
    let patch = client.get_bytes(&url).await.map_err(|e| UpdateError::PatchFetch {
        url: url.clone(),
        reason: e.to_string(),
    })?;

    debug!("Applying {}-byte patch {} -> {}", patch.len(), from_version, to_version);
    apply_diff(old, &patch)
}

/// Apply a BSDIFF40 patch to `old`, returning the new bytes.
pub fn apply_diff(old: &[u8], patch: &[u8]) -> Result<Vec<u8>, UpdateError> {
    let patcher = Bspatch::new(patch).map_err(|e| UpdateError::PatchApply {
        reason: format!("invalid patch: {e}"),
    })?;

    let mut target = Vec::new();
    patcher.apply(old, &mut target).map_err(|e| UpdateError::PatchApply {
        reason: e.to_string(),
    })?;

    Ok(target)
}
