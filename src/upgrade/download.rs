//! Download and decompress full replacement binaries.

use std::io::Read;

use flate2::read::MultiGzDecoder;
use tracing::debug;

use crate::core::UpdateError;
use crate::upgrade::config::UpdateConfig;
use crate::upgrade::http::HttpClient;

/// Download `{binary_base_url}/{cmd}/{version}/{platform}.gz` and gunzip it in memory.
///
/// This is the last-resort retrieval path; there is no further fallback.
///
/// # Errors
///
/// - [`UpdateError::Network`] or [`UpdateError::HttpStatus`] when the download fails
/// - [`UpdateError::Decompression`] when the body is not a valid gzip stream
pub async fn fetch_full_binary(
    client: &HttpClient,
    config: &UpdateConfig,
    version: &str,
) -> Result<Vec<u8>, UpdateError> {
    let url = config.binary_url(version);
    let compressed = client.get_bytes(&url).await?;
    let binary = gunzip(&compressed)?;
    debug!("Decompressed {} -> {} bytes", compressed.len(), binary.len());
    Ok(binary)
}

/// Decompress a complete gzip stream (all members) into memory.
pub fn gunzip(compressed: &[u8]) -> Result<Vec<u8>, UpdateError> {
    if compressed.is_empty() {
        return Err(UpdateError::Decompression {
            reason: "empty response body".to_string(),
        });
    }

    let mut decoder = MultiGzDecoder::new(compressed);
    let mut binary = Vec::new();
    decoder.read_to_end(&mut binary).map_err(|e| UpdateError::Decompression {
        reason: e.to_string(),
    })?;

    Ok(binary)
}
