//! HTTP transport shared by the metadata, patch and binary fetchers.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use crate::constants::CONNECT_TIMEOUT;
use crate::core::UpdateError;

/// Thin wrapper around a `reqwest::Client` configured for update downloads.
///
/// All requests are unauthenticated GETs. Status codes other than 200 are
/// reported as [`UpdateError::HttpStatus`]; callers map errors into their own
/// tier-specific variants where needed.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a client with the given whole-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, UpdateError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("autopatch/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|e| UpdateError::Config {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
        })
    }

    /// GET `url` and return the full response body.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, UpdateError> {
        debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(|e| UpdateError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(UpdateError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| UpdateError::Network {
            url: url.to_string(),
            reason: format!("failed to read response body: {e}"),
        })?;

        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}
