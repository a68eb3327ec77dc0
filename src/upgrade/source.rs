//! Remote side of an update cycle.

use std::future::Future;

use crate::core::UpdateError;
use crate::upgrade::config::UpdateConfig;
use crate::upgrade::download;
use crate::upgrade::http::HttpClient;
use crate::upgrade::metadata::{self, VersionInfo};
use crate::upgrade::patch;

/// Where version metadata and payloads come from.
///
/// [`SelfUpdater`](crate::upgrade::SelfUpdater) only talks to the network
/// through this trait, so tests can substitute an in-memory source and count
/// how often each tier is attempted.
pub trait UpdateSource {
    /// Fetch the latest published version and its digest.
    fn fetch_info(&self) -> impl Future<Output = Result<VersionInfo, UpdateError>> + Send;

    /// Fetch the `from -> to` patch and apply it to `old`.
    fn apply_patch(
        &self,
        old: &[u8],
        from_version: &str,
        to_version: &str,
    ) -> impl Future<Output = Result<Vec<u8>, UpdateError>> + Send;

    /// Fetch and decompress the full binary for `version`.
    fn fetch_full_binary(
        &self,
        version: &str,
    ) -> impl Future<Output = Result<Vec<u8>, UpdateError>> + Send;
}

/// [`UpdateSource`] backed by the update server's HTTP endpoints.
#[derive(Debug, Clone)]
pub struct HttpUpdateSource {
    client: HttpClient,
    config: UpdateConfig,
}

impl HttpUpdateSource {
    /// Build a source for the endpoints in `config`.
    pub fn new(config: UpdateConfig) -> Result<Self, UpdateError> {
        let client = HttpClient::new(config.http_timeout)?;
        Ok(Self {
            client,
            config,
        })
    }
}

impl UpdateSource for HttpUpdateSource {
    async fn fetch_info(&self) -> Result<VersionInfo, UpdateError> {
        metadata::fetch_info(&self.client, &self.config).await
    }

    async fn apply_patch(
        &self,
        old: &[u8],
        from_version: &str,
        to_version: &str,
    ) -> Result<Vec<u8>, UpdateError> {
        patch::apply_patch(&self.client, &self.config, old, from_version, to_version).await
    }

    async fn fetch_full_binary(&self, version: &str) -> Result<Vec<u8>, UpdateError> {
        download::fetch_full_binary(&self.client, &self.config, version).await
    }
}
