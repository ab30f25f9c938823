//! Retention-based cleanup of old box versions

use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::artifact::{ArtifactIdentity, UrlBuilder};
use crate::config::ServerConfig;
use crate::error::SaveError;
use crate::progress::UiObserver;
use crate::version::sort_descending;

/// Version listing returned by `GET <base>/<name>`
#[derive(Debug, Deserialize)]
struct VersionListing {
    versions: Vec<VersionRecord>,
}

#[derive(Debug, Deserialize)]
struct VersionRecord {
    version: String,
}

/// Outcome of a cleanup run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Versions left on the server, newest first
    pub kept: Vec<String>,
    /// Versions the server accepted a delete for
    pub deleted: Vec<String>,
    /// Versions whose delete failed
    pub failed: Vec<String>,
}

/// Deletes versions beyond a retention count
pub struct Cleaner {
    server: ServerConfig,
    ui: Arc<dyn UiObserver>,
}

impl Cleaner {
    pub fn new(server: ServerConfig, ui: Arc<dyn UiObserver>) -> Self {
        Self { server, ui }
    }

    /// Keep the `keep` most recent versions of `artifact` and delete the rest
    ///
    /// Only a failed listing is an error. Individual delete failures are
    /// logged and collected in the report.
    pub async fn clean(
        &self,
        artifact: &ArtifactIdentity,
        keep: usize,
    ) -> Result<CleanupReport, SaveError> {
        let data_url = UrlBuilder::build(artifact, &self.server)?;
        let client = self.server.http_client()?;

        let mut versions = self.fetch_versions(&client, &data_url).await?;
        debug!("Received {} versions", versions.len());

        sort_descending(&mut versions);
        if versions.len() <= keep {
            return Ok(CleanupReport {
                kept: versions,
                ..Default::default()
            });
        }

        self.ui.info("Cleaning up old versions");

        let stale = versions.split_off(keep);
        let mut report = CleanupReport {
            kept: versions,
            ..Default::default()
        };

        for version in stale {
            if self.delete_version(&client, &data_url, &version).await {
                report.deleted.push(version);
            } else {
                report.failed.push(version);
            }
        }

        info!(
            "Cleanup of {}: kept {}, deleted {}, failed {}",
            artifact.name,
            report.kept.len(),
            report.deleted.len(),
            report.failed.len()
        );

        Ok(report)
    }

    async fn fetch_versions(&self, client: &Client, url: &str) -> Result<Vec<String>, SaveError> {
        debug!("Load versions from {}", url);

        let response = client
            .get(url)
            .timeout(self.server.timeouts.request)
            .send()
            .await
            .map_err(|e| SaveError::ListingFailed(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SaveError::ListingFailed(format!(
                "{} returned status {}",
                url,
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SaveError::ListingFailed(format!("{}: {}", url, e)))?;
        let listing: VersionListing = serde_json::from_str(&body)
            .map_err(|e| SaveError::ListingFailed(format!("malformed listing from {}: {}", url, e)))?;

        Ok(listing.versions.into_iter().map(|v| v.version).collect())
    }

    /// Returns whether the server accepted the delete
    async fn delete_version(&self, client: &Client, data_url: &str, version: &str) -> bool {
        let delete_url = format!("{}/{}", data_url, version);
        debug!("Sending delete {}", delete_url);

        match client
            .delete(&delete_url)
            .timeout(self.server.timeouts.request)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(
                    "Delete of {} returned status {}",
                    delete_url,
                    response.status().as_u16()
                );
                false
            }
            Err(e) => {
                warn!("Delete of {} failed: {}", delete_url, e);
                false
            }
        }
    }
}
