//! Artifact identity and resource URL construction

use url::Url;

use crate::config::ServerConfig;
use crate::error::SaveError;

/// Canonical provider name the box server indexes every VMware flavour under
pub const VMWARE_PROVIDER: &str = "vmware_desktop";

/// A named, provider-specific box image
///
/// The name is a namespace hierarchy joined by underscores, e.g. `org_team_box`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactIdentity {
    pub name: String,
    pub provider: String,
}

impl ArtifactIdentity {
    pub fn new(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
        }
    }

    /// Provider token the box server expects for this artifact
    pub fn provider_token(&self) -> String {
        normalize_provider(&self.provider)
    }
}

/// Map any provider containing `vmware` to the canonical VMware token
pub fn normalize_provider(provider: &str) -> String {
    if provider.contains("vmware") {
        VMWARE_PROVIDER.to_string()
    } else {
        provider.to_string()
    }
}

/// Derives resource URLs from artifact identity and server settings
pub struct UrlBuilder;

impl UrlBuilder {
    /// Build `<base>/<name>` with every underscore run in the name turned
    /// into a single path separator
    pub fn build(artifact: &ArtifactIdentity, server: &ServerConfig) -> Result<String, SaveError> {
        let base = server
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(SaveError::ServerNotConfigured)?;

        Url::parse(base).map_err(|e| SaveError::InvalidServerUrl(format!("{}: {}", base, e)))?;

        let path = name_to_path(&artifact.name);
        if path.is_empty() {
            return Err(SaveError::InvalidArtifact(format!(
                "box name '{}' has no path segments",
                artifact.name
            )));
        }

        Ok(format!("{}/{}", base.trim_end_matches('/'), path))
    }
}

fn name_to_path(name: &str) -> String {
    name.split('_')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
