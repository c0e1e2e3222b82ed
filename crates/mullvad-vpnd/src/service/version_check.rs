// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

//! App version metadata. Loaded from a cache file in the data directory and
//! optionally refreshed from a metadata endpoint.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use mullvad_vpn_types::version::{AppVersionInfo, SuggestedUpgrade};

pub(crate) const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct VersionCache {
    #[serde(default = "default_supported")]
    pub supported: bool,
    pub suggested_upgrade: Option<SuggestedUpgradeInfo>,
}

fn default_supported() -> bool {
    true
}

/// The cache carries the installer origin alongside what is shown to
/// frontends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SuggestedUpgradeInfo {
    pub version: String,
    pub changelog: Option<String>,
    pub installer_url: Option<String>,
    pub installer_sha256: Option<String>,
}

pub(crate) struct VersionChecker {
    cache: VersionCache,
    cache_path: PathBuf,
    verified_installer_path: Option<PathBuf>,
}

impl VersionChecker {
    pub(crate) fn load(cache_path: PathBuf) -> Self {
        let cache = match std::fs::read_to_string(&cache_path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|error| {
                tracing::error!("Ignoring malformed version cache: {error}");
                VersionCache {
                    supported: true,
                    suggested_upgrade: None,
                }
            }),
            Err(_) => VersionCache {
                supported: true,
                suggested_upgrade: None,
            },
        };
        Self {
            cache,
            cache_path,
            verified_installer_path: None,
        }
    }

    pub(crate) fn version_info(&self) -> AppVersionInfo {
        AppVersionInfo {
            supported: self.cache.supported,
            suggested_upgrade: self.cache.suggested_upgrade.as_ref().map(|upgrade| {
                SuggestedUpgrade {
                    version: upgrade.version.clone(),
                    changelog: upgrade.changelog.clone(),
                    verified_installer_path: self.verified_installer_path.clone(),
                }
            }),
        }
    }

    pub(crate) fn suggested_upgrade(&self) -> Option<&SuggestedUpgradeInfo> {
        self.cache.suggested_upgrade.as_ref()
    }

    pub(crate) fn set_verified_installer(&mut self, path: PathBuf) {
        self.verified_installer_path = Some(path);
    }

    /// Fetches fresh metadata from `url` and persists it to the cache file.
    pub(crate) async fn refresh(&mut self, url: &str) -> Result<(), RefreshError> {
        let response = reqwest::get(url).await.map_err(RefreshError::Fetch)?;
        let cache: VersionCache = response.json().await.map_err(RefreshError::Fetch)?;

        if let Ok(serialized) = serde_json::to_string_pretty(&cache) {
            if let Err(error) = std::fs::write(&self.cache_path, serialized) {
                tracing::error!("Failed to write version cache: {error}");
            }
        }
        self.cache = cache;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum RefreshError {
    #[error("failed to fetch version metadata")]
    Fetch(#[source] reqwest::Error),
}

pub(crate) fn default_cache_path(data_dir: &Path) -> PathBuf {
    data_dir.join(super::config::DEFAULT_VERSION_CACHE_FILE)
}
