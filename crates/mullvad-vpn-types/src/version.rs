// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub type AppVersion = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppVersionInfo {
    /// Whether the running version is still supported by the API.
    pub supported: bool,
    pub suggested_upgrade: Option<SuggestedUpgrade>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedUpgrade {
    pub version: AppVersion,
    pub changelog: Option<String>,
    /// Path to an installer that has already been downloaded and verified.
    pub verified_installer_path: Option<PathBuf>,
}
