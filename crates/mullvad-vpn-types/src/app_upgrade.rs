// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

/// Progress of an in-app upgrade, streamed to any listening frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppUpgradeEvent {
    DownloadStarting {
        server: String,
    },
    DownloadProgress {
        server: String,
        /// Completed percentage, 0-100.
        progress: u32,
        time_left: Option<Duration>,
    },
    Aborted,
    VerifyingInstaller,
    VerifiedInstaller {
        installer_path: PathBuf,
    },
    Error(AppUpgradeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum AppUpgradeError {
    #[error("upgrade failed")]
    GeneralError,
    #[error("failed to download the installer")]
    DownloadFailed,
    #[error("the downloaded installer failed verification")]
    VerificationFailed,
}
