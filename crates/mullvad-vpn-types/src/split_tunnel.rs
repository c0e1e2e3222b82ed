// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitTunnelSettings {
    /// Whether the exclusion list is applied at all.
    pub enable_exclusions: bool,
    pub apps: Vec<PathBuf>,
}

/// A process currently excluded from the tunnel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedProcess {
    pub pid: u32,
    pub image: PathBuf,
    /// Whether the process is excluded because an ancestor is.
    pub inherited: bool,
}
