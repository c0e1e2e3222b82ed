// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use super::{account::AccountError, config::ConfigSetupError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to set up daemon directories")]
    ConfigSetup(#[source] ConfigSetupError),

    #[error("failed to persist settings")]
    SettingsPersist(#[source] ConfigSetupError),

    #[error("account error")]
    Account(#[source] AccountError),

    #[error("custom list error")]
    CustomList(#[source] mullvad_vpn_types::custom_list::Error),

    #[error("access method error")]
    AccessMethod(#[source] mullvad_vpn_types::access_method::Error),

    #[error("no upgrade is available")]
    NoUpgradeAvailable,

    #[error("no upgrade is in progress")]
    NoUpgradeInProgress,

    #[error("invalid settings patch: {0}")]
    InvalidSettingsPatch(&'static str),
}
