// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("missing field: {0}")]
    Missing(&'static str),

    #[error("invalid value for {0}")]
    InvalidValue(&'static str),

    #[error("timestamp out of range")]
    Timestamp,
}
