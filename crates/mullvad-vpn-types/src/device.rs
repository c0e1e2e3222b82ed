// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

use crate::account::AccountNumber;

pub type DeviceId = String;

/// A device registered on an account. The public key is the device's
/// WireGuard identity towards the relays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub pubkey: [u8; 32],
    pub hijack_dns: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created: time::OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAndDevice {
    pub account_number: AccountNumber,
    pub device: Device,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    LoggedIn(AccountAndDevice),
    LoggedOut,
    Revoked,
}

impl DeviceState {
    pub fn logged_in(&self) -> Option<&AccountAndDevice> {
        match self {
            DeviceState::LoggedIn(account_and_device) => Some(account_and_device),
            _ => None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self, DeviceState::LoggedIn(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceEventCause {
    LoggedIn,
    LoggedOut,
    Revoked,
    Updated,
    RotatedKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub cause: DeviceEventCause,
    pub new_state: DeviceState,
}

/// Emitted when a device is removed from the account device list, which may
/// or may not be the device this daemon is running as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveDeviceEvent {
    pub account_number: AccountNumber,
    pub new_devices: Vec<Device>,
}
