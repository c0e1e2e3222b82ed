// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use mullvad_vpn_types::{account, app_upgrade, device, split_tunnel, version, wireguard};

use crate::conversions::{
    error::ConversionError,
    util::{key_from_bytes, offset_datetime_from_timestamp},
};

impl TryFrom<crate::AccountData> for account::AccountData {
    type Error = ConversionError;

    fn try_from(data: crate::AccountData) -> Result<Self, Self::Error> {
        Ok(account::AccountData {
            id: data.id,
            expiry: offset_datetime_from_timestamp(
                data.expiry.ok_or(ConversionError::Missing("expiry"))?,
            )?,
        })
    }
}

impl TryFrom<crate::VoucherSubmission> for account::VoucherSubmission {
    type Error = ConversionError;

    fn try_from(submission: crate::VoucherSubmission) -> Result<Self, Self::Error> {
        Ok(account::VoucherSubmission {
            seconds_added: submission.seconds_added,
            new_expiry: offset_datetime_from_timestamp(
                submission
                    .new_expiry
                    .ok_or(ConversionError::Missing("new expiry"))?,
            )?,
        })
    }
}

impl TryFrom<crate::Device> for device::Device {
    type Error = ConversionError;

    fn try_from(device: crate::Device) -> Result<Self, Self::Error> {
        Ok(device::Device {
            id: device.id,
            name: device.name,
            pubkey: key_from_bytes(&device.pubkey, "device public key")?,
            hijack_dns: device.hijack_dns,
            created: offset_datetime_from_timestamp(
                device
                    .created
                    .ok_or(ConversionError::Missing("device creation time"))?,
            )?,
        })
    }
}

impl TryFrom<crate::AccountAndDevice> for device::AccountAndDevice {
    type Error = ConversionError;

    fn try_from(account_and_device: crate::AccountAndDevice) -> Result<Self, Self::Error> {
        Ok(device::AccountAndDevice {
            account_number: account_and_device.account_number,
            device: device::Device::try_from(
                account_and_device
                    .device
                    .ok_or(ConversionError::Missing("device"))?,
            )?,
        })
    }
}

impl TryFrom<crate::DeviceState> for device::DeviceState {
    type Error = ConversionError;

    fn try_from(state: crate::DeviceState) -> Result<Self, Self::Error> {
        use crate::device_state::State;

        match State::try_from(state.state) {
            Ok(State::LoggedIn) => Ok(device::DeviceState::LoggedIn(
                device::AccountAndDevice::try_from(
                    state
                        .device
                        .ok_or(ConversionError::Missing("logged in device"))?,
                )?,
            )),
            Ok(State::LoggedOut) => Ok(device::DeviceState::LoggedOut),
            Ok(State::Revoked) => Ok(device::DeviceState::Revoked),
            Err(_) => Err(ConversionError::InvalidValue("device state")),
        }
    }
}

impl TryFrom<crate::DeviceEvent> for device::DeviceEvent {
    type Error = ConversionError;

    fn try_from(event: crate::DeviceEvent) -> Result<Self, Self::Error> {
        use crate::device_event::Cause;

        let cause = match Cause::try_from(event.cause) {
            Ok(Cause::LoggedIn) => device::DeviceEventCause::LoggedIn,
            Ok(Cause::LoggedOut) => device::DeviceEventCause::LoggedOut,
            Ok(Cause::Revoked) => device::DeviceEventCause::Revoked,
            Ok(Cause::Updated) => device::DeviceEventCause::Updated,
            Ok(Cause::RotatedKey) => device::DeviceEventCause::RotatedKey,
            Err(_) => return Err(ConversionError::InvalidValue("device event cause")),
        };

        Ok(device::DeviceEvent {
            cause,
            new_state: device::DeviceState::try_from(
                event
                    .new_state
                    .ok_or(ConversionError::Missing("device state"))?,
            )?,
        })
    }
}

impl TryFrom<crate::RemoveDeviceEvent> for device::RemoveDeviceEvent {
    type Error = ConversionError;

    fn try_from(event: crate::RemoveDeviceEvent) -> Result<Self, Self::Error> {
        Ok(device::RemoveDeviceEvent {
            account_number: event.account_number,
            new_devices: event
                .new_device_list
                .into_iter()
                .map(device::Device::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

impl TryFrom<crate::PublicKey> for wireguard::PublicKey {
    type Error = ConversionError;

    fn try_from(key: crate::PublicKey) -> Result<Self, Self::Error> {
        Ok(wireguard::PublicKey {
            key: key_from_bytes(&key.key, "public key")?,
            created: offset_datetime_from_timestamp(
                key.created
                    .ok_or(ConversionError::Missing("key creation time"))?,
            )?,
        })
    }
}

impl From<crate::AppVersionInfo> for version::AppVersionInfo {
    fn from(info: crate::AppVersionInfo) -> Self {
        version::AppVersionInfo {
            supported: info.supported,
            suggested_upgrade: info.suggested_upgrade.map(version::SuggestedUpgrade::from),
        }
    }
}

impl From<crate::SuggestedUpgrade> for version::SuggestedUpgrade {
    fn from(upgrade: crate::SuggestedUpgrade) -> Self {
        version::SuggestedUpgrade {
            version: upgrade.version,
            changelog: upgrade.changelog,
            verified_installer_path: upgrade
                .verified_installer_path
                .map(std::path::PathBuf::from),
        }
    }
}

impl TryFrom<crate::AppUpgradeEvent> for app_upgrade::AppUpgradeEvent {
    type Error = ConversionError;

    fn try_from(event: crate::AppUpgradeEvent) -> Result<Self, ConversionError> {
        use crate::app_upgrade_event::Event;

        let event = match event
            .event
            .ok_or(ConversionError::Missing("app upgrade event"))?
        {
            Event::DownloadStarting(starting) => app_upgrade::AppUpgradeEvent::DownloadStarting {
                server: starting.server,
            },
            Event::DownloadProgress(progress) => app_upgrade::AppUpgradeEvent::DownloadProgress {
                server: progress.server,
                progress: progress.progress,
                time_left: progress
                    .time_left
                    .map(std::time::Duration::try_from)
                    .transpose()
                    .map_err(|_| ConversionError::InvalidValue("time left"))?,
            },
            Event::Aborted(_) => app_upgrade::AppUpgradeEvent::Aborted,
            Event::VerifyingInstaller(_) => app_upgrade::AppUpgradeEvent::VerifyingInstaller,
            Event::VerifiedInstaller(verified) => {
                app_upgrade::AppUpgradeEvent::VerifiedInstaller {
                    installer_path: std::path::PathBuf::from(verified.installer_path),
                }
            }
            Event::Error(error) => {
                app_upgrade::AppUpgradeEvent::Error(app_upgrade::AppUpgradeError::try_from(error)?)
            }
        };

        Ok(event)
    }
}

impl TryFrom<crate::AppUpgradeError> for app_upgrade::AppUpgradeError {
    type Error = ConversionError;

    fn try_from(error: crate::AppUpgradeError) -> Result<Self, Self::Error> {
        use crate::app_upgrade_error::Error;

        match Error::try_from(error.error) {
            Ok(Error::GeneralError) => Ok(app_upgrade::AppUpgradeError::GeneralError),
            Ok(Error::DownloadFailed) => Ok(app_upgrade::AppUpgradeError::DownloadFailed),
            Ok(Error::VerificationFailed) => Ok(app_upgrade::AppUpgradeError::VerificationFailed),
            Err(_) => Err(ConversionError::InvalidValue("app upgrade error")),
        }
    }
}

impl From<crate::ExcludedProcess> for split_tunnel::ExcludedProcess {
    fn from(process: crate::ExcludedProcess) -> Self {
        split_tunnel::ExcludedProcess {
            pid: process.pid,
            image: std::path::PathBuf::from(process.image),
            inherited: process.inherited,
        }
    }
}
