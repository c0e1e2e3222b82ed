// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use mullvad_vpn_types::{account, app_upgrade, device, split_tunnel, version, wireguard};

use crate::conversions::util::timestamp_from_offset_datetime;

impl From<account::AccountData> for crate::AccountData {
    fn from(data: account::AccountData) -> Self {
        crate::AccountData {
            id: data.id,
            expiry: Some(timestamp_from_offset_datetime(data.expiry)),
        }
    }
}

impl From<account::VoucherSubmission> for crate::VoucherSubmission {
    fn from(submission: account::VoucherSubmission) -> Self {
        crate::VoucherSubmission {
            seconds_added: submission.seconds_added,
            new_expiry: Some(timestamp_from_offset_datetime(submission.new_expiry)),
        }
    }
}

impl From<device::Device> for crate::Device {
    fn from(device: device::Device) -> Self {
        crate::Device {
            id: device.id,
            name: device.name,
            pubkey: device.pubkey.to_vec(),
            hijack_dns: device.hijack_dns,
            created: Some(timestamp_from_offset_datetime(device.created)),
        }
    }
}

impl From<device::AccountAndDevice> for crate::AccountAndDevice {
    fn from(account_and_device: device::AccountAndDevice) -> Self {
        crate::AccountAndDevice {
            account_number: account_and_device.account_number,
            device: Some(crate::Device::from(account_and_device.device)),
        }
    }
}

impl From<device::DeviceState> for crate::DeviceState {
    fn from(state: device::DeviceState) -> Self {
        use crate::device_state::State;

        match state {
            device::DeviceState::LoggedIn(account_and_device) => crate::DeviceState {
                state: i32::from(State::LoggedIn),
                device: Some(crate::AccountAndDevice::from(account_and_device)),
            },
            device::DeviceState::LoggedOut => crate::DeviceState {
                state: i32::from(State::LoggedOut),
                device: None,
            },
            device::DeviceState::Revoked => crate::DeviceState {
                state: i32::from(State::Revoked),
                device: None,
            },
        }
    }
}

impl From<device::DeviceEventCause> for crate::device_event::Cause {
    fn from(cause: device::DeviceEventCause) -> Self {
        use crate::device_event::Cause;

        match cause {
            device::DeviceEventCause::LoggedIn => Cause::LoggedIn,
            device::DeviceEventCause::LoggedOut => Cause::LoggedOut,
            device::DeviceEventCause::Revoked => Cause::Revoked,
            device::DeviceEventCause::Updated => Cause::Updated,
            device::DeviceEventCause::RotatedKey => Cause::RotatedKey,
        }
    }
}

impl From<device::DeviceEvent> for crate::DeviceEvent {
    fn from(event: device::DeviceEvent) -> Self {
        crate::DeviceEvent {
            cause: i32::from(crate::device_event::Cause::from(event.cause)),
            new_state: Some(crate::DeviceState::from(event.new_state)),
        }
    }
}

impl From<device::RemoveDeviceEvent> for crate::RemoveDeviceEvent {
    fn from(event: device::RemoveDeviceEvent) -> Self {
        crate::RemoveDeviceEvent {
            account_number: event.account_number,
            new_device_list: event
                .new_devices
                .into_iter()
                .map(crate::Device::from)
                .collect(),
        }
    }
}

impl From<wireguard::PublicKey> for crate::PublicKey {
    fn from(key: wireguard::PublicKey) -> Self {
        crate::PublicKey {
            key: key.key.to_vec(),
            created: Some(timestamp_from_offset_datetime(key.created)),
        }
    }
}

impl From<version::AppVersionInfo> for crate::AppVersionInfo {
    fn from(info: version::AppVersionInfo) -> Self {
        crate::AppVersionInfo {
            supported: info.supported,
            suggested_upgrade: info.suggested_upgrade.map(crate::SuggestedUpgrade::from),
        }
    }
}

impl From<version::SuggestedUpgrade> for crate::SuggestedUpgrade {
    fn from(upgrade: version::SuggestedUpgrade) -> Self {
        crate::SuggestedUpgrade {
            version: upgrade.version,
            changelog: upgrade.changelog,
            verified_installer_path: upgrade
                .verified_installer_path
                .map(|path| path.to_string_lossy().into_owned()),
        }
    }
}

impl From<app_upgrade::AppUpgradeEvent> for crate::AppUpgradeEvent {
    fn from(event: app_upgrade::AppUpgradeEvent) -> Self {
        use crate::app_upgrade_event::{self, Event};

        let event = match event {
            app_upgrade::AppUpgradeEvent::DownloadStarting { server } => {
                Event::DownloadStarting(app_upgrade_event::DownloadStarting { server })
            }
            app_upgrade::AppUpgradeEvent::DownloadProgress {
                server,
                progress,
                time_left,
            } => Event::DownloadProgress(app_upgrade_event::DownloadProgress {
                server,
                progress,
                time_left: time_left.and_then(|left| prost_types::Duration::try_from(left).ok()),
            }),
            app_upgrade::AppUpgradeEvent::Aborted => Event::Aborted(app_upgrade_event::Aborted {}),
            app_upgrade::AppUpgradeEvent::VerifyingInstaller => {
                Event::VerifyingInstaller(app_upgrade_event::VerifyingInstaller {})
            }
            app_upgrade::AppUpgradeEvent::VerifiedInstaller { installer_path } => {
                Event::VerifiedInstaller(app_upgrade_event::VerifiedInstaller {
                    installer_path: installer_path.to_string_lossy().into_owned(),
                })
            }
            app_upgrade::AppUpgradeEvent::Error(error) => {
                Event::Error(crate::AppUpgradeError::from(error))
            }
        };

        crate::AppUpgradeEvent { event: Some(event) }
    }
}

impl From<app_upgrade::AppUpgradeError> for crate::AppUpgradeError {
    fn from(error: app_upgrade::AppUpgradeError) -> Self {
        use crate::app_upgrade_error::Error;

        crate::AppUpgradeError {
            error: i32::from(match error {
                app_upgrade::AppUpgradeError::GeneralError => Error::GeneralError,
                app_upgrade::AppUpgradeError::DownloadFailed => Error::DownloadFailed,
                app_upgrade::AppUpgradeError::VerificationFailed => Error::VerificationFailed,
            }),
        }
    }
}

impl From<split_tunnel::ExcludedProcess> for crate::ExcludedProcess {
    fn from(process: split_tunnel::ExcludedProcess) -> Self {
        crate::ExcludedProcess {
            pid: process.pid,
            image: process.image.to_string_lossy().into_owned(),
            inherited: process.inherited,
        }
    }
}
