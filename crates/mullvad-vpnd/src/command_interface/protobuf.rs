// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

//! Glue between daemon-internal values and the protobuf envelopes the
//! streaming RPCs emit, plus the error-to-status mapping.

use mullvad_vpn_proto as proto;
use tonic::Status;

use crate::{
    logging::LogMessage,
    service::{AccountError, DaemonEvent, Error},
};

pub(super) fn daemon_event(event: DaemonEvent) -> proto::DaemonEvent {
    let event = match event {
        DaemonEvent::TunnelState(state) => {
            proto::daemon_event::Event::TunnelState(proto::TunnelState::from(state))
        }
        DaemonEvent::Settings(settings) => {
            proto::daemon_event::Event::Settings(proto::Settings::from(&settings))
        }
        DaemonEvent::RelayList(list) => {
            proto::daemon_event::Event::RelayList(proto::RelayList::from(list))
        }
        DaemonEvent::VersionInfo(info) => {
            proto::daemon_event::Event::VersionInfo(proto::AppVersionInfo::from(info))
        }
        DaemonEvent::Device(event) => {
            proto::daemon_event::Event::Device(proto::DeviceEvent::from(event))
        }
        DaemonEvent::RemoveDevice(event) => {
            proto::daemon_event::Event::RemoveDevice(proto::RemoveDeviceEvent::from(event))
        }
    };
    proto::DaemonEvent { event: Some(event) }
}

pub(super) fn log_entry(message: LogMessage) -> proto::LogEntry {
    use proto::log_entry::Level;

    let level = match message.level {
        tracing::Level::TRACE => Level::Trace,
        tracing::Level::DEBUG => Level::Debug,
        tracing::Level::INFO => Level::Info,
        tracing::Level::WARN => Level::Warning,
        tracing::Level::ERROR => Level::Error,
    };
    proto::LogEntry {
        level: i32::from(level),
        message: message.message,
    }
}

pub(super) fn map_account_error(error: AccountError) -> Status {
    match error {
        AccountError::InvalidAccount => Status::unauthenticated(error.to_string()),
        AccountError::AlreadyLoggedIn => Status::already_exists(error.to_string()),
        AccountError::NotLoggedIn => Status::failed_precondition(error.to_string()),
        AccountError::TooManyDevices | AccountError::UsedVoucher => {
            Status::resource_exhausted(error.to_string())
        }
        AccountError::DeviceNotFound | AccountError::InvalidVoucher => {
            Status::not_found(error.to_string())
        }
        AccountError::Persist(_) => Status::internal(error.to_string()),
    }
}

pub(super) fn map_daemon_error(error: Error) -> Status {
    use mullvad_vpn_types::{access_method, custom_list};

    match error {
        Error::CustomList(custom_list::Error::ListNotFound) => Status::not_found(error.to_string()),
        Error::CustomList(custom_list::Error::ListExists) => {
            Status::already_exists(error.to_string())
        }
        Error::AccessMethod(access_method::Error::NotFound) => {
            Status::not_found(error.to_string())
        }
        Error::AccessMethod(access_method::Error::RemoveBuiltIn) => {
            Status::invalid_argument(error.to_string())
        }
        Error::NoUpgradeAvailable | Error::NoUpgradeInProgress => {
            Status::failed_precondition(error.to_string())
        }
        Error::InvalidSettingsPatch(_) => Status::invalid_argument(error.to_string()),
        Error::Account(account_error) => map_account_error(account_error),
        Error::ConfigSetup(_) | Error::SettingsPersist(_) => Status::internal(error.to_string()),
    }
}
