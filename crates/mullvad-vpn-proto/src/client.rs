// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

//! A client for the management interface that takes and returns native types
//! instead of the generated protobuf ones.

use futures::{Stream, StreamExt};
use tonic::{transport::Channel, Code, Status};

use mullvad_vpn_types::{
    access_method,
    account::{AccountData, AccountNumber, VoucherSubmission},
    app_upgrade::AppUpgradeEvent,
    custom_list::{self, CustomList},
    device::{Device, DeviceEvent, DeviceId, DeviceState, RemoveDeviceEvent},
    location::GeoIpLocation,
    net::proxy::CustomProxy,
    relay_constraints::{BridgeSettings, BridgeState, ObfuscationSettings, RelaySettings},
    relay_list::RelayList,
    settings::{DnsOptions, Settings},
    split_tunnel::ExcludedProcess,
    states::TunnelState,
    version::AppVersionInfo,
    wireguard::{PublicKey, QuantumResistantState, RotationInterval},
};

use crate::{conversions::ConversionError, management_service_client::ManagementServiceClient};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("management interface RPC failed")]
    Rpc(#[source] Status),

    #[error("invalid response from the daemon")]
    InvalidResponse(#[source] ConversionError),

    #[error("daemon event payload was empty")]
    MissingDaemonEvent,

    #[error("rotation interval is too large")]
    DurationTooLarge,

    #[error("there are too many devices on the account")]
    TooManyDevices,

    #[error("the account does not exist")]
    InvalidAccount,

    #[error("another account is already logged in")]
    AlreadyLoggedIn,

    #[error("the device was not found")]
    DeviceNotFound,

    #[error("the voucher is invalid")]
    InvalidVoucher,

    #[error("the voucher has already been used")]
    UsedVoucher,

    #[error("no location data is available")]
    NoLocationData,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Decoded variant of [`crate::DaemonEvent`].
pub enum DaemonEvent {
    TunnelState(TunnelState),
    Settings(Settings),
    RelayList(RelayList),
    AppVersionInfo(AppVersionInfo),
    Device(DeviceEvent),
    RemoveDevice(RemoveDeviceEvent),
}

impl TryFrom<crate::daemon_event::Event> for DaemonEvent {
    type Error = Error;

    fn try_from(event: crate::daemon_event::Event) -> Result<Self> {
        match event {
            crate::daemon_event::Event::TunnelState(state) => TunnelState::try_from(state)
                .map(DaemonEvent::TunnelState)
                .map_err(Error::InvalidResponse),
            crate::daemon_event::Event::Settings(settings) => Settings::try_from(settings)
                .map(DaemonEvent::Settings)
                .map_err(Error::InvalidResponse),
            crate::daemon_event::Event::RelayList(list) => RelayList::try_from(list)
                .map(DaemonEvent::RelayList)
                .map_err(Error::InvalidResponse),
            crate::daemon_event::Event::VersionInfo(info) => {
                Ok(DaemonEvent::AppVersionInfo(AppVersionInfo::from(info)))
            }
            crate::daemon_event::Event::Device(event) => DeviceEvent::try_from(event)
                .map(DaemonEvent::Device)
                .map_err(Error::InvalidResponse),
            crate::daemon_event::Event::RemoveDevice(event) => RemoveDeviceEvent::try_from(event)
                .map(DaemonEvent::RemoveDevice)
                .map_err(Error::InvalidResponse),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ManagementClient(ManagementServiceClient<Channel>);

impl ManagementClient {
    pub fn new(channel: Channel) -> Self {
        Self(ManagementServiceClient::new(channel))
    }

    /// The raw generated client, for calls without a typed wrapper.
    pub fn inner(&mut self) -> &mut ManagementServiceClient<Channel> {
        &mut self.0
    }

    pub async fn connect_tunnel(&mut self) -> Result<bool> {
        Ok(self.0.connect_tunnel(()).await.map_err(Error::Rpc)?.into_inner())
    }

    pub async fn disconnect_tunnel(&mut self) -> Result<bool> {
        Ok(self
            .0
            .disconnect_tunnel(())
            .await
            .map_err(Error::Rpc)?
            .into_inner())
    }

    pub async fn reconnect_tunnel(&mut self) -> Result<bool> {
        Ok(self
            .0
            .reconnect_tunnel(())
            .await
            .map_err(Error::Rpc)?
            .into_inner())
    }

    pub async fn get_tunnel_state(&mut self) -> Result<TunnelState> {
        let state = self
            .0
            .get_tunnel_state(())
            .await
            .map_err(Error::Rpc)?
            .into_inner();
        TunnelState::try_from(state).map_err(Error::InvalidResponse)
    }

    pub async fn events_listen(&mut self) -> Result<impl Stream<Item = Result<DaemonEvent>>> {
        let listener = self
            .0
            .events_listen(())
            .await
            .map_err(Error::Rpc)?
            .into_inner();

        Ok(listener.map(|item| {
            let event = item
                .map_err(Error::Rpc)?
                .event
                .ok_or(Error::MissingDaemonEvent)?;
            DaemonEvent::try_from(event)
        }))
    }

    pub async fn log_listen(
        &mut self,
    ) -> Result<impl Stream<Item = std::result::Result<crate::LogEntry, Status>>> {
        Ok(self.0.log_listen(()).await.map_err(Error::Rpc)?.into_inner())
    }

    pub async fn app_upgrade(&mut self) -> Result<()> {
        self.0.app_upgrade(()).await.map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn app_upgrade_abort(&mut self) -> Result<()> {
        self.0.app_upgrade_abort(()).await.map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn app_upgrade_events_listen(
        &mut self,
    ) -> Result<impl Stream<Item = Result<AppUpgradeEvent>>> {
        let listener = self
            .0
            .app_upgrade_events_listen(())
            .await
            .map_err(Error::Rpc)?
            .into_inner();

        Ok(listener.map(|item| {
            AppUpgradeEvent::try_from(item.map_err(Error::Rpc)?).map_err(Error::InvalidResponse)
        }))
    }

    pub async fn prepare_restart(&mut self) -> Result<()> {
        self.0.prepare_restart(()).await.map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn factory_reset(&mut self) -> Result<()> {
        self.0.factory_reset(()).await.map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn get_current_version(&mut self) -> Result<String> {
        Ok(self
            .0
            .get_current_version(())
            .await
            .map_err(Error::Rpc)?
            .into_inner())
    }

    pub async fn get_version_info(&mut self) -> Result<AppVersionInfo> {
        let info = self
            .0
            .get_version_info(())
            .await
            .map_err(Error::Rpc)?
            .into_inner();
        Ok(AppVersionInfo::from(info))
    }

    pub async fn is_performing_post_upgrade(&mut self) -> Result<bool> {
        Ok(self
            .0
            .is_performing_post_upgrade(())
            .await
            .map_err(Error::Rpc)?
            .into_inner())
    }

    pub async fn get_relay_locations(&mut self) -> Result<RelayList> {
        let list = self
            .0
            .get_relay_locations(())
            .await
            .map_err(Error::Rpc)?
            .into_inner();
        RelayList::try_from(list).map_err(Error::InvalidResponse)
    }

    pub async fn update_relay_locations(&mut self) -> Result<()> {
        self.0.update_relay_locations(()).await.map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn get_current_location(&mut self) -> Result<GeoIpLocation> {
        let location = self
            .0
            .get_current_location(())
            .await
            .map_err(map_location_error)?
            .into_inner();
        GeoIpLocation::try_from(location).map_err(Error::InvalidResponse)
    }

    pub async fn get_settings(&mut self) -> Result<Settings> {
        let settings = self
            .0
            .get_settings(())
            .await
            .map_err(Error::Rpc)?
            .into_inner();
        Settings::try_from(settings).map_err(Error::InvalidResponse)
    }

    pub async fn reset_settings(&mut self) -> Result<()> {
        self.0.reset_settings(()).await.map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn set_relay_settings(&mut self, settings: RelaySettings) -> Result<()> {
        self.0
            .set_relay_settings(crate::RelaySettings::from(settings))
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn set_allow_lan(&mut self, state: bool) -> Result<()> {
        self.0.set_allow_lan(state).await.map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn set_show_beta_releases(&mut self, state: bool) -> Result<()> {
        self.0
            .set_show_beta_releases(state)
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn set_block_when_disconnected(&mut self, state: bool) -> Result<()> {
        self.0
            .set_block_when_disconnected(state)
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn set_auto_connect(&mut self, state: bool) -> Result<()> {
        self.0.set_auto_connect(state).await.map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn set_openvpn_mssfix(&mut self, mssfix: Option<u16>) -> Result<()> {
        self.0
            .set_openvpn_mssfix(mssfix.map(u32::from).unwrap_or(0))
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn set_wireguard_mtu(&mut self, mtu: Option<u16>) -> Result<()> {
        self.0
            .set_wireguard_mtu(mtu.map(u32::from).unwrap_or(0))
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn set_enable_ipv6(&mut self, state: bool) -> Result<()> {
        self.0.set_enable_ipv6(state).await.map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn set_quantum_resistant_tunnel(
        &mut self,
        state: QuantumResistantState,
    ) -> Result<()> {
        self.0
            .set_quantum_resistant_tunnel(crate::QuantumResistantState::from(state))
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn set_enable_daita(&mut self, state: bool) -> Result<()> {
        self.0.set_enable_daita(state).await.map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn set_dns_options(&mut self, options: DnsOptions) -> Result<()> {
        self.0
            .set_dns_options(crate::DnsOptions::from(&options))
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn set_obfuscation_settings(&mut self, settings: ObfuscationSettings) -> Result<()> {
        self.0
            .set_obfuscation_settings(crate::ObfuscationSettings::from(&settings))
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn set_bridge_settings(&mut self, settings: BridgeSettings) -> Result<()> {
        self.0
            .set_bridge_settings(crate::BridgeSettings::from(settings))
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn set_bridge_state(&mut self, state: BridgeState) -> Result<()> {
        self.0
            .set_bridge_state(crate::BridgeState::from(state))
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn apply_json_settings(&mut self, blob: String) -> Result<()> {
        self.0.apply_json_settings(blob).await.map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn export_json_settings(&mut self) -> Result<String> {
        Ok(self
            .0
            .export_json_settings(())
            .await
            .map_err(Error::Rpc)?
            .into_inner())
    }

    pub async fn create_new_account(&mut self) -> Result<AccountNumber> {
        Ok(self
            .0
            .create_new_account(())
            .await
            .map_err(map_device_error)?
            .into_inner())
    }

    pub async fn login_account(&mut self, account: AccountNumber) -> Result<()> {
        self.0.login_account(account).await.map_err(map_device_error)?;
        Ok(())
    }

    pub async fn logout_account(&mut self) -> Result<()> {
        self.0.logout_account(()).await.map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn get_account_data(&mut self, account: AccountNumber) -> Result<AccountData> {
        let data = self
            .0
            .get_account_data(account)
            .await
            .map_err(map_device_error)?
            .into_inner();
        AccountData::try_from(data).map_err(Error::InvalidResponse)
    }

    pub async fn get_account_history(&mut self) -> Result<Option<AccountNumber>> {
        Ok(self
            .0
            .get_account_history(())
            .await
            .map_err(Error::Rpc)?
            .into_inner()
            .number)
    }

    pub async fn clear_account_history(&mut self) -> Result<()> {
        self.0.clear_account_history(()).await.map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn get_www_auth_token(&mut self) -> Result<String> {
        Ok(self
            .0
            .get_www_auth_token(())
            .await
            .map_err(Error::Rpc)?
            .into_inner())
    }

    pub async fn submit_voucher(&mut self, voucher: String) -> Result<VoucherSubmission> {
        let submission = self
            .0
            .submit_voucher(voucher)
            .await
            .map_err(|error| match error.code() {
                Code::NotFound => Error::InvalidVoucher,
                Code::ResourceExhausted => Error::UsedVoucher,
                _other => Error::Rpc(error),
            })?
            .into_inner();
        VoucherSubmission::try_from(submission).map_err(Error::InvalidResponse)
    }

    pub async fn get_device(&mut self) -> Result<DeviceState> {
        let state = self
            .0
            .get_device(())
            .await
            .map_err(map_device_error)?
            .into_inner();
        DeviceState::try_from(state).map_err(Error::InvalidResponse)
    }

    pub async fn update_device(&mut self) -> Result<()> {
        self.0.update_device(()).await.map_err(map_device_error)?;
        Ok(())
    }

    pub async fn list_devices(&mut self, account: AccountNumber) -> Result<Vec<Device>> {
        let list = self
            .0
            .list_devices(account)
            .await
            .map_err(map_device_error)?
            .into_inner();
        list.devices
            .into_iter()
            .map(|device| Device::try_from(device).map_err(Error::InvalidResponse))
            .collect()
    }

    pub async fn remove_device(
        &mut self,
        account: AccountNumber,
        device_id: DeviceId,
    ) -> Result<()> {
        self.0
            .remove_device(crate::DeviceRemoval {
                account_number: account,
                device_id,
            })
            .await
            .map_err(map_device_error)?;
        Ok(())
    }

    pub async fn set_wireguard_rotation_interval(
        &mut self,
        interval: RotationInterval,
    ) -> Result<()> {
        let duration = prost_types::Duration::try_from(*interval.as_duration())
            .map_err(|_| Error::DurationTooLarge)?;
        self.0
            .set_wireguard_rotation_interval(duration)
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn reset_wireguard_rotation_interval(&mut self) -> Result<()> {
        self.0
            .reset_wireguard_rotation_interval(())
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn rotate_wireguard_key(&mut self) -> Result<()> {
        self.0.rotate_wireguard_key(()).await.map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn get_wireguard_key(&mut self) -> Result<PublicKey> {
        let key = self
            .0
            .get_wireguard_key(())
            .await
            .map_err(Error::Rpc)?
            .into_inner();
        PublicKey::try_from(key).map_err(Error::InvalidResponse)
    }

    pub async fn create_custom_list(&mut self, name: String) -> Result<custom_list::Id> {
        let id = self
            .0
            .create_custom_list(name)
            .await
            .map_err(Error::Rpc)?
            .into_inner();
        id.parse()
            .map_err(|_| Error::InvalidResponse(ConversionError::InvalidValue("custom list id")))
    }

    pub async fn delete_custom_list(&mut self, id: custom_list::Id) -> Result<()> {
        self.0
            .delete_custom_list(id.to_string())
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn update_custom_list(&mut self, list: CustomList) -> Result<()> {
        self.0
            .update_custom_list(crate::CustomList::from(list))
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn clear_custom_lists(&mut self) -> Result<()> {
        self.0.clear_custom_lists(()).await.map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn add_access_method(
        &mut self,
        name: String,
        enabled: bool,
        access_method: access_method::AccessMethod,
    ) -> Result<access_method::Id> {
        let id = self
            .0
            .add_api_access_method(crate::NewAccessMethodSetting {
                name,
                enabled,
                access_method: Some(crate::AccessMethod::from(access_method)),
            })
            .await
            .map_err(Error::Rpc)?
            .into_inner();
        access_method::Id::try_from(id).map_err(Error::InvalidResponse)
    }

    pub async fn remove_access_method(&mut self, id: access_method::Id) -> Result<()> {
        self.0
            .remove_api_access_method(crate::Uuid::from(id))
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn update_access_method(
        &mut self,
        setting: access_method::AccessMethodSetting,
    ) -> Result<()> {
        self.0
            .update_api_access_method(crate::AccessMethodSetting::from(setting))
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn set_access_method(&mut self, id: access_method::Id) -> Result<()> {
        self.0
            .set_api_access_method(crate::Uuid::from(id))
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn get_current_access_method(
        &mut self,
    ) -> Result<access_method::AccessMethodSetting> {
        let setting = self
            .0
            .get_current_api_access_method(())
            .await
            .map_err(Error::Rpc)?
            .into_inner();
        access_method::AccessMethodSetting::try_from(setting).map_err(Error::InvalidResponse)
    }

    pub async fn clear_custom_access_methods(&mut self) -> Result<()> {
        self.0
            .clear_custom_api_access_methods(())
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn test_access_method_by_id(&mut self, id: access_method::Id) -> Result<bool> {
        Ok(self
            .0
            .test_api_access_method_by_id(crate::Uuid::from(id))
            .await
            .map_err(Error::Rpc)?
            .into_inner())
    }

    pub async fn test_custom_access_method(&mut self, proxy: CustomProxy) -> Result<bool> {
        Ok(self
            .0
            .test_custom_api_access_method(crate::CustomProxy::from(proxy))
            .await
            .map_err(Error::Rpc)?
            .into_inner())
    }

    pub async fn add_split_tunnel_process(&mut self, pid: i32) -> Result<()> {
        self.0
            .add_split_tunnel_process(pid)
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn remove_split_tunnel_process(&mut self, pid: i32) -> Result<()> {
        self.0
            .remove_split_tunnel_process(pid)
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn clear_split_tunnel_processes(&mut self) -> Result<()> {
        self.0
            .clear_split_tunnel_processes(())
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn get_split_tunnel_processes(&mut self) -> Result<Vec<i32>> {
        use futures::TryStreamExt;

        let pids = self
            .0
            .get_split_tunnel_processes(())
            .await
            .map_err(Error::Rpc)?
            .into_inner();
        pids.try_collect().await.map_err(Error::Rpc)
    }

    pub async fn add_split_tunnel_app(&mut self, path: String) -> Result<()> {
        self.0.add_split_tunnel_app(path).await.map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn remove_split_tunnel_app(&mut self, path: String) -> Result<()> {
        self.0
            .remove_split_tunnel_app(path)
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn clear_split_tunnel_apps(&mut self) -> Result<()> {
        self.0.clear_split_tunnel_apps(()).await.map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn set_split_tunnel_state(&mut self, enabled: bool) -> Result<()> {
        self.0
            .set_split_tunnel_state(enabled)
            .await
            .map_err(Error::Rpc)?;
        Ok(())
    }

    pub async fn get_excluded_processes(&mut self) -> Result<Vec<ExcludedProcess>> {
        let processes = self
            .0
            .get_excluded_processes(())
            .await
            .map_err(Error::Rpc)?
            .into_inner();
        Ok(processes
            .processes
            .into_iter()
            .map(ExcludedProcess::from)
            .collect())
    }
}

fn map_device_error(status: Status) -> Error {
    match status.code() {
        Code::ResourceExhausted => Error::TooManyDevices,
        Code::Unauthenticated => Error::InvalidAccount,
        Code::AlreadyExists => Error::AlreadyLoggedIn,
        Code::NotFound => Error::DeviceNotFound,
        _other => Error::Rpc(status),
    }
}

fn map_location_error(status: Status) -> Error {
    match status.code() {
        Code::NotFound => Error::NoLocationData,
        _other => Error::Rpc(status),
    }
}
