// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::{fs, net::SocketAddr, path::PathBuf};

use futures::{stream::BoxStream, StreamExt};
use tokio::sync::{broadcast, mpsc::UnboundedSender};
use tonic::{Request, Response, Status};
use tracing::{error, info};

use mullvad_vpn_proto::{management_service_server::ManagementService, conversions};
use mullvad_vpn_types::{
    access_method,
    app_upgrade::AppUpgradeEvent,
    custom_list,
    net::proxy::CustomProxy,
    relay_constraints::{
        BridgeSettings, ObfuscationSettings, RelayOverride, RelaySettings,
    },
    settings::DnsOptions,
    wireguard::{DaitaSettings, RotationInterval},
};

use super::{
    connection_handler::CommandInterfaceConnectionHandler,
    protobuf::{daemon_event, log_entry, map_account_error, map_daemon_error},
};
use crate::{
    logging::LogMessage,
    service::{DaemonCommand, DaemonEvent},
};

pub(crate) enum ListenerType {
    Path(PathBuf),
    Uri(#[allow(unused)] SocketAddr),
}

pub(crate) struct CommandInterface {
    // Events broadcast by the daemon service
    daemon_events_rx: broadcast::Receiver<DaemonEvent>,

    // Log lines captured by the tracing layer
    log_rx: broadcast::Receiver<LogMessage>,

    // Progress of any running in-app upgrade
    upgrade_events_rx: broadcast::Receiver<AppUpgradeEvent>,

    handler: CommandInterfaceConnectionHandler,

    listener: ListenerType,
}

impl CommandInterface {
    pub(crate) fn new(
        daemon_events_rx: broadcast::Receiver<DaemonEvent>,
        log_rx: broadcast::Receiver<LogMessage>,
        upgrade_events_rx: broadcast::Receiver<AppUpgradeEvent>,
        daemon_tx: UnboundedSender<DaemonCommand>,
        listener: ListenerType,
    ) -> Self {
        Self {
            daemon_events_rx,
            log_rx,
            upgrade_events_rx,
            handler: CommandInterfaceConnectionHandler::new(daemon_tx),
            listener,
        }
    }

    pub(super) fn remove_previous_socket_file(&self) {
        if let ListenerType::Path(ref socket_path) = self.listener {
            match fs::remove_file(socket_path) {
                Ok(_) => info!(
                    "Removed previous management interface socket: {}",
                    socket_path.display()
                ),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    error!("Failed to remove previous management interface socket: {err}");
                }
            }
        }
    }
}

impl Drop for CommandInterface {
    fn drop(&mut self) {
        self.remove_previous_socket_file();
    }
}

fn invalid_argument(error: conversions::ConversionError) -> Status {
    Status::invalid_argument(error.to_string())
}

fn broadcast_stream<T, U>(
    rx: broadcast::Receiver<T>,
    convert: impl Fn(T) -> U + Send + 'static,
) -> BoxStream<'static, Result<U, Status>>
where
    T: Clone + Send + 'static,
    U: Send + 'static,
{
    Box::pin(
        tokio_stream::wrappers::BroadcastStream::new(rx).map(move |item| {
            item.map(&convert).map_err(|err| {
                error!("Event subscriber lagged behind: {err}");
                Status::internal("event stream lagged behind")
            })
        }),
    )
}

#[tonic::async_trait]
impl ManagementService for CommandInterface {
    // Tunnel control

    async fn connect_tunnel(&self, _: Request<()>) -> Result<Response<bool>, Status> {
        info!("Got connect request");
        let connected = self.handler.send(DaemonCommand::Connect).await?;
        Ok(Response::new(connected))
    }

    async fn disconnect_tunnel(&self, _: Request<()>) -> Result<Response<bool>, Status> {
        info!("Got disconnect request");
        let disconnected = self.handler.send(DaemonCommand::Disconnect).await?;
        Ok(Response::new(disconnected))
    }

    async fn reconnect_tunnel(&self, _: Request<()>) -> Result<Response<bool>, Status> {
        info!("Got reconnect request");
        let reconnected = self.handler.send(DaemonCommand::Reconnect).await?;
        Ok(Response::new(reconnected))
    }

    async fn get_tunnel_state(
        &self,
        _: Request<()>,
    ) -> Result<Response<mullvad_vpn_proto::TunnelState>, Status> {
        let state = self.handler.send(DaemonCommand::GetTunnelState).await?;
        Ok(Response::new(mullvad_vpn_proto::TunnelState::from(state)))
    }

    // Event and log streams

    type EventsListenStream = BoxStream<'static, Result<mullvad_vpn_proto::DaemonEvent, Status>>;

    async fn events_listen(
        &self,
        _: Request<()>,
    ) -> Result<Response<Self::EventsListenStream>, Status> {
        info!("Got daemon event stream request");
        Ok(Response::new(broadcast_stream(
            self.daemon_events_rx.resubscribe(),
            daemon_event,
        )))
    }

    type LogListenStream = BoxStream<'static, Result<mullvad_vpn_proto::LogEntry, Status>>;

    async fn log_listen(&self, _: Request<()>) -> Result<Response<Self::LogListenStream>, Status> {
        info!("Got log stream request");
        Ok(Response::new(broadcast_stream(
            self.log_rx.resubscribe(),
            log_entry,
        )))
    }

    // Daemon and app lifecycle

    async fn prepare_restart(&self, _: Request<()>) -> Result<Response<()>, Status> {
        info!("Got prepare restart request");
        self.handler.send(DaemonCommand::PrepareRestart).await?;
        Ok(Response::new(()))
    }

    async fn factory_reset(&self, _: Request<()>) -> Result<Response<()>, Status> {
        info!("Got factory reset request");
        self.handler
            .send(DaemonCommand::FactoryReset)
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn get_current_version(&self, _: Request<()>) -> Result<Response<String>, Status> {
        let version = self.handler.send(DaemonCommand::GetCurrentVersion).await?;
        Ok(Response::new(version))
    }

    async fn get_version_info(
        &self,
        _: Request<()>,
    ) -> Result<Response<mullvad_vpn_proto::AppVersionInfo>, Status> {
        let info = self.handler.send(DaemonCommand::GetVersionInfo).await?;
        Ok(Response::new(mullvad_vpn_proto::AppVersionInfo::from(info)))
    }

    async fn is_performing_post_upgrade(&self, _: Request<()>) -> Result<Response<bool>, Status> {
        let performing = self
            .handler
            .send(DaemonCommand::IsPerformingPostUpgrade)
            .await?;
        Ok(Response::new(performing))
    }

    async fn check_volumes(&self, _: Request<()>) -> Result<Response<()>, Status> {
        self.handler.send(DaemonCommand::CheckVolumes).await?;
        Ok(Response::new(()))
    }

    // In-app upgrades

    async fn app_upgrade(&self, _: Request<()>) -> Result<Response<()>, Status> {
        info!("Got app upgrade request");
        self.handler
            .send(DaemonCommand::AppUpgrade)
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn app_upgrade_abort(&self, _: Request<()>) -> Result<Response<()>, Status> {
        info!("Got app upgrade abort request");
        self.handler
            .send(DaemonCommand::AppUpgradeAbort)
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    type AppUpgradeEventsListenStream =
        BoxStream<'static, Result<mullvad_vpn_proto::AppUpgradeEvent, Status>>;

    async fn app_upgrade_events_listen(
        &self,
        _: Request<()>,
    ) -> Result<Response<Self::AppUpgradeEventsListenStream>, Status> {
        info!("Got app upgrade event stream request");
        Ok(Response::new(broadcast_stream(
            self.upgrade_events_rx.resubscribe(),
            mullvad_vpn_proto::AppUpgradeEvent::from,
        )))
    }

    // Relay lists and locations

    async fn update_relay_locations(&self, _: Request<()>) -> Result<Response<()>, Status> {
        self.handler.send(DaemonCommand::UpdateRelayLocations).await?;
        Ok(Response::new(()))
    }

    async fn get_relay_locations(
        &self,
        _: Request<()>,
    ) -> Result<Response<mullvad_vpn_proto::RelayList>, Status> {
        let list = self.handler.send(DaemonCommand::GetRelayLocations).await?;
        Ok(Response::new(mullvad_vpn_proto::RelayList::from(list)))
    }

    async fn get_current_location(
        &self,
        _: Request<()>,
    ) -> Result<Response<mullvad_vpn_proto::GeoIpLocation>, Status> {
        let location = self
            .handler
            .send(DaemonCommand::GetCurrentLocation)
            .await?
            .ok_or_else(|| Status::not_found("no location is known"))?;
        Ok(Response::new(mullvad_vpn_proto::GeoIpLocation::from(
            location,
        )))
    }

    // Settings

    async fn get_settings(
        &self,
        _: Request<()>,
    ) -> Result<Response<mullvad_vpn_proto::Settings>, Status> {
        let settings = self.handler.send(DaemonCommand::GetSettings).await?;
        Ok(Response::new(mullvad_vpn_proto::Settings::from(&settings)))
    }

    async fn reset_settings(&self, _: Request<()>) -> Result<Response<()>, Status> {
        info!("Got reset settings request");
        self.handler
            .send(DaemonCommand::ResetSettings)
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn set_relay_settings(
        &self,
        request: Request<mullvad_vpn_proto::RelaySettings>,
    ) -> Result<Response<()>, Status> {
        let settings =
            RelaySettings::try_from(request.into_inner()).map_err(invalid_argument)?;
        self.handler
            .send(|tx| DaemonCommand::SetRelaySettings(tx, settings))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn set_allow_lan(&self, request: Request<bool>) -> Result<Response<()>, Status> {
        let allow_lan = request.into_inner();
        info!("Got set allow lan request: {allow_lan}");
        self.handler
            .send(|tx| DaemonCommand::SetAllowLan(tx, allow_lan))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn set_show_beta_releases(&self, request: Request<bool>) -> Result<Response<()>, Status> {
        let show = request.into_inner();
        self.handler
            .send(|tx| DaemonCommand::SetShowBetaReleases(tx, show))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn set_block_when_disconnected(
        &self,
        request: Request<bool>,
    ) -> Result<Response<()>, Status> {
        let block = request.into_inner();
        info!("Got set block when disconnected request: {block}");
        self.handler
            .send(|tx| DaemonCommand::SetBlockWhenDisconnected(tx, block))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn set_auto_connect(&self, request: Request<bool>) -> Result<Response<()>, Status> {
        let auto_connect = request.into_inner();
        self.handler
            .send(|tx| DaemonCommand::SetAutoConnect(tx, auto_connect))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn set_openvpn_mssfix(&self, request: Request<u32>) -> Result<Response<()>, Status> {
        let mssfix = request.into_inner();
        let mssfix = if mssfix != 0 {
            Some(
                u16::try_from(mssfix)
                    .map_err(|_| Status::invalid_argument("mssfix is out of range"))?,
            )
        } else {
            None
        };
        self.handler
            .send(|tx| DaemonCommand::SetOpenvpnMssfix(tx, mssfix))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn set_wireguard_mtu(&self, request: Request<u32>) -> Result<Response<()>, Status> {
        let mtu = request.into_inner();
        let mtu = if mtu != 0 {
            Some(
                u16::try_from(mtu).map_err(|_| Status::invalid_argument("mtu is out of range"))?,
            )
        } else {
            None
        };
        self.handler
            .send(|tx| DaemonCommand::SetWireguardMtu(tx, mtu))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn set_enable_ipv6(&self, request: Request<bool>) -> Result<Response<()>, Status> {
        let enable = request.into_inner();
        self.handler
            .send(|tx| DaemonCommand::SetEnableIpv6(tx, enable))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn set_quantum_resistant_tunnel(
        &self,
        request: Request<mullvad_vpn_proto::QuantumResistantState>,
    ) -> Result<Response<()>, Status> {
        let state = conversions::from_proto::settings::try_quantum_resistant_state(
            request.into_inner(),
        )
        .map_err(invalid_argument)?;
        self.handler
            .send(|tx| DaemonCommand::SetQuantumResistantTunnel(tx, state))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn set_enable_daita(&self, request: Request<bool>) -> Result<Response<()>, Status> {
        let enabled = request.into_inner();
        self.handler
            .send(|tx| DaemonCommand::SetEnableDaita(tx, enabled))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn set_daita_settings(
        &self,
        request: Request<mullvad_vpn_proto::DaitaSettings>,
    ) -> Result<Response<()>, Status> {
        let settings = DaitaSettings::from(request.into_inner());
        self.handler
            .send(|tx| DaemonCommand::SetDaitaSettings(tx, settings))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn set_dns_options(
        &self,
        request: Request<mullvad_vpn_proto::DnsOptions>,
    ) -> Result<Response<()>, Status> {
        let options = DnsOptions::try_from(request.into_inner()).map_err(invalid_argument)?;
        self.handler
            .send(|tx| DaemonCommand::SetDnsOptions(tx, options))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn set_obfuscation_settings(
        &self,
        request: Request<mullvad_vpn_proto::ObfuscationSettings>,
    ) -> Result<Response<()>, Status> {
        let settings =
            ObfuscationSettings::try_from(request.into_inner()).map_err(invalid_argument)?;
        self.handler
            .send(|tx| DaemonCommand::SetObfuscationSettings(tx, settings))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn set_bridge_settings(
        &self,
        request: Request<mullvad_vpn_proto::BridgeSettings>,
    ) -> Result<Response<()>, Status> {
        let settings =
            BridgeSettings::try_from(request.into_inner()).map_err(invalid_argument)?;
        self.handler
            .send(|tx| DaemonCommand::SetBridgeSettings(tx, settings))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn set_bridge_state(
        &self,
        request: Request<mullvad_vpn_proto::BridgeState>,
    ) -> Result<Response<()>, Status> {
        let state = conversions::from_proto::settings::try_bridge_state_from_i32(
            request.into_inner().state,
        )
        .map_err(invalid_argument)?;
        self.handler
            .send(|tx| DaemonCommand::SetBridgeState(tx, state))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn set_relay_override(
        &self,
        request: Request<mullvad_vpn_proto::RelayOverride>,
    ) -> Result<Response<()>, Status> {
        let relay_override =
            RelayOverride::try_from(request.into_inner()).map_err(invalid_argument)?;
        self.handler
            .send(|tx| DaemonCommand::SetRelayOverride(tx, relay_override))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn clear_all_relay_overrides(&self, _: Request<()>) -> Result<Response<()>, Status> {
        self.handler
            .send(DaemonCommand::ClearAllRelayOverrides)
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn apply_json_settings(&self, request: Request<String>) -> Result<Response<()>, Status> {
        self.handler
            .send(|tx| DaemonCommand::ApplyJsonSettings(tx, request.into_inner()))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn export_json_settings(&self, _: Request<()>) -> Result<Response<String>, Status> {
        let blob = self
            .handler
            .send(DaemonCommand::ExportJsonSettings)
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(blob))
    }

    // Accounts

    async fn create_new_account(&self, _: Request<()>) -> Result<Response<String>, Status> {
        info!("Got create new account request");
        let number = self
            .handler
            .send(DaemonCommand::CreateNewAccount)
            .await?
            .map_err(map_account_error)?;
        Ok(Response::new(number))
    }

    async fn login_account(&self, request: Request<String>) -> Result<Response<()>, Status> {
        info!("Got login request");
        self.handler
            .send(|tx| DaemonCommand::LoginAccount(tx, request.into_inner()))
            .await?
            .map_err(map_account_error)?;
        Ok(Response::new(()))
    }

    async fn logout_account(&self, _: Request<()>) -> Result<Response<()>, Status> {
        info!("Got logout request");
        self.handler
            .send(DaemonCommand::LogoutAccount)
            .await?
            .map_err(map_account_error)?;
        Ok(Response::new(()))
    }

    async fn get_account_data(
        &self,
        request: Request<String>,
    ) -> Result<Response<mullvad_vpn_proto::AccountData>, Status> {
        let data = self
            .handler
            .send(|tx| DaemonCommand::GetAccountData(tx, request.into_inner()))
            .await?
            .map_err(map_account_error)?;
        Ok(Response::new(mullvad_vpn_proto::AccountData::from(data)))
    }

    async fn get_account_history(
        &self,
        _: Request<()>,
    ) -> Result<Response<mullvad_vpn_proto::AccountHistory>, Status> {
        let number = self.handler.send(DaemonCommand::GetAccountHistory).await?;
        Ok(Response::new(mullvad_vpn_proto::AccountHistory { number }))
    }

    async fn clear_account_history(&self, _: Request<()>) -> Result<Response<()>, Status> {
        self.handler
            .send(DaemonCommand::ClearAccountHistory)
            .await?
            .map_err(map_account_error)?;
        Ok(Response::new(()))
    }

    async fn get_www_auth_token(&self, _: Request<()>) -> Result<Response<String>, Status> {
        let token = self
            .handler
            .send(DaemonCommand::GetWwwAuthToken)
            .await?
            .map_err(map_account_error)?;
        Ok(Response::new(token))
    }

    async fn submit_voucher(
        &self,
        request: Request<String>,
    ) -> Result<Response<mullvad_vpn_proto::VoucherSubmission>, Status> {
        let submission = self
            .handler
            .send(|tx| DaemonCommand::SubmitVoucher(tx, request.into_inner()))
            .await?
            .map_err(map_account_error)?;
        Ok(Response::new(mullvad_vpn_proto::VoucherSubmission::from(
            submission,
        )))
    }

    // Devices

    async fn get_device(
        &self,
        _: Request<()>,
    ) -> Result<Response<mullvad_vpn_proto::DeviceState>, Status> {
        let state = self.handler.send(DaemonCommand::GetDevice).await?;
        Ok(Response::new(mullvad_vpn_proto::DeviceState::from(state)))
    }

    async fn update_device(&self, _: Request<()>) -> Result<Response<()>, Status> {
        self.handler
            .send(DaemonCommand::UpdateDevice)
            .await?
            .map_err(map_account_error)?;
        Ok(Response::new(()))
    }

    async fn list_devices(
        &self,
        request: Request<String>,
    ) -> Result<Response<mullvad_vpn_proto::DeviceList>, Status> {
        let devices = self
            .handler
            .send(|tx| DaemonCommand::ListDevices(tx, request.into_inner()))
            .await?
            .map_err(map_account_error)?;
        Ok(Response::new(mullvad_vpn_proto::DeviceList {
            devices: devices
                .into_iter()
                .map(mullvad_vpn_proto::Device::from)
                .collect(),
        }))
    }

    async fn remove_device(
        &self,
        request: Request<mullvad_vpn_proto::DeviceRemoval>,
    ) -> Result<Response<()>, Status> {
        let removal = request.into_inner();
        info!("Got remove device request");
        self.handler
            .send(|tx| DaemonCommand::RemoveDevice(tx, removal.account_number, removal.device_id))
            .await?
            .map_err(map_account_error)?;
        Ok(Response::new(()))
    }

    // WireGuard keys

    async fn set_wireguard_rotation_interval(
        &self,
        request: Request<prost_types::Duration>,
    ) -> Result<Response<()>, Status> {
        let interval = std::time::Duration::try_from(request.into_inner())
            .map_err(|_| Status::invalid_argument("invalid rotation interval"))
            .and_then(|duration| {
                RotationInterval::try_from(duration)
                    .map_err(|err| Status::invalid_argument(err.to_string()))
            })?;
        self.handler
            .send(|tx| DaemonCommand::SetWireguardRotationInterval(tx, Some(interval)))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn reset_wireguard_rotation_interval(
        &self,
        _: Request<()>,
    ) -> Result<Response<()>, Status> {
        self.handler
            .send(|tx| DaemonCommand::SetWireguardRotationInterval(tx, None))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn rotate_wireguard_key(&self, _: Request<()>) -> Result<Response<()>, Status> {
        info!("Got rotate wireguard key request");
        self.handler
            .send(DaemonCommand::RotateWireguardKey)
            .await?
            .map_err(map_account_error)?;
        Ok(Response::new(()))
    }

    async fn get_wireguard_key(
        &self,
        _: Request<()>,
    ) -> Result<Response<mullvad_vpn_proto::PublicKey>, Status> {
        let key = self
            .handler
            .send(DaemonCommand::GetWireguardKey)
            .await?
            .map_err(map_account_error)?;
        Ok(Response::new(mullvad_vpn_proto::PublicKey::from(key)))
    }

    // Custom relay lists

    async fn create_custom_list(
        &self,
        request: Request<String>,
    ) -> Result<Response<String>, Status> {
        let id = self
            .handler
            .send(|tx| DaemonCommand::CreateCustomList(tx, request.into_inner()))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(id.to_string()))
    }

    async fn delete_custom_list(&self, request: Request<String>) -> Result<Response<()>, Status> {
        let id: custom_list::Id = request
            .into_inner()
            .parse()
            .map_err(|_| Status::invalid_argument("invalid custom list id"))?;
        self.handler
            .send(|tx| DaemonCommand::DeleteCustomList(tx, id))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn update_custom_list(
        &self,
        request: Request<mullvad_vpn_proto::CustomList>,
    ) -> Result<Response<()>, Status> {
        let list =
            custom_list::CustomList::try_from(request.into_inner()).map_err(invalid_argument)?;
        self.handler
            .send(|tx| DaemonCommand::UpdateCustomList(tx, list))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn clear_custom_lists(&self, _: Request<()>) -> Result<Response<()>, Status> {
        self.handler
            .send(DaemonCommand::ClearCustomLists)
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    // API access methods

    async fn add_api_access_method(
        &self,
        request: Request<mullvad_vpn_proto::NewAccessMethodSetting>,
    ) -> Result<Response<mullvad_vpn_proto::Uuid>, Status> {
        let setting = request.into_inner();
        let method = access_method::AccessMethod::try_from(
            setting
                .access_method
                .ok_or_else(|| Status::invalid_argument("missing access method"))?,
        )
        .map_err(invalid_argument)?;
        let id = self
            .handler
            .send(|tx| {
                DaemonCommand::AddApiAccessMethod(tx, setting.name, setting.enabled, method)
            })
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(mullvad_vpn_proto::Uuid::from(id)))
    }

    async fn remove_api_access_method(
        &self,
        request: Request<mullvad_vpn_proto::Uuid>,
    ) -> Result<Response<()>, Status> {
        let id =
            access_method::Id::try_from(request.into_inner()).map_err(invalid_argument)?;
        self.handler
            .send(|tx| DaemonCommand::RemoveApiAccessMethod(tx, id))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn update_api_access_method(
        &self,
        request: Request<mullvad_vpn_proto::AccessMethodSetting>,
    ) -> Result<Response<()>, Status> {
        let setting = access_method::AccessMethodSetting::try_from(request.into_inner())
            .map_err(invalid_argument)?;
        self.handler
            .send(|tx| DaemonCommand::UpdateApiAccessMethod(tx, setting))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn set_api_access_method(
        &self,
        request: Request<mullvad_vpn_proto::Uuid>,
    ) -> Result<Response<()>, Status> {
        let id =
            access_method::Id::try_from(request.into_inner()).map_err(invalid_argument)?;
        self.handler
            .send(|tx| DaemonCommand::SetApiAccessMethod(tx, id))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn get_current_api_access_method(
        &self,
        _: Request<()>,
    ) -> Result<Response<mullvad_vpn_proto::AccessMethodSetting>, Status> {
        let setting = self
            .handler
            .send(DaemonCommand::GetCurrentApiAccessMethod)
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(mullvad_vpn_proto::AccessMethodSetting::from(
            setting,
        )))
    }

    async fn clear_custom_api_access_methods(
        &self,
        _: Request<()>,
    ) -> Result<Response<()>, Status> {
        self.handler
            .send(DaemonCommand::ClearCustomApiAccessMethods)
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn test_api_access_method_by_id(
        &self,
        request: Request<mullvad_vpn_proto::Uuid>,
    ) -> Result<Response<bool>, Status> {
        let id =
            access_method::Id::try_from(request.into_inner()).map_err(invalid_argument)?;
        let reachable = self
            .handler
            .send(|tx| DaemonCommand::TestApiAccessMethodById(tx, id))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(reachable))
    }

    async fn test_custom_api_access_method(
        &self,
        request: Request<mullvad_vpn_proto::CustomProxy>,
    ) -> Result<Response<bool>, Status> {
        let proxy = CustomProxy::try_from(request.into_inner()).map_err(invalid_argument)?;
        let reachable = self
            .handler
            .send(|tx| DaemonCommand::TestCustomApiAccessMethod(tx, proxy))
            .await?;
        Ok(Response::new(reachable))
    }

    // Split tunneling

    async fn add_split_tunnel_process(&self, request: Request<i32>) -> Result<Response<()>, Status> {
        let pid = request.into_inner();
        self.handler
            .send(|tx| DaemonCommand::AddSplitTunnelProcess(tx, pid))
            .await?;
        Ok(Response::new(()))
    }

    async fn remove_split_tunnel_process(
        &self,
        request: Request<i32>,
    ) -> Result<Response<()>, Status> {
        let pid = request.into_inner();
        self.handler
            .send(|tx| DaemonCommand::RemoveSplitTunnelProcess(tx, pid))
            .await?;
        Ok(Response::new(()))
    }

    async fn clear_split_tunnel_processes(&self, _: Request<()>) -> Result<Response<()>, Status> {
        self.handler
            .send(DaemonCommand::ClearSplitTunnelProcesses)
            .await?;
        Ok(Response::new(()))
    }

    type GetSplitTunnelProcessesStream = BoxStream<'static, Result<i32, Status>>;

    async fn get_split_tunnel_processes(
        &self,
        _: Request<()>,
    ) -> Result<Response<Self::GetSplitTunnelProcessesStream>, Status> {
        let pids = self
            .handler
            .send(DaemonCommand::GetSplitTunnelProcesses)
            .await?;
        let stream = tokio_stream::iter(pids.into_iter().map(Ok));
        Ok(Response::new(Box::pin(stream)))
    }

    async fn add_split_tunnel_app(&self, request: Request<String>) -> Result<Response<()>, Status> {
        let app = PathBuf::from(request.into_inner());
        self.handler
            .send(|tx| DaemonCommand::AddSplitTunnelApp(tx, app))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn remove_split_tunnel_app(
        &self,
        request: Request<String>,
    ) -> Result<Response<()>, Status> {
        let app = PathBuf::from(request.into_inner());
        self.handler
            .send(|tx| DaemonCommand::RemoveSplitTunnelApp(tx, app))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn clear_split_tunnel_apps(&self, _: Request<()>) -> Result<Response<()>, Status> {
        self.handler
            .send(DaemonCommand::ClearSplitTunnelApps)
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn set_split_tunnel_state(&self, request: Request<bool>) -> Result<Response<()>, Status> {
        let enabled = request.into_inner();
        self.handler
            .send(|tx| DaemonCommand::SetSplitTunnelState(tx, enabled))
            .await?
            .map_err(map_daemon_error)?;
        Ok(Response::new(()))
    }

    async fn get_excluded_processes(
        &self,
        _: Request<()>,
    ) -> Result<Response<mullvad_vpn_proto::ExcludedProcessList>, Status> {
        let processes = self
            .handler
            .send(DaemonCommand::GetExcludedProcesses)
            .await?;
        Ok(Response::new(mullvad_vpn_proto::ExcludedProcessList {
            processes: processes
                .into_iter()
                .map(mullvad_vpn_proto::ExcludedProcess::from)
                .collect(),
        }))
    }
}
