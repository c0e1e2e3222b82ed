// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

//! The daemon service task. Owns all daemon state and processes commands
//! arriving from the management interface one at a time.

use std::path::PathBuf;

use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use mullvad_vpn_types::{
    access_method,
    account::{AccountData, AccountNumber, VoucherSubmission},
    app_upgrade::AppUpgradeEvent,
    custom_list::{self, CustomList},
    device::{Device, DeviceEvent, DeviceId, DeviceState},
    location::GeoIpLocation,
    net::{proxy::CustomProxy, Endpoint, TransportProtocol, TunnelEndpoint},
    relay_constraints::{
        BridgeSettings, BridgeState, ObfuscationSettings, RelayOverride, RelaySettings,
    },
    relay_list::RelayList,
    settings::{DnsOptions, Settings},
    split_tunnel::ExcludedProcess,
    states::{ActionAfterDisconnect, ErrorState, ErrorStateCause, TargetState, TunnelState},
    version::AppVersionInfo,
    wireguard::{DaitaSettings, QuantumResistantState, RotationInterval},
};

use super::{
    account::{AccountError, AccountManager},
    app_upgrade::AppUpgradeTask,
    config,
    error::{Error, Result},
    relay_selector,
    settings::SettingsPersister,
    version_check::{VersionChecker, CURRENT_VERSION},
};

const PROXY_TEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Notifications fanned out to every `EventsListen` subscriber.
#[derive(Debug, Clone)]
pub enum DaemonEvent {
    TunnelState(TunnelState),
    Settings(Settings),
    RelayList(RelayList),
    VersionInfo(AppVersionInfo),
    Device(DeviceEvent),
    RemoveDevice(mullvad_vpn_types::device::RemoveDeviceEvent),
}

pub enum DaemonCommand {
    Connect(oneshot::Sender<bool>),
    Disconnect(oneshot::Sender<bool>),
    Reconnect(oneshot::Sender<bool>),
    GetTunnelState(oneshot::Sender<TunnelState>),

    GetSettings(oneshot::Sender<Settings>),
    ResetSettings(oneshot::Sender<Result<()>>),
    SetRelaySettings(oneshot::Sender<Result<()>>, RelaySettings),
    SetAllowLan(oneshot::Sender<Result<()>>, bool),
    SetShowBetaReleases(oneshot::Sender<Result<()>>, bool),
    SetBlockWhenDisconnected(oneshot::Sender<Result<()>>, bool),
    SetAutoConnect(oneshot::Sender<Result<()>>, bool),
    SetOpenvpnMssfix(oneshot::Sender<Result<()>>, Option<u16>),
    SetWireguardMtu(oneshot::Sender<Result<()>>, Option<u16>),
    SetEnableIpv6(oneshot::Sender<Result<()>>, bool),
    SetQuantumResistantTunnel(oneshot::Sender<Result<()>>, QuantumResistantState),
    SetEnableDaita(oneshot::Sender<Result<()>>, bool),
    SetDaitaSettings(oneshot::Sender<Result<()>>, DaitaSettings),
    SetDnsOptions(oneshot::Sender<Result<()>>, DnsOptions),
    SetObfuscationSettings(oneshot::Sender<Result<()>>, ObfuscationSettings),
    SetBridgeSettings(oneshot::Sender<Result<()>>, BridgeSettings),
    SetBridgeState(oneshot::Sender<Result<()>>, BridgeState),
    SetRelayOverride(oneshot::Sender<Result<()>>, RelayOverride),
    ClearAllRelayOverrides(oneshot::Sender<Result<()>>),
    SetWireguardRotationInterval(oneshot::Sender<Result<()>>, Option<RotationInterval>),
    ApplyJsonSettings(oneshot::Sender<Result<()>>, String),
    ExportJsonSettings(oneshot::Sender<Result<String>>),

    GetRelayLocations(oneshot::Sender<RelayList>),
    UpdateRelayLocations(oneshot::Sender<()>),
    GetCurrentLocation(oneshot::Sender<Option<GeoIpLocation>>),

    CreateNewAccount(oneshot::Sender<std::result::Result<AccountNumber, AccountError>>),
    LoginAccount(oneshot::Sender<std::result::Result<(), AccountError>>, AccountNumber),
    LogoutAccount(oneshot::Sender<std::result::Result<(), AccountError>>),
    GetAccountData(
        oneshot::Sender<std::result::Result<AccountData, AccountError>>,
        AccountNumber,
    ),
    GetAccountHistory(oneshot::Sender<Option<AccountNumber>>),
    ClearAccountHistory(oneshot::Sender<std::result::Result<(), AccountError>>),
    GetWwwAuthToken(oneshot::Sender<std::result::Result<String, AccountError>>),
    SubmitVoucher(
        oneshot::Sender<std::result::Result<VoucherSubmission, AccountError>>,
        String,
    ),

    GetDevice(oneshot::Sender<DeviceState>),
    UpdateDevice(oneshot::Sender<std::result::Result<(), AccountError>>),
    ListDevices(
        oneshot::Sender<std::result::Result<Vec<Device>, AccountError>>,
        AccountNumber,
    ),
    RemoveDevice(
        oneshot::Sender<std::result::Result<(), AccountError>>,
        AccountNumber,
        DeviceId,
    ),
    RotateWireguardKey(oneshot::Sender<std::result::Result<(), AccountError>>),
    GetWireguardKey(
        oneshot::Sender<std::result::Result<mullvad_vpn_types::wireguard::PublicKey, AccountError>>,
    ),

    CreateCustomList(oneshot::Sender<Result<custom_list::Id>>, String),
    DeleteCustomList(oneshot::Sender<Result<()>>, custom_list::Id),
    UpdateCustomList(oneshot::Sender<Result<()>>, CustomList),
    ClearCustomLists(oneshot::Sender<Result<()>>),

    AddApiAccessMethod(
        oneshot::Sender<Result<access_method::Id>>,
        String,
        bool,
        access_method::AccessMethod,
    ),
    RemoveApiAccessMethod(oneshot::Sender<Result<()>>, access_method::Id),
    UpdateApiAccessMethod(oneshot::Sender<Result<()>>, access_method::AccessMethodSetting),
    SetApiAccessMethod(oneshot::Sender<Result<()>>, access_method::Id),
    GetCurrentApiAccessMethod(oneshot::Sender<Result<access_method::AccessMethodSetting>>),
    ClearCustomApiAccessMethods(oneshot::Sender<Result<()>>),
    TestApiAccessMethodById(oneshot::Sender<Result<bool>>, access_method::Id),
    TestCustomApiAccessMethod(oneshot::Sender<bool>, CustomProxy),

    AddSplitTunnelProcess(oneshot::Sender<()>, i32),
    RemoveSplitTunnelProcess(oneshot::Sender<()>, i32),
    ClearSplitTunnelProcesses(oneshot::Sender<()>),
    GetSplitTunnelProcesses(oneshot::Sender<Vec<i32>>),
    AddSplitTunnelApp(oneshot::Sender<Result<()>>, PathBuf),
    RemoveSplitTunnelApp(oneshot::Sender<Result<()>>, PathBuf),
    ClearSplitTunnelApps(oneshot::Sender<Result<()>>),
    SetSplitTunnelState(oneshot::Sender<Result<()>>, bool),
    GetExcludedProcesses(oneshot::Sender<Vec<ExcludedProcess>>),

    GetVersionInfo(oneshot::Sender<AppVersionInfo>),
    GetCurrentVersion(oneshot::Sender<String>),
    IsPerformingPostUpgrade(oneshot::Sender<bool>),
    AppUpgrade(oneshot::Sender<Result<()>>),
    AppUpgradeAbort(oneshot::Sender<Result<()>>),

    FactoryReset(oneshot::Sender<Result<()>>),
    PrepareRestart(oneshot::Sender<()>),
    CheckVolumes(oneshot::Sender<()>),
}

pub struct Daemon {
    command_rx: mpsc::UnboundedReceiver<DaemonCommand>,
    event_tx: broadcast::Sender<DaemonEvent>,
    upgrade_event_tx: broadcast::Sender<AppUpgradeEvent>,
    upgrade_event_rx: broadcast::Receiver<AppUpgradeEvent>,

    settings: SettingsPersister,
    account: AccountManager,
    relay_list: RelayList,
    relay_list_path: PathBuf,
    version_checker: VersionChecker,

    tunnel_state: TunnelState,
    target_state: TargetState,
    excluded_pids: Vec<i32>,
    current_access_method: Option<access_method::Id>,
    upgrade_task: Option<AppUpgradeTask>,

    data_dir: PathBuf,
    shutdown_token: CancellationToken,
}

impl Daemon {
    pub fn spawn(
        event_tx: broadcast::Sender<DaemonEvent>,
        command_rx: mpsc::UnboundedReceiver<DaemonCommand>,
        upgrade_event_tx: broadcast::Sender<AppUpgradeEvent>,
        shutdown_token: CancellationToken,
    ) -> JoinHandle<()> {
        tracing::info!("Starting daemon service");
        tokio::spawn(async move {
            match Daemon::new(event_tx, command_rx, upgrade_event_tx, shutdown_token) {
                Ok(daemon) => daemon.run().await,
                Err(error) => {
                    tracing::error!("Failed to initialize the daemon service: {error}");
                }
            }
        })
    }

    fn new(
        event_tx: broadcast::Sender<DaemonEvent>,
        command_rx: mpsc::UnboundedReceiver<DaemonCommand>,
        upgrade_event_tx: broadcast::Sender<AppUpgradeEvent>,
        shutdown_token: CancellationToken,
    ) -> Result<Self> {
        let data_dir = config::data_dir();
        config::create_data_dir(&data_dir).map_err(Error::ConfigSetup)?;
        let config_dir = config::config_dir();

        let settings = SettingsPersister::load(config_dir.join(config::DEFAULT_SETTINGS_FILE));
        let account = AccountManager::load(data_dir.join(config::DEFAULT_ACCOUNT_FILE));
        let relay_list_path = data_dir.join(config::DEFAULT_RELAY_LIST_FILE);
        let relay_list = load_relay_list(&relay_list_path);
        let version_checker =
            VersionChecker::load(super::version_check::default_cache_path(&data_dir));

        let locked_down = settings.settings().block_when_disconnected;
        let current_access_method = settings
            .settings()
            .api_access_methods
            .access_method_settings
            .first()
            .map(|setting| setting.id);

        Ok(Self {
            command_rx,
            event_tx,
            upgrade_event_rx: upgrade_event_tx.subscribe(),
            upgrade_event_tx,
            settings,
            account,
            relay_list,
            relay_list_path,
            version_checker,
            tunnel_state: TunnelState::Disconnected {
                location: None,
                locked_down,
            },
            target_state: TargetState::Unsecured,
            excluded_pids: Vec::new(),
            current_access_method,
            upgrade_task: None,
            data_dir,
            shutdown_token,
        })
    }

    async fn run(mut self) {
        if let Ok(url) = std::env::var("MULLVAD_VPND_VERSION_METADATA_URL") {
            match self.version_checker.refresh(&url).await {
                Ok(()) => {
                    self.notify(DaemonEvent::VersionInfo(self.version_checker.version_info()));
                }
                Err(error) => {
                    tracing::warn!("Failed to refresh version metadata: {error}");
                }
            }
        }

        if self.settings.settings().auto_connect {
            tracing::info!("Auto-connecting on startup");
            self.connect();
        }

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => break,
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                event = self.upgrade_event_rx.recv() => {
                    if let Ok(AppUpgradeEvent::VerifiedInstaller { installer_path }) = event {
                        self.version_checker.set_verified_installer(installer_path);
                        self.notify(DaemonEvent::VersionInfo(self.version_checker.version_info()));
                    }
                }
            }
        }
        tracing::info!("Daemon service exiting");
    }

    async fn handle_command(&mut self, command: DaemonCommand) {
        use DaemonCommand::*;

        match command {
            Connect(tx) => reply(tx, self.connect()),
            Disconnect(tx) => reply(tx, self.disconnect()),
            Reconnect(tx) => reply(tx, self.reconnect()),
            GetTunnelState(tx) => reply(tx, self.tunnel_state.clone()),

            GetSettings(tx) => reply(tx, self.settings.settings().clone()),
            ResetSettings(tx) => {
                let result = self.settings.reset().map_err(Error::SettingsPersist);
                let outcome = result.map(|changed| {
                    if changed {
                        self.notify_settings();
                    }
                });
                reply(tx, outcome);
            }
            SetRelaySettings(tx, relay_settings) => reply(
                tx,
                self.update_settings(|settings| settings.relay_settings = relay_settings),
            ),
            SetAllowLan(tx, allow_lan) => reply(
                tx,
                self.update_settings(|settings| settings.allow_lan = allow_lan),
            ),
            SetShowBetaReleases(tx, show) => reply(
                tx,
                self.update_settings(|settings| settings.show_beta_releases = show),
            ),
            SetBlockWhenDisconnected(tx, block) => {
                let result = self.update_settings(|settings| {
                    settings.block_when_disconnected = block;
                });
                if result.is_ok() {
                    self.refresh_lockdown_state();
                }
                reply(tx, result);
            }
            SetAutoConnect(tx, auto_connect) => reply(
                tx,
                self.update_settings(|settings| settings.auto_connect = auto_connect),
            ),
            SetOpenvpnMssfix(tx, mssfix) => reply(
                tx,
                self.update_settings(|settings| settings.tunnel_options.openvpn.mssfix = mssfix),
            ),
            SetWireguardMtu(tx, mtu) => reply(
                tx,
                self.update_settings(|settings| settings.tunnel_options.wireguard.mtu = mtu),
            ),
            SetEnableIpv6(tx, enable) => reply(
                tx,
                self.update_settings(|settings| {
                    settings.tunnel_options.generic.enable_ipv6 = enable
                }),
            ),
            SetQuantumResistantTunnel(tx, state) => reply(
                tx,
                self.update_settings(|settings| {
                    settings.tunnel_options.wireguard.quantum_resistant = state
                }),
            ),
            SetEnableDaita(tx, enabled) => reply(
                tx,
                self.update_settings(|settings| {
                    settings.tunnel_options.wireguard.daita.enabled = enabled
                }),
            ),
            SetDaitaSettings(tx, daita) => reply(
                tx,
                self.update_settings(|settings| settings.tunnel_options.wireguard.daita = daita),
            ),
            SetDnsOptions(tx, options) => reply(
                tx,
                self.update_settings(|settings| settings.tunnel_options.dns_options = options),
            ),
            SetObfuscationSettings(tx, obfuscation) => reply(
                tx,
                self.update_settings(|settings| settings.obfuscation_settings = obfuscation),
            ),
            SetBridgeSettings(tx, bridge_settings) => reply(
                tx,
                self.update_settings(|settings| settings.bridge_settings = bridge_settings),
            ),
            SetBridgeState(tx, bridge_state) => reply(
                tx,
                self.update_settings(|settings| settings.bridge_state = bridge_state),
            ),
            SetRelayOverride(tx, relay_override) => reply(
                tx,
                self.update_settings(|settings| settings.set_relay_override(relay_override)),
            ),
            ClearAllRelayOverrides(tx) => reply(
                tx,
                self.update_settings(|settings| settings.relay_overrides.clear()),
            ),
            SetWireguardRotationInterval(tx, interval) => reply(
                tx,
                self.update_settings(|settings| {
                    settings.tunnel_options.wireguard.rotation_interval = interval
                }),
            ),
            ApplyJsonSettings(tx, blob) => reply(tx, self.apply_json_settings(&blob)),
            ExportJsonSettings(tx) => reply(
                tx,
                serde_json::to_string_pretty(self.settings.settings())
                    .map_err(|_| Error::InvalidSettingsPatch("settings are not serializable")),
            ),

            GetRelayLocations(tx) => reply(tx, self.relay_list.clone()),
            UpdateRelayLocations(tx) => {
                self.relay_list = load_relay_list(&self.relay_list_path);
                self.notify(DaemonEvent::RelayList(self.relay_list.clone()));
                reply(tx, ());
            }
            GetCurrentLocation(tx) => reply(tx, self.current_location()),

            CreateNewAccount(tx) => {
                let result = self.account.create_account().map(|(number, event)| {
                    self.notify(DaemonEvent::Device(event));
                    number
                });
                reply(tx, result);
            }
            LoginAccount(tx, account_number) => {
                let result = self.account.login(account_number).map(|event| {
                    self.notify(DaemonEvent::Device(event));
                });
                reply(tx, result);
            }
            LogoutAccount(tx) => {
                let result = self.account.logout().map(|event| {
                    self.notify(DaemonEvent::Device(event));
                });
                reply(tx, result);
            }
            GetAccountData(tx, account_number) => {
                reply(tx, self.account.account_data(&account_number));
            }
            GetAccountHistory(tx) => reply(tx, self.account.history()),
            ClearAccountHistory(tx) => reply(tx, self.account.clear_history()),
            GetWwwAuthToken(tx) => reply(tx, self.www_auth_token()),
            SubmitVoucher(tx, voucher) => reply(tx, self.account.submit_voucher(voucher)),

            GetDevice(tx) => reply(tx, self.account.device_state()),
            UpdateDevice(tx) => {
                let state = self.account.device_state();
                let result = match &state {
                    DeviceState::LoggedIn(_) => {
                        self.notify(DaemonEvent::Device(DeviceEvent {
                            cause: mullvad_vpn_types::device::DeviceEventCause::Updated,
                            new_state: state.clone(),
                        }));
                        Ok(())
                    }
                    _ => Err(AccountError::NotLoggedIn),
                };
                reply(tx, result);
            }
            ListDevices(tx, account_number) => reply(tx, self.account.list_devices(&account_number)),
            RemoveDevice(tx, account_number, device_id) => {
                let result = self
                    .account
                    .remove_device(&account_number, &device_id)
                    .map(|event| {
                        self.notify(DaemonEvent::RemoveDevice(event));
                    });
                reply(tx, result);
            }
            RotateWireguardKey(tx) => {
                let result = self.account.rotate_key().map(|event| {
                    self.notify(DaemonEvent::Device(event));
                });
                reply(tx, result);
            }
            GetWireguardKey(tx) => reply(tx, self.account.wireguard_key()),

            CreateCustomList(tx, name) => {
                let list = CustomList::new(name);
                let id = list.id;
                let result = self
                    .update_settings_fallible(|settings| {
                        settings.custom_lists.add(list).map_err(Error::CustomList)
                    })
                    .map(|_| id);
                reply(tx, result);
            }
            DeleteCustomList(tx, id) => reply(
                tx,
                self.update_settings_fallible(|settings| {
                    settings
                        .custom_lists
                        .remove(&id)
                        .map(|_| ())
                        .map_err(Error::CustomList)
                }),
            ),
            UpdateCustomList(tx, list) => reply(
                tx,
                self.update_settings_fallible(|settings| {
                    settings.custom_lists.update(list).map_err(Error::CustomList)
                }),
            ),
            ClearCustomLists(tx) => reply(
                tx,
                self.update_settings(|settings| settings.custom_lists.clear()),
            ),

            AddApiAccessMethod(tx, name, enabled, method) => {
                let setting = access_method::AccessMethodSetting::new(name, enabled, method);
                let id = setting.id;
                let result = self
                    .update_settings(|settings| settings.api_access_methods.append(setting))
                    .map(|_| id);
                reply(tx, result);
            }
            RemoveApiAccessMethod(tx, id) => reply(
                tx,
                self.update_settings_fallible(|settings| {
                    settings
                        .api_access_methods
                        .remove(&id)
                        .map_err(Error::AccessMethod)
                }),
            ),
            UpdateApiAccessMethod(tx, setting) => {
                let id = setting.id;
                reply(
                    tx,
                    self.update_settings_fallible(|settings| {
                        let entry = settings
                            .api_access_methods
                            .find_mut(&id)
                            .ok_or(Error::AccessMethod(access_method::Error::NotFound))?;
                        *entry = setting;
                        Ok(())
                    }),
                );
            }
            SetApiAccessMethod(tx, id) => {
                let result = if self.settings.settings().api_access_methods.find(&id).is_some() {
                    self.current_access_method = Some(id);
                    Ok(())
                } else {
                    Err(Error::AccessMethod(access_method::Error::NotFound))
                };
                reply(tx, result);
            }
            GetCurrentApiAccessMethod(tx) => {
                let result = self
                    .current_access_method
                    .as_ref()
                    .and_then(|id| self.settings.settings().api_access_methods.find(id))
                    .cloned()
                    .ok_or(Error::AccessMethod(access_method::Error::NotFound));
                reply(tx, result);
            }
            ClearCustomApiAccessMethods(tx) => reply(
                tx,
                self.update_settings(|settings| settings.api_access_methods.retain_builtin()),
            ),
            TestApiAccessMethodById(tx, id) => {
                let method = self
                    .settings
                    .settings()
                    .api_access_methods
                    .find(&id)
                    .map(|setting| setting.access_method.clone());
                let result = match method {
                    Some(access_method::AccessMethod::Custom(proxy)) => {
                        Ok(test_proxy_reachable(&proxy).await)
                    }
                    Some(access_method::AccessMethod::BuiltIn(_)) => Ok(true),
                    None => Err(Error::AccessMethod(access_method::Error::NotFound)),
                };
                reply(tx, result);
            }
            TestCustomApiAccessMethod(tx, proxy) => {
                reply(tx, test_proxy_reachable(&proxy).await);
            }

            AddSplitTunnelProcess(tx, pid) => {
                if !self.excluded_pids.contains(&pid) {
                    self.excluded_pids.push(pid);
                }
                reply(tx, ());
            }
            RemoveSplitTunnelProcess(tx, pid) => {
                self.excluded_pids.retain(|excluded| *excluded != pid);
                reply(tx, ());
            }
            ClearSplitTunnelProcesses(tx) => {
                self.excluded_pids.clear();
                reply(tx, ());
            }
            GetSplitTunnelProcesses(tx) => reply(tx, self.excluded_pids.clone()),
            AddSplitTunnelApp(tx, app) => reply(
                tx,
                self.update_settings(|settings| {
                    if !settings.split_tunnel.apps.contains(&app) {
                        settings.split_tunnel.apps.push(app);
                    }
                }),
            ),
            RemoveSplitTunnelApp(tx, app) => reply(
                tx,
                self.update_settings(|settings| {
                    settings.split_tunnel.apps.retain(|path| path != &app)
                }),
            ),
            ClearSplitTunnelApps(tx) => reply(
                tx,
                self.update_settings(|settings| settings.split_tunnel.apps.clear()),
            ),
            SetSplitTunnelState(tx, enabled) => reply(
                tx,
                self.update_settings(|settings| {
                    settings.split_tunnel.enable_exclusions = enabled
                }),
            ),
            GetExcludedProcesses(tx) => reply(tx, self.excluded_processes()),

            GetVersionInfo(tx) => reply(tx, self.version_checker.version_info()),
            GetCurrentVersion(tx) => reply(tx, CURRENT_VERSION.to_string()),
            IsPerformingPostUpgrade(tx) => reply(tx, false),
            AppUpgrade(tx) => reply(tx, self.start_app_upgrade()),
            AppUpgradeAbort(tx) => reply(tx, self.abort_app_upgrade()),

            FactoryReset(tx) => reply(tx, self.factory_reset()),
            PrepareRestart(tx) => {
                self.disconnect();
                reply(tx, ());
            }
            CheckVolumes(tx) => reply(tx, ()),
        }
    }

    fn notify(&self, event: DaemonEvent) {
        let _ = self.event_tx.send(event);
    }

    fn notify_settings(&self) {
        self.notify(DaemonEvent::Settings(self.settings.settings().clone()));
    }

    fn set_tunnel_state(&mut self, state: TunnelState) {
        tracing::info!("New tunnel state: {state}");
        self.tunnel_state = state.clone();
        self.notify(DaemonEvent::TunnelState(state));
    }

    fn update_settings(&mut self, update: impl FnOnce(&mut Settings)) -> Result<()> {
        let changed = self.settings.update(update).map_err(Error::SettingsPersist)?;
        if changed {
            self.notify_settings();
        }
        Ok(())
    }

    /// Like [`Self::update_settings`], but the update itself may be refused.
    fn update_settings_fallible(
        &mut self,
        update: impl FnOnce(&mut Settings) -> Result<()>,
    ) -> Result<()> {
        let mut outcome = Ok(());
        let changed = self
            .settings
            .update(|settings| {
                let mut draft = settings.clone();
                outcome = update(&mut draft);
                if outcome.is_ok() {
                    *settings = draft;
                }
            })
            .map_err(Error::SettingsPersist)?;
        outcome?;
        if changed {
            self.notify_settings();
        }
        Ok(())
    }

    fn connect(&mut self) -> bool {
        if matches!(
            self.tunnel_state,
            TunnelState::Connected { .. } | TunnelState::Connecting { .. }
        ) {
            return false;
        }
        self.target_state = TargetState::Secured;

        match self.resolve_tunnel_endpoint() {
            Ok((endpoint, location)) => {
                self.set_tunnel_state(TunnelState::Connecting {
                    endpoint: endpoint.clone(),
                    location: location.clone(),
                });
                self.set_tunnel_state(TunnelState::Connected { endpoint, location });
            }
            Err(cause) => {
                self.set_tunnel_state(TunnelState::Error(ErrorState::new(cause, None)));
            }
        }
        true
    }

    fn disconnect(&mut self) -> bool {
        if self.tunnel_state.is_disconnected() {
            return false;
        }
        self.target_state = TargetState::Unsecured;
        self.set_tunnel_state(TunnelState::Disconnecting(ActionAfterDisconnect::Nothing));
        let locked_down = self.settings.settings().block_when_disconnected;
        self.set_tunnel_state(TunnelState::Disconnected {
            location: None,
            locked_down,
        });
        true
    }

    fn reconnect(&mut self) -> bool {
        if self.target_state != TargetState::Secured {
            return false;
        }
        self.set_tunnel_state(TunnelState::Disconnecting(ActionAfterDisconnect::Reconnect));
        match self.resolve_tunnel_endpoint() {
            Ok((endpoint, location)) => {
                self.set_tunnel_state(TunnelState::Connecting {
                    endpoint: endpoint.clone(),
                    location: location.clone(),
                });
                self.set_tunnel_state(TunnelState::Connected { endpoint, location });
            }
            Err(cause) => {
                self.set_tunnel_state(TunnelState::Error(ErrorState::new(cause, None)));
            }
        }
        true
    }

    fn resolve_tunnel_endpoint(
        &self,
    ) -> std::result::Result<(TunnelEndpoint, Option<GeoIpLocation>), ErrorStateCause> {
        if !self.account.device_state().is_logged_in() {
            return Err(ErrorStateCause::AuthFailed(Some(
                mullvad_vpn_types::states::AuthFailed::InvalidAccount
                    .as_str()
                    .to_string(),
            )));
        }

        let settings = self.settings.settings();
        match &settings.relay_settings {
            RelaySettings::Normal(constraints) => {
                relay_selector::select_tunnel_endpoint(&self.relay_list, settings, constraints)
                    .map(|selected| (selected.endpoint, Some(selected.location)))
                    .map_err(ErrorStateCause::TunnelParameterError)
            }
            RelaySettings::CustomTunnelEndpoint(custom) => {
                let endpoint = TunnelEndpoint {
                    endpoint: Endpoint::new(custom.config.peer.endpoint, TransportProtocol::Udp),
                    quantum_resistant: false,
                    obfuscation: None,
                    entry_endpoint: None,
                    tunnel_interface: None,
                    daita: false,
                };
                Ok((endpoint, None))
            }
        }
    }

    fn refresh_lockdown_state(&mut self) {
        if let TunnelState::Disconnected { location, .. } = &self.tunnel_state {
            let state = TunnelState::Disconnected {
                location: location.clone(),
                locked_down: self.settings.settings().block_when_disconnected,
            };
            self.set_tunnel_state(state);
        }
    }

    fn current_location(&self) -> Option<GeoIpLocation> {
        match &self.tunnel_state {
            TunnelState::Connected { location, .. }
            | TunnelState::Connecting { location, .. } => location.clone(),
            TunnelState::Disconnected { location, .. } => location.clone(),
            TunnelState::Disconnecting(_) | TunnelState::Error(_) => None,
        }
    }

    fn www_auth_token(&self) -> std::result::Result<String, AccountError> {
        match self.account.device_state() {
            DeviceState::LoggedIn(_) => {
                let token: [u8; 16] = rand::random();
                Ok(hex::encode(token))
            }
            _ => Err(AccountError::NotLoggedIn),
        }
    }

    fn apply_json_settings(&mut self, blob: &str) -> Result<()> {
        let patch: serde_json::Value = serde_json::from_str(blob)
            .map_err(|_| Error::InvalidSettingsPatch("patch is not valid JSON"))?;
        if !patch.is_object() {
            return Err(Error::InvalidSettingsPatch("patch must be a JSON object"));
        }

        let mut current = serde_json::to_value(self.settings.settings())
            .map_err(|_| Error::InvalidSettingsPatch("settings are not serializable"))?;
        merge_json(&mut current, patch);
        let new_settings: Settings = serde_json::from_value(current)
            .map_err(|_| Error::InvalidSettingsPatch("patch does not match the settings model"))?;

        let changed = self
            .settings
            .replace(new_settings)
            .map_err(Error::SettingsPersist)?;
        if changed {
            self.notify_settings();
        }
        Ok(())
    }

    fn excluded_processes(&self) -> Vec<ExcludedProcess> {
        self.excluded_pids
            .iter()
            .map(|pid| ExcludedProcess {
                pid: *pid as u32,
                image: process_image(*pid),
                inherited: false,
            })
            .collect()
    }

    fn start_app_upgrade(&mut self) -> Result<()> {
        if let Some(task) = &self.upgrade_task {
            if !task.is_finished() {
                return Ok(());
            }
        }
        let upgrade = self
            .version_checker
            .suggested_upgrade()
            .cloned()
            .ok_or(Error::NoUpgradeAvailable)?;
        self.upgrade_task = Some(AppUpgradeTask::spawn(
            upgrade,
            self.data_dir.clone(),
            self.upgrade_event_tx.clone(),
        ));
        Ok(())
    }

    fn abort_app_upgrade(&mut self) -> Result<()> {
        match self.upgrade_task.take() {
            Some(task) if !task.is_finished() => {
                task.abort();
                Ok(())
            }
            _ => Err(Error::NoUpgradeInProgress),
        }
    }

    fn factory_reset(&mut self) -> Result<()> {
        self.disconnect();
        self.account.factory_reset().map_err(Error::Account)?;
        self.settings.reset().map_err(Error::SettingsPersist)?;
        self.notify_settings();
        Ok(())
    }
}

fn reply<T>(tx: oneshot::Sender<T>, value: T) {
    if tx.send(value).is_err() {
        tracing::debug!("The requester stopped listening for the reply");
    }
}

async fn test_proxy_reachable(proxy: &CustomProxy) -> bool {
    let endpoint = proxy.remote_endpoint();
    matches!(
        tokio::time::timeout(
            PROXY_TEST_TIMEOUT,
            tokio::net::TcpStream::connect(endpoint.address),
        )
        .await,
        Ok(Ok(_))
    )
}

fn load_relay_list(path: &PathBuf) -> RelayList {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(list) => list,
            Err(error) => {
                tracing::error!("Ignoring malformed relay list cache: {error}");
                RelayList::empty()
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => RelayList::empty(),
        Err(error) => {
            tracing::error!("Failed to read relay list cache: {error}");
            RelayList::empty()
        }
    }
}

fn process_image(pid: i32) -> std::path::PathBuf {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_link(format!("/proc/{pid}/exe")).unwrap_or_default()
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = pid;
        std::path::PathBuf::new()
    }
}

// Objects merge recursively, everything else is replaced.
fn merge_json(current: &mut serde_json::Value, patch: serde_json::Value) {
    match (current, patch) {
        (serde_json::Value::Object(current), serde_json::Value::Object(patch)) => {
            for (key, value) in patch {
                match current.get_mut(&key) {
                    Some(entry) => merge_json(entry, value),
                    None => {
                        current.insert(key, value);
                    }
                }
            }
        }
        (current, patch) => *current = patch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_merge_is_recursive() {
        let mut current = serde_json::json!({
            "allow_lan": false,
            "tunnel_options": {"generic": {"enable_ipv6": true}, "openvpn": {"mssfix": null}},
        });
        let patch = serde_json::json!({
            "allow_lan": true,
            "tunnel_options": {"openvpn": {"mssfix": 1300}},
        });

        merge_json(&mut current, patch);

        assert_eq!(
            current,
            serde_json::json!({
                "allow_lan": true,
                "tunnel_options": {"generic": {"enable_ipv6": true}, "openvpn": {"mssfix": 1300}},
            })
        );
    }
}
