// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::io::Read;

use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::StreamExt;

use mullvad_vpn_proto::client::{DaemonEvent, ManagementClient};
use mullvad_vpn_types::{
    access_method::AccessMethod,
    net::proxy::{CustomProxy, Socks5Remote},
    relay_constraints::{
        GeographicLocationConstraint, LocationConstraint, ObfuscationSettings, RelayConstraints,
        RelaySettings, SelectedObfuscation,
    },
    states::TunnelState,
    Constraint,
};

use crate::{
    cli::{AddAccessMethodArgs, CliArgs, Command, ObfuscationArgs, SetLocationArgs},
    vpnd_client::ClientType,
};

mod cli;
mod config;
mod vpnd_client;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let client_type = if args.tcp {
        ClientType::Tcp
    } else {
        ClientType::Ipc
    };
    let mut client = vpnd_client::get_client(client_type).await?;

    match args.command {
        Command::Connect => {
            let initiated = client.connect_tunnel().await?;
            println!("connecting: {initiated}");
        }
        Command::Disconnect => {
            let initiated = client.disconnect_tunnel().await?;
            println!("disconnecting: {initiated}");
        }
        Command::Reconnect => {
            let initiated = client.reconnect_tunnel().await?;
            println!("reconnecting: {initiated}");
        }
        Command::Status => {
            let state = client.get_tunnel_state().await?;
            print_tunnel_state(&state);
        }
        Command::Version => {
            let version = client.get_current_version().await?;
            println!("daemon version: {version}");
            let info = client.get_version_info().await?;
            println!("supported: {}", info.supported);
            match info.suggested_upgrade {
                Some(upgrade) => println!("suggested upgrade: {}", upgrade.version),
                None => println!("up to date"),
            }
        }
        Command::ListenToEvents => listen_to_events(&mut client).await?,
        Command::ListenToLogs => {
            let mut stream = client.log_listen().await?;
            while let Some(entry) = stream.next().await {
                let entry = entry?;
                println!("[{:?}] {}", entry.level(), entry.message);
            }
        }

        Command::CreateAccount => {
            let account = client.create_new_account().await?;
            println!("logged in to new account: {account}");
        }
        Command::Login { account } => {
            client.login_account(account).await?;
            println!("logged in");
        }
        Command::Logout => {
            client.logout_account().await?;
            println!("logged out");
        }
        Command::AccountData { account } => {
            let data = client.get_account_data(account).await?;
            println!(
                "expires at: {}",
                data.expiry
                    .format(&time::format_description::well_known::Rfc3339)
                    .unwrap_or_else(|_| data.expiry.to_string())
            );
        }
        Command::AccountHistory => match client.get_account_history().await? {
            Some(account) => println!("{account}"),
            None => println!("no account history"),
        },
        Command::ClearAccountHistory => {
            client.clear_account_history().await?;
            println!("account history cleared");
        }
        Command::RedeemVoucher { voucher } => {
            let submission = client.submit_voucher(voucher).await?;
            println!(
                "added {} days, new expiry: {}",
                submission.seconds_added / (24 * 60 * 60),
                submission.new_expiry
            );
        }

        Command::Device => {
            let state = client.get_device().await?;
            match state.logged_in() {
                Some(account_and_device) => {
                    println!("account: {}", account_and_device.account_number);
                    println!("device: {}", account_and_device.device.name);
                    println!("id: {}", account_and_device.device.id);
                }
                None => println!("not logged in"),
            }
        }
        Command::ListDevices { account } => {
            for device in client.list_devices(account).await? {
                println!("{}  {}", device.id, device.name);
            }
        }
        Command::RemoveDevice { account, device_id } => {
            client.remove_device(account, device_id).await?;
            println!("device removed");
        }
        Command::RotateKey => {
            client.rotate_wireguard_key().await?;
            let key = client.get_wireguard_key().await?;
            println!("new key: {key}");
        }
        Command::GetKey => {
            let key = client.get_wireguard_key().await?;
            println!("key: {key}");
            println!("created: {}", key.created);
        }

        Command::Relays => {
            let list = client.get_relay_locations().await?;
            for country in &list.countries {
                println!("{} ({})", country.name, country.code);
                for city in &country.cities {
                    println!("  {} ({})", city.name, city.code);
                    for relay in &city.relays {
                        let status = if relay.active { "" } else { " (inactive)" };
                        println!("    {}{status}", relay.hostname);
                    }
                }
            }
        }
        Command::UpdateRelays => {
            client.update_relay_locations().await?;
            println!("relay list updated");
        }
        Command::GetLocation => {
            let location = client.get_current_location().await?;
            println!(
                "{}{}",
                location
                    .city
                    .map(|city| format!("{city}, "))
                    .unwrap_or_default(),
                location.country
            );
            if let Some(hostname) = location.hostname {
                println!("exit relay: {hostname}");
            }
        }
        Command::SetLocation(location_args) => {
            let location = parse_location_constraint(location_args)?;
            client
                .set_relay_settings(RelaySettings::Normal(RelayConstraints {
                    location: Constraint::Only(LocationConstraint::Location(location)),
                    ..RelayConstraints::default()
                }))
                .await?;
            println!("relay location updated");
        }

        Command::GetSettings => {
            let settings = client.get_settings().await?;
            println!("{settings:#?}");
        }
        Command::ResetSettings => {
            client.reset_settings().await?;
            println!("settings reset");
        }
        Command::AllowLan { state } => {
            client.set_allow_lan(state).await?;
            println!("allow LAN: {state}");
        }
        Command::LockdownMode { state } => {
            client.set_block_when_disconnected(state).await?;
            println!("lockdown mode: {state}");
        }
        Command::AutoConnect { state } => {
            client.set_auto_connect(state).await?;
            println!("auto-connect: {state}");
        }
        Command::EnableIpv6 { state } => {
            client.set_enable_ipv6(state).await?;
            println!("IPv6: {state}");
        }
        Command::Mtu { mtu } => {
            let mtu = if mtu == 0 { None } else { Some(mtu) };
            client.set_wireguard_mtu(mtu).await?;
            println!("MTU updated");
        }
        Command::Obfuscation(obfuscation_args) => {
            let settings = parse_obfuscation_settings(obfuscation_args)?;
            client.set_obfuscation_settings(settings).await?;
            println!("obfuscation settings updated");
        }
        Command::ExportSettings => {
            println!("{}", client.export_json_settings().await?);
        }
        Command::ApplySettings => {
            let mut blob = String::new();
            std::io::stdin()
                .read_to_string(&mut blob)
                .context("Failed to read the settings patch from stdin")?;
            client.apply_json_settings(blob).await?;
            println!("settings patch applied");
        }

        Command::CreateCustomList { name } => {
            let id = client.create_custom_list(name).await?;
            println!("created custom list: {id}");
        }
        Command::DeleteCustomList { id } => {
            let id = id.parse().context("Invalid custom list id")?;
            client.delete_custom_list(id).await?;
            println!("custom list deleted");
        }

        Command::AddAccessMethod(method_args) => {
            let id = add_access_method(&mut client, method_args).await?;
            println!("added access method: {id}");
        }
        Command::RemoveAccessMethod { id } => {
            let id = id.parse().context("Invalid access method id")?;
            client.remove_access_method(id).await?;
            println!("access method removed");
        }
        Command::TestAccessMethod { id } => {
            let id = id.parse().context("Invalid access method id")?;
            let reachable = client.test_access_method_by_id(id).await?;
            println!("reachable: {reachable}");
        }

        Command::SplitTunnelAdd { path } => {
            client.add_split_tunnel_app(path).await?;
            println!("application excluded");
        }
        Command::SplitTunnelRemove { path } => {
            client.remove_split_tunnel_app(path).await?;
            println!("application no longer excluded");
        }
        Command::SplitTunnelState { state } => {
            client.set_split_tunnel_state(state).await?;
            println!("split tunneling: {state}");
        }
        Command::SplitTunnelPids => {
            for pid in client.get_split_tunnel_processes().await? {
                println!("{pid}");
            }
        }

        Command::AppUpgrade => {
            client.app_upgrade().await?;
            println!("app upgrade started");
        }
        Command::AppUpgradeAbort => {
            client.app_upgrade_abort().await?;
            println!("app upgrade aborted");
        }
        Command::ListenToUpgradeEvents => {
            let mut stream = client.app_upgrade_events_listen().await?;
            while let Some(event) = stream.next().await {
                println!("{:?}", event?);
            }
        }

        Command::FactoryReset => {
            client.factory_reset().await?;
            println!("factory reset complete");
        }
    }
    Ok(())
}

fn print_tunnel_state(state: &TunnelState) {
    match state {
        TunnelState::Disconnected { locked_down, .. } => {
            if *locked_down {
                println!("disconnected (blocking)");
            } else {
                println!("disconnected");
            }
        }
        TunnelState::Connecting { endpoint, .. } => println!("connecting to {endpoint}"),
        TunnelState::Connected { endpoint, location } => {
            println!("connected to {endpoint}");
            if let Some(location) = location {
                println!(
                    "exit: {}{}",
                    location
                        .hostname
                        .as_deref()
                        .map(|hostname| format!("{hostname} in "))
                        .unwrap_or_default(),
                    location.country
                );
            }
        }
        TunnelState::Disconnecting(_) => println!("disconnecting"),
        TunnelState::Error(error_state) => println!("blocked: {}", error_state.cause()),
    }
}

async fn listen_to_events(client: &mut ManagementClient) -> Result<()> {
    let mut events = client.events_listen().await?;
    while let Some(event) = events.next().await {
        match event? {
            DaemonEvent::TunnelState(state) => print_tunnel_state(&state),
            DaemonEvent::Settings(_) => println!("settings changed"),
            DaemonEvent::RelayList(list) => {
                println!("relay list updated: {} countries", list.countries.len())
            }
            DaemonEvent::AppVersionInfo(info) => {
                println!("version info updated, supported: {}", info.supported)
            }
            DaemonEvent::Device(event) => println!("device event: {:?}", event.cause),
            DaemonEvent::RemoveDevice(event) => {
                println!("device removed from {}", event.account_number)
            }
        }
    }
    Ok(())
}

fn parse_location_constraint(args: SetLocationArgs) -> Result<GeographicLocationConstraint> {
    match (args.city, args.hostname) {
        (None, None) => Ok(GeographicLocationConstraint::Country(args.country)),
        (Some(city), None) => Ok(GeographicLocationConstraint::City(args.country, city)),
        (Some(city), Some(hostname)) => Ok(GeographicLocationConstraint::Hostname(
            args.country,
            city,
            hostname,
        )),
        (None, Some(_)) => bail!("a hostname requires a city"),
    }
}

fn parse_obfuscation_settings(args: ObfuscationArgs) -> Result<ObfuscationSettings> {
    let mut settings = ObfuscationSettings::default();
    settings.selected_obfuscation = match args.mode.as_str() {
        "auto" => SelectedObfuscation::Auto,
        "off" => SelectedObfuscation::Off,
        "udp2tcp" => SelectedObfuscation::Udp2Tcp,
        "shadowsocks" => SelectedObfuscation::Shadowsocks,
        "quic" => SelectedObfuscation::Quic,
        other => bail!("unknown obfuscation mode: {other}"),
    };
    if let Some(port) = args.port {
        settings.udp2tcp.port = Constraint::Only(port);
        settings.shadowsocks.port = Constraint::Only(port);
    }
    Ok(settings)
}

async fn add_access_method(
    client: &mut ManagementClient,
    args: AddAccessMethodArgs,
) -> Result<mullvad_vpn_types::access_method::Id> {
    let peer = args
        .endpoint
        .parse()
        .context("Invalid SOCKS5 endpoint, expected ip:port")?;
    let method = AccessMethod::Custom(CustomProxy::Socks5Remote(Socks5Remote::new(peer)));
    let id = client
        .add_access_method(args.name, !args.disabled, method)
        .await?;
    Ok(id)
}
