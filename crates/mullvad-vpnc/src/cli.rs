// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(author = "Mullvad VPN", version, about = "Control the Mullvad VPN daemon")]
pub(crate) struct CliArgs {
    /// Connect over TCP instead of the daemon socket.
    #[arg(long)]
    pub(crate) tcp: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Connect the tunnel
    Connect,
    /// Disconnect the tunnel
    Disconnect,
    /// Reconnect the tunnel
    Reconnect,
    /// Show the current tunnel state
    Status,
    /// Show the daemon and suggested upgrade versions
    Version,
    /// Print daemon events as they arrive
    ListenToEvents,
    /// Print daemon log entries as they arrive
    ListenToLogs,

    /// Create a new account and log in to it
    CreateAccount,
    /// Log in to an account
    Login { account: String },
    /// Log out of the current account
    Logout,
    /// Show the expiry of an account
    AccountData { account: String },
    /// Show the most recently used account
    AccountHistory,
    /// Forget the most recently used account
    ClearAccountHistory,
    /// Redeem a voucher code on the current account
    RedeemVoucher { voucher: String },

    /// Show the device the daemon is logged in as
    Device,
    /// List the devices on an account
    ListDevices { account: String },
    /// Remove a device from an account
    RemoveDevice { account: String, device_id: String },
    /// Rotate the WireGuard key of the current device
    RotateKey,
    /// Show the WireGuard key of the current device
    GetKey,

    /// List relay countries, cities and hostnames
    Relays,
    /// Reload the cached relay list
    UpdateRelays,
    /// Show the location the daemon reports
    GetLocation,
    /// Constrain relay selection to a country, city or relay
    SetLocation(SetLocationArgs),

    /// Print the current settings
    GetSettings,
    /// Reset all settings to the defaults
    ResetSettings,
    /// Allow or block local network access while connected
    AllowLan { state: bool },
    /// Keep blocking traffic while disconnected
    LockdownMode { state: bool },
    /// Connect automatically when the daemon starts
    AutoConnect { state: bool },
    /// Enable IPv6 in the tunnel
    EnableIpv6 { state: bool },
    /// Set the WireGuard MTU, or clear it with 0
    Mtu { mtu: u16 },
    /// Select the obfuscation method
    Obfuscation(ObfuscationArgs),
    /// Export the settings as JSON
    ExportSettings,
    /// Apply a JSON settings patch read from stdin
    ApplySettings,

    /// Create a custom relay list
    CreateCustomList { name: String },
    /// Delete a custom relay list
    DeleteCustomList { id: String },

    /// Add a remote SOCKS5 API access method
    AddAccessMethod(AddAccessMethodArgs),
    /// Remove an API access method
    RemoveAccessMethod { id: String },
    /// Test an API access method by id
    TestAccessMethod { id: String },

    /// Exclude an application from the tunnel
    SplitTunnelAdd { path: String },
    /// Stop excluding an application from the tunnel
    SplitTunnelRemove { path: String },
    /// Enable or disable split tunneling
    SplitTunnelState { state: bool },
    /// List the excluded process ids
    SplitTunnelPids,

    /// Start downloading the suggested app upgrade
    AppUpgrade,
    /// Abort the running app upgrade
    AppUpgradeAbort,
    /// Print app upgrade events as they arrive
    ListenToUpgradeEvents,

    /// Clear all settings, accounts and caches
    FactoryReset,
}

#[derive(Args, Debug)]
pub(crate) struct SetLocationArgs {
    pub(crate) country: String,
    pub(crate) city: Option<String>,
    pub(crate) hostname: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ObfuscationArgs {
    /// auto, off, udp2tcp, shadowsocks or quic
    pub(crate) mode: String,
    /// Port to use for udp2tcp or shadowsocks
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct AddAccessMethodArgs {
    pub(crate) name: String,
    /// Remote SOCKS5 endpoint, e.g. 10.0.0.1:1080
    pub(crate) endpoint: String,
    #[arg(long)]
    pub(crate) disabled: bool,
}
