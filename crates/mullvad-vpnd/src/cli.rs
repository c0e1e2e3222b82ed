// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use clap::Parser;

#[derive(Parser, Clone, Debug)]
#[clap(author = "Mullvad VPN", version, about = "Mullvad VPN daemon")]
pub(crate) struct CliArgs {
    /// Serve the management interface over a local TCP socket in addition to
    /// the unix socket.
    #[arg(long)]
    pub(crate) enable_tcp_listener: bool,

    #[arg(long)]
    pub(crate) disable_socket_listener: bool,

    /// Log to a file in the log directory instead of stdout.
    #[arg(long)]
    pub(crate) log_to_file: bool,
}
