// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

mod cli;
mod command_interface;
mod logging;
mod runtime;
mod service;
mod shutdown_handler;
#[cfg(test)]
mod tests;

use clap::Parser;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::{
    cli::CliArgs,
    command_interface::{start_command_interface, CommandInterfaceOptions},
    service::Daemon,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let (log_tx, _log_guard) = if args.log_to_file {
        let (log_tx, guard) = logging::setup_logging_to_file();
        (log_tx, Some(guard))
    } else {
        (logging::setup_logging(), None)
    };

    runtime::new_runtime()?.block_on(run(args, log_tx))
}

async fn run(args: CliArgs, log_tx: broadcast::Sender<logging::LogMessage>) -> anyhow::Result<()> {
    let (daemon_event_tx, daemon_event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let (upgrade_event_tx, upgrade_event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let shutdown_token = CancellationToken::new();

    let streams = command_interface::EventStreams {
        daemon_events_rx: daemon_event_rx,
        log_rx: log_tx.subscribe(),
        upgrade_events_rx: upgrade_event_rx,
    };

    let (command_interface_handle, daemon_command_rx) = start_command_interface(
        streams,
        Some(CommandInterfaceOptions {
            disable_socket_listener: args.disable_socket_listener,
            enable_tcp_listener: args.enable_tcp_listener,
        }),
        shutdown_token.child_token(),
    );

    let daemon_handle = Daemon::spawn(
        daemon_event_tx,
        daemon_command_rx,
        upgrade_event_tx,
        shutdown_token.child_token(),
    );

    let mut shutdown_join_set = shutdown_handler::install(shutdown_token);

    if let Err(e) = daemon_handle.await {
        tracing::error!("Failed to join on the daemon service: {e}");
    }

    if let Err(e) = command_interface_handle.await {
        tracing::error!("Failed to join on the management interface: {e}");
    }

    shutdown_join_set.shutdown().await;

    Ok(())
}
