// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use futures::FutureExt;
use tokio::{
    sync::{
        broadcast,
        mpsc::{self, UnboundedReceiver, UnboundedSender},
    },
    task::{JoinHandle, JoinSet},
    time::sleep,
};
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tonic_health::pb::health_server::{Health, HealthServer};

use mullvad_vpn_proto::{management_service_server::ManagementServiceServer, MGMT_FD_SET};
use mullvad_vpn_types::app_upgrade::AppUpgradeEvent;

use super::listener::{CommandInterface, ListenerType};
use crate::{
    logging::LogMessage,
    service::{DaemonCommand, DaemonEvent},
};

// If the shutdown signal is received, we give the listeners a little extra time to finish
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

pub(crate) const DEFAULT_SOCKET_PATH: &str = "/var/run/mullvad-vpnd.socket";
pub(crate) const DEFAULT_TCP_ADDR: &str = "127.0.0.1:44930";

pub(crate) fn default_socket_path() -> PathBuf {
    std::env::var("MULLVAD_VPND_SOCKET_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SOCKET_PATH))
}

fn default_tcp_addr() -> SocketAddr {
    DEFAULT_TCP_ADDR.parse().unwrap_or_else(|_| {
        SocketAddr::from(([127, 0, 0, 1], 44930))
    })
}

fn grpc_span(req: &http::Request<()>) -> tracing::Span {
    let service = req.uri().path().trim_start_matches('/');
    let method = service.split('/').last().unwrap_or(service);
    if service.contains("grpc.reflection.v1") {
        let span = tracing::trace_span!("grpc_reflection");
        tracing::trace!(target: "grpc_reflection", "← {}", method);
        return span;
    }
    if service.contains("grpc.health.v1") {
        let span = tracing::debug_span!("grpc_health");
        tracing::debug!(target: "grpc_health", "← {}", method);
        return span;
    }
    let span = tracing::info_span!("grpc_mgmt");
    tracing::info!(target: "grpc_mgmt", "← {}", method);
    span
}

pub(crate) struct EventStreams {
    pub daemon_events_rx: broadcast::Receiver<DaemonEvent>,
    pub log_rx: broadcast::Receiver<LogMessage>,
    pub upgrade_events_rx: broadcast::Receiver<AppUpgradeEvent>,
}

impl EventStreams {
    fn resubscribe(&self) -> Self {
        Self {
            daemon_events_rx: self.daemon_events_rx.resubscribe(),
            log_rx: self.log_rx.resubscribe(),
            upgrade_events_rx: self.upgrade_events_rx.resubscribe(),
        }
    }
}

#[cfg(unix)]
async fn run_socket_listener<T>(
    streams: EventStreams,
    daemon_tx: UnboundedSender<DaemonCommand>,
    socket_path: PathBuf,
    shutdown_token: CancellationToken,
    health_service: HealthServer<T>,
) -> anyhow::Result<()>
where
    T: Health,
{
    tracing::info!("Starting management socket listener on: {}", socket_path.display());
    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(MGMT_FD_SET)
        .build()?;
    let command_interface = CommandInterface::new(
        streams.daemon_events_rx,
        streams.log_rx,
        streams.upgrade_events_rx,
        daemon_tx,
        ListenerType::Path(socket_path.clone()),
    );
    command_interface.remove_previous_socket_file();

    let incoming = super::socket_stream::setup_socket_stream(&socket_path)?;

    Server::builder()
        .trace_fn(grpc_span)
        .add_service(health_service)
        .add_service(reflection_service)
        .add_service(ManagementServiceServer::new(command_interface))
        .serve_with_incoming_shutdown(incoming, shutdown_token.cancelled_owned())
        .await?;
    Ok(())
}

async fn run_tcp_listener<T>(
    streams: EventStreams,
    daemon_tx: UnboundedSender<DaemonCommand>,
    addr: SocketAddr,
    shutdown_token: CancellationToken,
    health_service: HealthServer<T>,
) -> anyhow::Result<()>
where
    T: Health,
{
    tracing::info!("Starting management TCP listener on: {addr}");
    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(MGMT_FD_SET)
        .build()?;
    let command_interface = CommandInterface::new(
        streams.daemon_events_rx,
        streams.log_rx,
        streams.upgrade_events_rx,
        daemon_tx,
        ListenerType::Uri(addr),
    );

    Server::builder()
        .trace_fn(grpc_span)
        .add_service(health_service)
        .add_service(reflection_service)
        .add_service(ManagementServiceServer::new(command_interface))
        .serve_with_shutdown(addr, shutdown_token.cancelled_owned())
        .await?;
    Ok(())
}

#[derive(Default)]
pub(crate) struct CommandInterfaceOptions {
    pub(crate) disable_socket_listener: bool,
    pub(crate) enable_tcp_listener: bool,
}

async fn setup_health_service(
    shutdown_token: CancellationToken,
) -> (HealthServer<impl Health>, JoinHandle<()>) {
    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<ManagementServiceServer<CommandInterface>>()
        .await;

    let handle = tokio::spawn(async move {
        shutdown_token.cancelled().await;
        tracing::debug!("Reporting not serving on health service");
        health_reporter
            .set_not_serving::<ManagementServiceServer<CommandInterface>>()
            .await;
    });

    (health_service, handle)
}

pub(crate) fn start_command_interface(
    streams: EventStreams,
    options: Option<CommandInterfaceOptions>,
    shutdown_token: CancellationToken,
) -> (JoinHandle<()>, UnboundedReceiver<DaemonCommand>) {
    tracing::info!("Starting management interface");

    let (daemon_tx, daemon_rx) = mpsc::unbounded_channel();
    let options = options.unwrap_or_default();
    let socket_path = default_socket_path();
    let tcp_addr = default_tcp_addr();

    let handle = tokio::spawn(async move {
        let mut join_set = JoinSet::new();

        let (health_service, health_service_handle) =
            setup_health_service(shutdown_token.child_token()).await;

        #[cfg(unix)]
        if !options.disable_socket_listener {
            join_set.spawn(run_socket_listener(
                streams.resubscribe(),
                daemon_tx.clone(),
                socket_path,
                shutdown_token.child_token(),
                health_service.clone(),
            ));
        }

        if options.enable_tcp_listener || cfg!(not(unix)) {
            join_set.spawn(run_tcp_listener(
                streams,
                daemon_tx.clone(),
                tcp_addr,
                shutdown_token.child_token(),
                health_service,
            ));
        }

        wait_for_shutdown(shutdown_token, join_set, health_service_handle).await;
        tracing::info!("Management interface exiting");
    });

    (handle, daemon_rx)
}

async fn wait_for_shutdown(
    shutdown_token: CancellationToken,
    mut join_set: JoinSet<anyhow::Result<()>>,
    health_service_handle: JoinHandle<()>,
) {
    let delayed_cancel = shutdown_token
        .cancelled()
        .then(|_| sleep(SHUTDOWN_TIMEOUT))
        .fuse();
    tokio::pin!(delayed_cancel);

    let mut i = 0;
    loop {
        tokio::select! {
            _ = &mut delayed_cancel => {
                tracing::info!("Shutdown timeout reached, cancelling all listeners");
                join_set.abort_all();
            }
            result = join_set.join_next() => match result {
                Some(result) => {
                    i += 1;

                    match result {
                        Ok(Ok(())) => {
                            tracing::trace!("Listener ({i}) has finished.")
                        }
                        Ok(Err(e)) => {
                            tracing::error!("Listener ({i}) exited with error: {e}");
                        }
                        Err(e) => {
                            tracing::error!("Failed to join on listener ({i}): {e}");
                        }
                    }
                },
                None => {
                    tracing::trace!("All listeners have finished");
                    break;
                }
            }
        }
    }

    health_service_handle
        .await
        .inspect_err(|e| tracing::error!("Failed to join on health reporter: {e}"))
        .ok();
}
