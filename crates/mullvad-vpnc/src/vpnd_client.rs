// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use anyhow::Context;
use mullvad_vpn_proto::client::ManagementClient;
use parity_tokio_ipc::Endpoint as IpcEndpoint;
use tonic::transport::{Channel as TonicChannel, Endpoint as TonicEndpoint};

use crate::config;

pub(crate) enum ClientType {
    Tcp,
    Ipc,
}

pub(crate) async fn get_client(client_type: ClientType) -> anyhow::Result<ManagementClient> {
    let channel = match client_type {
        ClientType::Tcp => get_tcp_channel().await?,
        ClientType::Ipc => get_ipc_channel().await?,
    };
    Ok(ManagementClient::new(channel))
}

async fn get_ipc_channel() -> anyhow::Result<TonicChannel> {
    let socket_path = config::socket_path();
    get_channel(socket_path.clone())
        .await
        .with_context(|| format!("Failed to connect to: {}", socket_path.display()))
}

async fn get_channel(socket_path: PathBuf) -> anyhow::Result<TonicChannel> {
    // NOTE: the uri here is ignored
    Ok(TonicEndpoint::from_static("http://[::1]:44930")
        .connect_with_connector(tower::service_fn(move |_| {
            IpcEndpoint::connect(socket_path.clone())
        }))
        .await?)
}

async fn get_tcp_channel() -> anyhow::Result<TonicChannel> {
    let endpoint = config::default_endpoint();
    let channel = TonicEndpoint::from_shared(endpoint.clone())?
        .connect()
        .await
        .with_context(|| format!("Failed to connect to: {endpoint}"))?;
    Ok(channel)
}
