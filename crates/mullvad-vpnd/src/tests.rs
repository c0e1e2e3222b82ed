// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end test of the management interface: a real daemon service behind
//! a real tonic server, exercised over an in-memory duplex transport.

use std::net::Ipv4Addr;

use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tonic::transport::{Endpoint, Server, Uri};
use tower::service_fn;

use mullvad_vpn_proto::management_service_client::ManagementServiceClient;
use mullvad_vpn_proto::management_service_server::ManagementServiceServer;
use mullvad_vpn_types::relay_list::{
    Relay, RelayEndpointData, RelayList, RelayListCity, RelayListCountry,
    WireguardRelayEndpointData,
};

use crate::{
    command_interface::{CommandInterface, ListenerType},
    service::Daemon,
};

const TEST_ACCOUNT: &str = "1234567890123456";

fn test_relay_list() -> RelayList {
    RelayList {
        countries: vec![RelayListCountry {
            name: "Sweden".to_string(),
            code: "se".to_string(),
            cities: vec![RelayListCity {
                name: "Gothenburg".to_string(),
                code: "got".to_string(),
                latitude: 57.70887,
                longitude: 11.97456,
                relays: vec![Relay {
                    hostname: "se-got-wg-001".to_string(),
                    ipv4_addr_in: Ipv4Addr::new(185, 213, 154, 68),
                    ipv6_addr_in: None,
                    include_in_country: true,
                    active: true,
                    owned: true,
                    provider: "31173".to_string(),
                    weight: 100,
                    endpoint_data: RelayEndpointData::Wireguard(WireguardRelayEndpointData {
                        public_key: [7u8; 32],
                        daita: false,
                        quic_addr_in: Vec::new(),
                        shadowsocks_extra_ports: Vec::new(),
                    }),
                }],
            }],
        }],
    }
}

async fn start_test_server(
) -> (ManagementServiceClient<tonic::transport::Channel>, CancellationToken) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    std::env::set_var("MULLVAD_VPND_DATA_DIR", dir.path().join("data"));
    std::env::set_var("MULLVAD_VPND_CONFIG_DIR", dir.path().join("config"));
    std::env::remove_var("MULLVAD_VPND_VERSION_METADATA_URL");

    std::fs::create_dir_all(dir.path().join("data")).expect("failed to create data dir");
    std::fs::write(
        dir.path().join("data").join("relays.json"),
        serde_json::to_string(&test_relay_list()).expect("failed to serialize relay list"),
    )
    .expect("failed to write relay list");
    // Leak the tempdir so the daemon's files outlive this function.
    std::mem::forget(dir);

    let (daemon_event_tx, daemon_event_rx) = broadcast::channel(64);
    let (upgrade_event_tx, upgrade_event_rx) = broadcast::channel(64);
    let (log_tx, log_rx) = broadcast::channel(64);
    let (daemon_tx, daemon_rx) = tokio::sync::mpsc::unbounded_channel();
    let shutdown_token = CancellationToken::new();

    Daemon::spawn(
        daemon_event_tx,
        daemon_rx,
        upgrade_event_tx,
        shutdown_token.child_token(),
    );
    drop(log_tx);

    let command_interface = CommandInterface::new(
        daemon_event_rx,
        log_rx,
        upgrade_event_rx,
        daemon_tx,
        ListenerType::Uri("127.0.0.1:0".parse().expect("failed to parse addr")),
    );

    let (client_io, server_io) = tokio::io::duplex(1024);

    let server_shutdown = shutdown_token.child_token();
    tokio::spawn(async move {
        Server::builder()
            .add_service(ManagementServiceServer::new(command_interface))
            .serve_with_incoming_shutdown(
                tokio_stream::once(Ok::<_, std::io::Error>(server_io)),
                server_shutdown.cancelled_owned(),
            )
            .await
            .expect("management server failed");
    });

    let mut client_io = Some(client_io);
    let channel = Endpoint::try_from("http://[::]:50051")
        .expect("failed to build endpoint")
        .connect_with_connector_lazy(service_fn(move |_: Uri| {
            let client_io = client_io.take();
            async move {
                client_io.ok_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "client already connected")
                })
            }
        }));

    (ManagementServiceClient::new(channel), shutdown_token)
}

#[tokio::test]
async fn management_interface_end_to_end() {
    let (mut client, shutdown_token) = start_test_server().await;

    // The daemon starts out disconnected.
    let state = client
        .get_tunnel_state(())
        .await
        .expect("get_tunnel_state failed")
        .into_inner();
    assert!(matches!(
        state.state,
        Some(mullvad_vpn_proto::tunnel_state::State::Disconnected(_))
    ));

    // Watch daemon events from here on.
    let mut events = client
        .events_listen(())
        .await
        .expect("events_listen failed")
        .into_inner();

    // Connecting without an account puts the tunnel in the error state.
    let initiated = client
        .connect_tunnel(())
        .await
        .expect("connect_tunnel failed")
        .into_inner();
    assert!(initiated);
    let state = client
        .get_tunnel_state(())
        .await
        .expect("get_tunnel_state failed")
        .into_inner();
    assert!(matches!(
        state.state,
        Some(mullvad_vpn_proto::tunnel_state::State::Error(_))
    ));

    // Log in and connect for real.
    client
        .login_account(TEST_ACCOUNT.to_string())
        .await
        .expect("login_account failed");
    let device_state = client
        .get_device(())
        .await
        .expect("get_device failed")
        .into_inner();
    assert_eq!(
        device_state.state,
        i32::from(mullvad_vpn_proto::device_state::State::LoggedIn)
    );

    client.disconnect_tunnel(()).await.expect("disconnect failed");
    let initiated = client
        .connect_tunnel(())
        .await
        .expect("connect_tunnel failed")
        .into_inner();
    assert!(initiated);

    let state = client
        .get_tunnel_state(())
        .await
        .expect("get_tunnel_state failed")
        .into_inner();
    match state.state {
        Some(mullvad_vpn_proto::tunnel_state::State::Connected(connected)) => {
            let relay_info = connected.relay_info.expect("missing relay info");
            let location = relay_info.location.expect("missing location");
            assert_eq!(location.hostname.as_deref(), Some("se-got-wg-001"));
            assert_eq!(location.country, "Sweden");
        }
        other => panic!("expected connected state, got {other:?}"),
    }

    // The event stream must have seen the state transitions.
    let mut saw_connected = false;
    for _ in 0..16 {
        let event = tokio::time::timeout(std::time::Duration::from_secs(5), events.next())
            .await
            .expect("timed out waiting for daemon event")
            .expect("event stream ended unexpectedly")
            .expect("event stream errored");
        if let Some(mullvad_vpn_proto::daemon_event::Event::TunnelState(state)) = event.event {
            if matches!(
                state.state,
                Some(mullvad_vpn_proto::tunnel_state::State::Connected(_))
            ) {
                saw_connected = true;
                break;
            }
        }
    }
    assert!(saw_connected, "never saw a connected tunnel state event");

    // Settings changes are persisted and observable.
    client.set_allow_lan(true).await.expect("set_allow_lan failed");
    let settings = client
        .get_settings(())
        .await
        .expect("get_settings failed")
        .into_inner();
    assert!(settings.allow_lan);

    // GetCurrentLocation follows the connected relay.
    let location = client
        .get_current_location(())
        .await
        .expect("get_current_location failed")
        .into_inner();
    assert_eq!(location.hostname.as_deref(), Some("se-got-wg-001"));

    // A server-streaming RPC yields exactly the daemon's items, then ends.
    for pid in [100, 200, 300] {
        client
            .add_split_tunnel_process(pid)
            .await
            .expect("add_split_tunnel_process failed");
    }
    let pids: Vec<i32> = client
        .get_split_tunnel_processes(())
        .await
        .expect("get_split_tunnel_processes failed")
        .into_inner()
        .collect::<Result<_, _>>()
        .await
        .expect("split tunnel stream errored");
    assert_eq!(pids, vec![100, 200, 300]);

    // Upgrades cannot start without a suggested upgrade.
    let error = client
        .app_upgrade(())
        .await
        .expect_err("app_upgrade should fail without version metadata");
    assert_eq!(error.code(), tonic::Code::FailedPrecondition);

    // Account history reflects the login.
    let history = client
        .get_account_history(())
        .await
        .expect("get_account_history failed")
        .into_inner();
    assert_eq!(history.number.as_deref(), Some(TEST_ACCOUNT));

    shutdown_token.cancel();
}
