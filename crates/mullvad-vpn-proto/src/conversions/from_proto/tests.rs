// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::net::{Ipv4Addr, SocketAddr};

use prost::Message;

use mullvad_vpn_types::{
    access_method,
    net::{
        proxy::{CustomProxy, Shadowsocks, Socks5Remote, SocksAuth},
        Endpoint, ObfuscationEndpoint, ObfuscationType, TransportProtocol, TunnelEndpoint,
    },
    relay_constraints::{
        GeographicLocationConstraint, LocationConstraint, RelayConstraints, RelaySettings,
    },
    relay_list::{
        Relay, RelayEndpointData, RelayList, RelayListCity, RelayListCountry,
        WireguardRelayEndpointData,
    },
    settings::Settings,
    states::{
        ActionAfterDisconnect, AuthFailed, ErrorState, ErrorStateCause, ParameterGenerationError,
        TunnelState,
    },
    Constraint,
};

fn tunnel_endpoint() -> TunnelEndpoint {
    TunnelEndpoint {
        endpoint: Endpoint::new(
            SocketAddr::from((Ipv4Addr::new(185, 213, 154, 68), 51820)),
            TransportProtocol::Udp,
        ),
        quantum_resistant: true,
        obfuscation: Some(ObfuscationEndpoint {
            endpoint: Endpoint::new(
                SocketAddr::from((Ipv4Addr::new(185, 213, 154, 68), 443)),
                TransportProtocol::Tcp,
            ),
            obfuscation_type: ObfuscationType::Udp2Tcp,
        }),
        entry_endpoint: None,
        tunnel_interface: Some("wg0".to_string()),
        daita: false,
    }
}

#[test]
fn tunnel_state_round_trips() {
    let states = [
        TunnelState::Disconnected {
            location: None,
            locked_down: true,
        },
        TunnelState::Connecting {
            endpoint: tunnel_endpoint(),
            location: None,
        },
        TunnelState::Connected {
            endpoint: tunnel_endpoint(),
            location: None,
        },
        TunnelState::Disconnecting(ActionAfterDisconnect::Reconnect),
        TunnelState::Error(ErrorState::new(
            ErrorStateCause::AuthFailed(Some(AuthFailed::ExpiredAccount.as_str().to_string())),
            None,
        )),
        TunnelState::Error(ErrorState::new(
            ErrorStateCause::TunnelParameterError(ParameterGenerationError::NoMatchingRelay),
            None,
        )),
    ];

    for state in states {
        let proto = crate::TunnelState::from(state.clone());
        let back = TunnelState::try_from(proto).unwrap();
        assert_eq!(state, back);
    }
}

#[test]
fn settings_round_trip() {
    let mut settings = Settings::default();
    settings.allow_lan = true;
    settings.auto_connect = true;
    settings.tunnel_options.wireguard.mtu = Some(1380);
    settings.relay_settings = RelaySettings::Normal(RelayConstraints {
        location: Constraint::Only(LocationConstraint::Location(
            GeographicLocationConstraint::City("se".to_string(), "got".to_string()),
        )),
        ..RelayConstraints::default()
    });

    let proto = crate::Settings::from(&settings);
    let back = Settings::try_from(proto).unwrap();
    assert_eq!(settings, back);
}

#[test]
fn settings_survive_the_wire_format() {
    let settings = Settings::default();
    let proto = crate::Settings::from(&settings);

    let encoded = proto.encode_to_vec();
    let decoded = crate::Settings::decode(&*encoded).unwrap();
    assert_eq!(proto, decoded);
    assert_eq!(Settings::try_from(decoded).unwrap(), settings);
}

#[test]
fn relay_list_round_trip() {
    let list = RelayList {
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
                    ipv6_addr_in: Some("2a03:1b20:5:f011::a01f".parse().unwrap()),
                    include_in_country: true,
                    active: true,
                    owned: true,
                    provider: "31173".to_string(),
                    weight: 100,
                    endpoint_data: RelayEndpointData::Wireguard(WireguardRelayEndpointData {
                        public_key: [3u8; 32],
                        daita: true,
                        quic_addr_in: vec!["185.213.154.69".parse().unwrap()],
                        shadowsocks_extra_ports: vec![8443],
                    }),
                }],
            }],
        }],
    };

    let proto = crate::RelayList::from(list.clone());
    let back = RelayList::try_from(proto).unwrap();
    assert_eq!(list, back);
}

#[test]
fn access_method_round_trip() {
    let methods = [
        access_method::AccessMethodSetting::new(
            "Direct".to_string(),
            true,
            access_method::AccessMethod::BuiltIn(access_method::BuiltInAccessMethod::Direct),
        ),
        access_method::AccessMethodSetting::new(
            "backup proxy".to_string(),
            false,
            access_method::AccessMethod::Custom(CustomProxy::Socks5Remote(
                Socks5Remote::new_with_authentication(
                    "10.8.0.1:1080".parse().unwrap(),
                    SocksAuth {
                        username: "user".to_string(),
                        password: "secret".to_string(),
                    },
                ),
            )),
        ),
        access_method::AccessMethodSetting::new(
            "ss".to_string(),
            true,
            access_method::AccessMethod::Custom(CustomProxy::Shadowsocks(Shadowsocks::new(
                "192.0.2.1:443".parse().unwrap(),
                "aes-256-gcm".to_string(),
                "hunter2".to_string(),
            ))),
        ),
    ];

    for method in methods {
        let proto = crate::AccessMethodSetting::from(method.clone());
        let back = access_method::AccessMethodSetting::try_from(proto).unwrap();
        assert_eq!(method, back);
    }
}

#[test]
fn tunnel_state_oneof_defaults_to_unset() {
    let state = crate::TunnelState::default();
    assert!(state.state.is_none());
    assert!(TunnelState::try_from(state).is_err());
}

// Merging two encoded messages must keep only the variant set last, per the
// protobuf oneof merge rules.
#[test]
fn tunnel_state_oneof_is_exclusive() {
    use crate::tunnel_state::State;

    let disconnected = crate::TunnelState::from(TunnelState::Disconnected {
        location: None,
        locked_down: false,
    });
    let disconnecting =
        crate::TunnelState::from(TunnelState::Disconnecting(ActionAfterDisconnect::Nothing));

    let mut buf = disconnected.encode_to_vec();
    buf.extend(disconnecting.encode_to_vec());

    let merged = crate::TunnelState::decode(&*buf).unwrap();
    assert!(matches!(merged.state, Some(State::Disconnecting(_))));
}
