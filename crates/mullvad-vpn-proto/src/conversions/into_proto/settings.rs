// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use mullvad_vpn_types::{
    access_method, custom_list,
    relay_constraints::{
        BridgeConstraints, BridgeSettings, BridgeState, BridgeType, GeographicLocationConstraint,
        LocationConstraint, ObfuscationSettings, Ownership, Providers, RelayConstraints,
        RelayOverride, RelaySettings, SelectedObfuscation, WireguardConstraints,
    },
    settings::{DnsOptions, DnsState, Settings, TunnelOptions},
    split_tunnel::SplitTunnelSettings,
    wireguard, Constraint,
};

impl From<&Settings> for crate::Settings {
    fn from(settings: &Settings) -> Self {
        crate::Settings {
            relay_settings: Some(crate::RelaySettings::from(settings.relay_settings.clone())),
            bridge_settings: Some(crate::BridgeSettings::from(
                settings.bridge_settings.clone(),
            )),
            bridge_state: Some(crate::BridgeState::from(settings.bridge_state)),
            allow_lan: settings.allow_lan,
            block_when_disconnected: settings.block_when_disconnected,
            auto_connect: settings.auto_connect,
            tunnel_options: Some(crate::TunnelOptions::from(&settings.tunnel_options)),
            show_beta_releases: settings.show_beta_releases,
            split_tunnel: Some(crate::SplitTunnelSettings::from(&settings.split_tunnel)),
            obfuscation_settings: Some(crate::ObfuscationSettings::from(
                &settings.obfuscation_settings,
            )),
            custom_lists: Some(crate::CustomListSettings::from(&settings.custom_lists)),
            api_access_methods: Some(crate::ApiAccessMethodSettings::from(
                &settings.api_access_methods,
            )),
            relay_overrides: settings
                .relay_overrides
                .iter()
                .cloned()
                .map(crate::RelayOverride::from)
                .collect(),
            recents: settings.recents.clone().map(|recents| crate::Recents {
                recents: recents
                    .into_iter()
                    .map(crate::LocationConstraint::from)
                    .collect(),
            }),
        }
    }
}

impl From<&TunnelOptions> for crate::TunnelOptions {
    fn from(options: &TunnelOptions) -> Self {
        crate::TunnelOptions {
            openvpn: Some(crate::tunnel_options::OpenvpnOptions {
                mssfix: options.openvpn.mssfix.map(u32::from).unwrap_or_default(),
            }),
            wireguard: Some(crate::tunnel_options::WireguardOptions {
                mtu: options.wireguard.mtu.map(u32::from).unwrap_or_default(),
                rotation_interval: options.wireguard.rotation_interval.and_then(|interval| {
                    prost_types::Duration::try_from(*interval.as_duration()).ok()
                }),
                quantum_resistant: Some(crate::QuantumResistantState::from(
                    options.wireguard.quantum_resistant,
                )),
                daita: Some(crate::DaitaSettings::from(options.wireguard.daita)),
            }),
            generic: Some(crate::tunnel_options::GenericOptions {
                enable_ipv6: options.generic.enable_ipv6,
            }),
            dns_options: Some(crate::DnsOptions::from(&options.dns_options)),
        }
    }
}

impl From<wireguard::QuantumResistantState> for crate::QuantumResistantState {
    fn from(state: wireguard::QuantumResistantState) -> Self {
        use crate::quantum_resistant_state::State;

        crate::QuantumResistantState {
            state: i32::from(match state {
                wireguard::QuantumResistantState::Auto => State::Auto,
                wireguard::QuantumResistantState::On => State::On,
                wireguard::QuantumResistantState::Off => State::Off,
            }),
        }
    }
}

impl From<wireguard::DaitaSettings> for crate::DaitaSettings {
    fn from(settings: wireguard::DaitaSettings) -> Self {
        crate::DaitaSettings {
            enabled: settings.enabled,
            use_multihop_if_necessary: settings.use_multihop_if_necessary,
        }
    }
}

impl From<&DnsOptions> for crate::DnsOptions {
    fn from(options: &DnsOptions) -> Self {
        use crate::dns_options;

        crate::DnsOptions {
            state: i32::from(match options.state {
                DnsState::Default => dns_options::DnsState::Default,
                DnsState::Custom => dns_options::DnsState::Custom,
            }),
            default_options: Some(dns_options::DefaultOptions {
                block_ads: options.default_options.block_ads,
                block_trackers: options.default_options.block_trackers,
                block_malware: options.default_options.block_malware,
                block_adult_content: options.default_options.block_adult_content,
                block_gambling: options.default_options.block_gambling,
                block_social_media: options.default_options.block_social_media,
            }),
            custom_options: Some(dns_options::CustomOptions {
                addresses: options
                    .custom_options
                    .addresses
                    .iter()
                    .map(|addr| addr.to_string())
                    .collect(),
            }),
        }
    }
}

impl From<&SplitTunnelSettings> for crate::SplitTunnelSettings {
    fn from(settings: &SplitTunnelSettings) -> Self {
        crate::SplitTunnelSettings {
            enable_exclusions: settings.enable_exclusions,
            apps: settings
                .apps
                .iter()
                .map(|app| app.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

impl From<RelaySettings> for crate::RelaySettings {
    fn from(settings: RelaySettings) -> Self {
        use crate::relay_settings;

        let endpoint = match settings {
            RelaySettings::Normal(constraints) => {
                relay_settings::Endpoint::Normal(crate::NormalRelaySettings::from(constraints))
            }
            RelaySettings::CustomTunnelEndpoint(endpoint) => {
                relay_settings::Endpoint::Custom(crate::CustomRelaySettings {
                    host: endpoint.host,
                    config: Some(crate::WireguardConfig::from(endpoint.config)),
                })
            }
        };

        crate::RelaySettings {
            endpoint: Some(endpoint),
        }
    }
}

impl From<RelayConstraints> for crate::NormalRelaySettings {
    fn from(constraints: RelayConstraints) -> Self {
        crate::NormalRelaySettings {
            location: constraints
                .location
                .option()
                .map(crate::LocationConstraint::from),
            providers: providers_to_vec(&constraints.providers),
            ownership: i32::from(crate::Ownership::from(constraints.ownership)),
            wireguard_constraints: Some(crate::WireguardConstraints::from(
                constraints.wireguard_constraints,
            )),
        }
    }
}

impl From<WireguardConstraints> for crate::WireguardConstraints {
    fn from(constraints: WireguardConstraints) -> Self {
        crate::WireguardConstraints {
            port: constraints.port.option().map(u32::from),
            ip_version: constraints
                .ip_version
                .option()
                .map(|version| i32::from(crate::IpVersion::from(version))),
            allowed_ips: constraints
                .allowed_ips
                .iter()
                .map(|network| network.to_string())
                .collect(),
            use_multihop: constraints.use_multihop,
            entry_location: constraints
                .entry_location
                .option()
                .map(crate::LocationConstraint::from),
            entry_providers: providers_to_vec(&constraints.entry_providers),
            entry_ownership: i32::from(crate::Ownership::from(constraints.entry_ownership)),
        }
    }
}

impl From<wireguard::ConnectionConfig> for crate::WireguardConfig {
    fn from(config: wireguard::ConnectionConfig) -> Self {
        crate::WireguardConfig {
            tunnel: Some(crate::wireguard_config::TunnelConfig {
                private_key: config.tunnel.private_key.to_vec(),
                addresses: config
                    .tunnel
                    .addresses
                    .iter()
                    .map(|addr| addr.to_string())
                    .collect(),
            }),
            peer: Some(crate::wireguard_config::PeerConfig {
                public_key: config.peer.public_key.to_vec(),
                allowed_ips: config
                    .peer
                    .allowed_ips
                    .iter()
                    .map(|network| network.to_string())
                    .collect(),
                endpoint: config.peer.endpoint.to_string(),
            }),
            ipv4_gateway: config.ipv4_gateway.to_string(),
            ipv6_gateway: config.ipv6_gateway.map(|addr| addr.to_string()),
        }
    }
}

impl From<LocationConstraint> for crate::LocationConstraint {
    fn from(location: LocationConstraint) -> Self {
        use crate::location_constraint;

        let r#type = match location {
            LocationConstraint::Location(location) => location_constraint::Type::Location(
                crate::GeographicLocationConstraint::from(location),
            ),
            LocationConstraint::CustomList { list_id } => {
                location_constraint::Type::CustomList(list_id.to_string())
            }
        };

        crate::LocationConstraint {
            r#type: Some(r#type),
        }
    }
}

impl From<GeographicLocationConstraint> for crate::GeographicLocationConstraint {
    fn from(location: GeographicLocationConstraint) -> Self {
        match location {
            GeographicLocationConstraint::Country(country) => {
                crate::GeographicLocationConstraint {
                    country,
                    city: None,
                    hostname: None,
                }
            }
            GeographicLocationConstraint::City(country, city) => {
                crate::GeographicLocationConstraint {
                    country,
                    city: Some(city),
                    hostname: None,
                }
            }
            GeographicLocationConstraint::Hostname(country, city, hostname) => {
                crate::GeographicLocationConstraint {
                    country,
                    city: Some(city),
                    hostname: Some(hostname),
                }
            }
        }
    }
}

impl From<Constraint<Ownership>> for crate::Ownership {
    fn from(ownership: Constraint<Ownership>) -> Self {
        match ownership {
            Constraint::Any => crate::Ownership::Any,
            Constraint::Only(Ownership::MullvadOwned) => crate::Ownership::MullvadOwned,
            Constraint::Only(Ownership::Rented) => crate::Ownership::Rented,
        }
    }
}

pub(crate) fn providers_to_vec(providers: &Constraint<Providers>) -> Vec<String> {
    match providers.as_ref() {
        Constraint::Any => Vec::new(),
        Constraint::Only(providers) => Vec::from(providers.clone()),
    }
}

impl From<&ObfuscationSettings> for crate::ObfuscationSettings {
    fn from(settings: &ObfuscationSettings) -> Self {
        use crate::obfuscation_settings::SelectedObfuscation as ProtoSelectedObfuscation;

        crate::ObfuscationSettings {
            selected_obfuscation: i32::from(match settings.selected_obfuscation {
                SelectedObfuscation::Auto => ProtoSelectedObfuscation::Auto,
                SelectedObfuscation::Off => ProtoSelectedObfuscation::Off,
                SelectedObfuscation::Udp2Tcp => ProtoSelectedObfuscation::Udp2tcp,
                SelectedObfuscation::Shadowsocks => ProtoSelectedObfuscation::Shadowsocks,
                SelectedObfuscation::Quic => ProtoSelectedObfuscation::Quic,
            }),
            udp2tcp: Some(crate::obfuscation_settings::Udp2TcpObfuscation {
                port: settings.udp2tcp.port.option().map(u32::from),
            }),
            shadowsocks: Some(crate::obfuscation_settings::Shadowsocks {
                port: settings.shadowsocks.port.option().map(u32::from),
            }),
        }
    }
}

impl From<BridgeSettings> for crate::BridgeSettings {
    fn from(settings: BridgeSettings) -> Self {
        use crate::bridge_settings;

        crate::BridgeSettings {
            bridge_type: i32::from(match settings.bridge_type {
                BridgeType::Normal => bridge_settings::BridgeType::Normal,
                BridgeType::Custom => bridge_settings::BridgeType::Custom,
            }),
            normal: Some(bridge_settings::BridgeConstraints::from(settings.normal)),
            custom: settings.custom.map(crate::CustomProxy::from),
        }
    }
}

impl From<BridgeConstraints> for crate::bridge_settings::BridgeConstraints {
    fn from(constraints: BridgeConstraints) -> Self {
        crate::bridge_settings::BridgeConstraints {
            location: constraints
                .location
                .option()
                .map(crate::LocationConstraint::from),
            providers: providers_to_vec(&constraints.providers),
            ownership: i32::from(crate::Ownership::from(constraints.ownership)),
        }
    }
}

impl From<BridgeState> for crate::BridgeState {
    fn from(state: BridgeState) -> Self {
        use crate::bridge_state::State;

        crate::BridgeState {
            state: i32::from(match state {
                BridgeState::Auto => State::Auto,
                BridgeState::On => State::On,
                BridgeState::Off => State::Off,
            }),
        }
    }
}

impl From<RelayOverride> for crate::RelayOverride {
    fn from(relay_override: RelayOverride) -> Self {
        crate::RelayOverride {
            hostname: relay_override.hostname,
            ipv4_addr_in: relay_override.ipv4_addr_in.map(|addr| addr.to_string()),
            ipv6_addr_in: relay_override.ipv6_addr_in.map(|addr| addr.to_string()),
        }
    }
}

impl From<&custom_list::CustomListsSettings> for crate::CustomListSettings {
    fn from(settings: &custom_list::CustomListsSettings) -> Self {
        crate::CustomListSettings {
            custom_lists: settings.iter().cloned().map(crate::CustomList::from).collect(),
        }
    }
}

impl From<custom_list::CustomList> for crate::CustomList {
    fn from(list: custom_list::CustomList) -> Self {
        crate::CustomList {
            id: list.id.to_string(),
            name: list.name,
            locations: list
                .locations
                .into_iter()
                .map(crate::GeographicLocationConstraint::from)
                .collect(),
        }
    }
}

impl From<&access_method::Settings> for crate::ApiAccessMethodSettings {
    fn from(settings: &access_method::Settings) -> Self {
        crate::ApiAccessMethodSettings {
            access_method_settings: settings
                .access_method_settings
                .iter()
                .cloned()
                .map(crate::AccessMethodSetting::from)
                .collect(),
        }
    }
}

impl From<access_method::AccessMethodSetting> for crate::AccessMethodSetting {
    fn from(setting: access_method::AccessMethodSetting) -> Self {
        crate::AccessMethodSetting {
            id: Some(crate::Uuid::from(setting.id)),
            name: setting.name,
            enabled: setting.enabled,
            access_method: Some(crate::AccessMethod::from(setting.access_method)),
        }
    }
}

impl From<access_method::Id> for crate::Uuid {
    fn from(id: access_method::Id) -> Self {
        crate::Uuid {
            value: id.to_string(),
        }
    }
}

impl From<access_method::AccessMethod> for crate::AccessMethod {
    fn from(method: access_method::AccessMethod) -> Self {
        use access_method::BuiltInAccessMethod;
        use crate::access_method::AccessMethod as ProtoAccessMethod;
        use mullvad_vpn_types::net::proxy::CustomProxy;

        let access_method = match method {
            access_method::AccessMethod::BuiltIn(BuiltInAccessMethod::Direct) => {
                ProtoAccessMethod::Direct(crate::access_method::Direct {})
            }
            access_method::AccessMethod::BuiltIn(BuiltInAccessMethod::Bridge) => {
                ProtoAccessMethod::Bridges(crate::access_method::Bridges {})
            }
            access_method::AccessMethod::BuiltIn(BuiltInAccessMethod::EncryptedDnsProxy) => {
                ProtoAccessMethod::EncryptedDnsProxy(crate::access_method::EncryptedDnsProxy {})
            }
            access_method::AccessMethod::Custom(CustomProxy::Socks5Local(local)) => {
                ProtoAccessMethod::Socks5local(crate::Socks5Local::from(local))
            }
            access_method::AccessMethod::Custom(CustomProxy::Socks5Remote(remote)) => {
                ProtoAccessMethod::Socks5remote(crate::Socks5Remote::from(remote))
            }
            access_method::AccessMethod::Custom(CustomProxy::Shadowsocks(shadowsocks)) => {
                ProtoAccessMethod::Shadowsocks(crate::Shadowsocks::from(shadowsocks))
            }
        };

        crate::AccessMethod {
            access_method: Some(access_method),
        }
    }
}
