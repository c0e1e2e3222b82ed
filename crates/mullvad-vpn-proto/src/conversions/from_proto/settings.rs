// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::str::FromStr;

use mullvad_vpn_types::{
    access_method, custom_list,
    net::proxy::CustomProxy,
    relay_constraints::{
        BridgeConstraints, BridgeSettings, BridgeState, BridgeType, CustomTunnelEndpoint,
        GeographicLocationConstraint, LocationConstraint, ObfuscationSettings, Ownership,
        Providers, RelayConstraints, RelayOverride, RelaySettings, SelectedObfuscation,
        ShadowsocksSettings, Udp2TcpObfuscationSettings, WireguardConstraints,
    },
    settings::{
        CustomDnsOptions, DefaultDnsOptions, DnsOptions, DnsState, GenericTunnelOptions,
        OpenVpnTunnelOptions, Settings, TunnelOptions,
    },
    split_tunnel::SplitTunnelSettings,
    wireguard, Constraint,
};

use crate::conversions::{
    error::ConversionError,
    from_proto::net::port_from_u32,
    util::{arg_from_str, key_from_bytes},
};

impl TryFrom<crate::Settings> for Settings {
    type Error = ConversionError;

    fn try_from(settings: crate::Settings) -> Result<Self, Self::Error> {
        Ok(Settings {
            relay_settings: RelaySettings::try_from(
                settings
                    .relay_settings
                    .ok_or(ConversionError::Missing("relay settings"))?,
            )?,
            bridge_settings: BridgeSettings::try_from(
                settings
                    .bridge_settings
                    .ok_or(ConversionError::Missing("bridge settings"))?,
            )?,
            bridge_state: try_bridge_state_from_i32(
                settings
                    .bridge_state
                    .ok_or(ConversionError::Missing("bridge state"))?
                    .state,
            )?,
            obfuscation_settings: ObfuscationSettings::try_from(
                settings
                    .obfuscation_settings
                    .ok_or(ConversionError::Missing("obfuscation settings"))?,
            )?,
            allow_lan: settings.allow_lan,
            block_when_disconnected: settings.block_when_disconnected,
            auto_connect: settings.auto_connect,
            show_beta_releases: settings.show_beta_releases,
            tunnel_options: TunnelOptions::try_from(
                settings
                    .tunnel_options
                    .ok_or(ConversionError::Missing("tunnel options"))?,
            )?,
            split_tunnel: settings
                .split_tunnel
                .map(SplitTunnelSettings::from)
                .unwrap_or_default(),
            custom_lists: custom_list::CustomListsSettings::try_from(
                settings
                    .custom_lists
                    .ok_or(ConversionError::Missing("custom lists"))?,
            )?,
            api_access_methods: access_method::Settings::try_from(
                settings
                    .api_access_methods
                    .ok_or(ConversionError::Missing("api access methods"))?,
            )?,
            relay_overrides: settings
                .relay_overrides
                .into_iter()
                .map(RelayOverride::try_from)
                .collect::<Result<Vec<_>, _>>()?,
            recents: settings
                .recents
                .map(|recents| {
                    recents
                        .recents
                        .into_iter()
                        .map(|location| {
                            Constraint::<LocationConstraint>::try_from(location)?
                                .option()
                                .ok_or(ConversionError::Missing("recent location"))
                        })
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()?,
        })
    }
}

pub fn try_bridge_state_from_i32(state: i32) -> Result<BridgeState, ConversionError> {
    match crate::bridge_state::State::try_from(state) {
        Ok(crate::bridge_state::State::Auto) => Ok(BridgeState::Auto),
        Ok(crate::bridge_state::State::On) => Ok(BridgeState::On),
        Ok(crate::bridge_state::State::Off) => Ok(BridgeState::Off),
        Err(_) => Err(ConversionError::InvalidValue("bridge state")),
    }
}

impl TryFrom<crate::TunnelOptions> for TunnelOptions {
    type Error = ConversionError;

    fn try_from(options: crate::TunnelOptions) -> Result<Self, Self::Error> {
        let openvpn = options
            .openvpn
            .ok_or(ConversionError::Missing("openvpn options"))?;
        let wireguard = options
            .wireguard
            .ok_or(ConversionError::Missing("wireguard options"))?;
        let generic = options
            .generic
            .ok_or(ConversionError::Missing("generic options"))?;
        let dns_options = options
            .dns_options
            .ok_or(ConversionError::Missing("dns options"))?;

        Ok(TunnelOptions {
            openvpn: OpenVpnTunnelOptions {
                mssfix: if openvpn.mssfix != 0 {
                    Some(port_from_u32(openvpn.mssfix)?)
                } else {
                    None
                },
            },
            wireguard: wireguard::TunnelOptions {
                mtu: if wireguard.mtu != 0 {
                    Some(port_from_u32(wireguard.mtu)?)
                } else {
                    None
                },
                rotation_interval: wireguard
                    .rotation_interval
                    .map(std::time::Duration::try_from)
                    .transpose()
                    .map_err(|_| ConversionError::InvalidValue("rotation interval"))?
                    .map(wireguard::RotationInterval::try_from)
                    .transpose()
                    .map_err(|_| ConversionError::InvalidValue("rotation interval"))?,
                quantum_resistant: try_quantum_resistant_state(
                    wireguard
                        .quantum_resistant
                        .ok_or(ConversionError::Missing("quantum resistant state"))?,
                )?,
                daita: wireguard
                    .daita
                    .map(wireguard::DaitaSettings::from)
                    .unwrap_or_default(),
            },
            generic: GenericTunnelOptions {
                enable_ipv6: generic.enable_ipv6,
            },
            dns_options: DnsOptions::try_from(dns_options)?,
        })
    }
}

pub fn try_quantum_resistant_state(
    state: crate::QuantumResistantState,
) -> Result<wireguard::QuantumResistantState, ConversionError> {
    use crate::quantum_resistant_state::State;

    match State::try_from(state.state) {
        Ok(State::Auto) => Ok(wireguard::QuantumResistantState::Auto),
        Ok(State::On) => Ok(wireguard::QuantumResistantState::On),
        Ok(State::Off) => Ok(wireguard::QuantumResistantState::Off),
        Err(_) => Err(ConversionError::InvalidValue("quantum resistant state")),
    }
}

impl From<crate::DaitaSettings> for wireguard::DaitaSettings {
    fn from(settings: crate::DaitaSettings) -> Self {
        wireguard::DaitaSettings {
            enabled: settings.enabled,
            use_multihop_if_necessary: settings.use_multihop_if_necessary,
        }
    }
}

impl TryFrom<crate::DnsOptions> for DnsOptions {
    type Error = ConversionError;

    fn try_from(options: crate::DnsOptions) -> Result<Self, Self::Error> {
        use crate::dns_options;

        let state = match dns_options::DnsState::try_from(options.state) {
            Ok(dns_options::DnsState::Default) => DnsState::Default,
            Ok(dns_options::DnsState::Custom) => DnsState::Custom,
            Err(_) => return Err(ConversionError::InvalidValue("dns state")),
        };

        let default_options = options
            .default_options
            .ok_or(ConversionError::Missing("default dns options"))?;
        let custom_options = options
            .custom_options
            .ok_or(ConversionError::Missing("custom dns options"))?;

        Ok(DnsOptions {
            state,
            default_options: DefaultDnsOptions {
                block_ads: default_options.block_ads,
                block_trackers: default_options.block_trackers,
                block_malware: default_options.block_malware,
                block_adult_content: default_options.block_adult_content,
                block_gambling: default_options.block_gambling,
                block_social_media: default_options.block_social_media,
            },
            custom_options: CustomDnsOptions {
                addresses: custom_options
                    .addresses
                    .into_iter()
                    .map(|addr| arg_from_str(&addr, "custom resolver address"))
                    .collect::<Result<Vec<_>, _>>()?,
            },
        })
    }
}

impl From<crate::SplitTunnelSettings> for SplitTunnelSettings {
    fn from(settings: crate::SplitTunnelSettings) -> Self {
        SplitTunnelSettings {
            enable_exclusions: settings.enable_exclusions,
            apps: settings
                .apps
                .into_iter()
                .map(std::path::PathBuf::from)
                .collect(),
        }
    }
}

impl TryFrom<crate::RelaySettings> for RelaySettings {
    type Error = ConversionError;

    fn try_from(settings: crate::RelaySettings) -> Result<Self, Self::Error> {
        use crate::relay_settings::Endpoint;

        match settings
            .endpoint
            .ok_or(ConversionError::Missing("relay settings endpoint"))?
        {
            Endpoint::Normal(normal) => Ok(RelaySettings::Normal(RelayConstraints::try_from(
                normal,
            )?)),
            Endpoint::Custom(custom) => {
                Ok(RelaySettings::CustomTunnelEndpoint(CustomTunnelEndpoint {
                    host: custom.host,
                    config: wireguard::ConnectionConfig::try_from(
                        custom
                            .config
                            .ok_or(ConversionError::Missing("custom endpoint config"))?,
                    )?,
                }))
            }
        }
    }
}

impl TryFrom<crate::NormalRelaySettings> for RelayConstraints {
    type Error = ConversionError;

    fn try_from(settings: crate::NormalRelaySettings) -> Result<Self, Self::Error> {
        Ok(RelayConstraints {
            location: settings
                .location
                .map(Constraint::<LocationConstraint>::try_from)
                .transpose()?
                .unwrap_or(Constraint::Any),
            providers: try_providers_constraint(&settings.providers)?,
            ownership: try_ownership_constraint_from_i32(settings.ownership)?,
            wireguard_constraints: WireguardConstraints::try_from(
                settings
                    .wireguard_constraints
                    .ok_or(ConversionError::Missing("wireguard constraints"))?,
            )?,
        })
    }
}

impl TryFrom<crate::WireguardConstraints> for WireguardConstraints {
    type Error = ConversionError;

    fn try_from(constraints: crate::WireguardConstraints) -> Result<Self, Self::Error> {
        let ip_version = match constraints.ip_version {
            Some(version) => Some(mullvad_vpn_types::net::IpVersion::from(
                crate::IpVersion::try_from(version)
                    .map_err(|_| ConversionError::InvalidValue("ip version"))?,
            )),
            None => None,
        };

        Ok(WireguardConstraints {
            port: Constraint::from(
                constraints.port.map(port_from_u32).transpose()?,
            ),
            ip_version: Constraint::from(ip_version),
            allowed_ips: constraints
                .allowed_ips
                .iter()
                .map(|network| arg_from_str(network, "allowed ip network"))
                .collect::<Result<Vec<_>, _>>()?,
            use_multihop: constraints.use_multihop,
            entry_location: constraints
                .entry_location
                .map(Constraint::<LocationConstraint>::try_from)
                .transpose()?
                .unwrap_or(Constraint::Any),
            entry_providers: try_providers_constraint(&constraints.entry_providers)?,
            entry_ownership: try_ownership_constraint_from_i32(constraints.entry_ownership)?,
        })
    }
}

impl TryFrom<crate::WireguardConfig> for wireguard::ConnectionConfig {
    type Error = ConversionError;

    fn try_from(config: crate::WireguardConfig) -> Result<Self, Self::Error> {
        let tunnel = config
            .tunnel
            .ok_or(ConversionError::Missing("tunnel config"))?;
        let peer = config.peer.ok_or(ConversionError::Missing("peer config"))?;

        Ok(wireguard::ConnectionConfig {
            tunnel: wireguard::TunnelConfig {
                private_key: key_from_bytes(&tunnel.private_key, "private key")?,
                addresses: tunnel
                    .addresses
                    .iter()
                    .map(|addr| arg_from_str(addr, "tunnel address"))
                    .collect::<Result<Vec<_>, _>>()?,
            },
            peer: wireguard::PeerConfig {
                public_key: key_from_bytes(&peer.public_key, "public key")?,
                allowed_ips: peer
                    .allowed_ips
                    .iter()
                    .map(|network| arg_from_str(network, "allowed ip network"))
                    .collect::<Result<Vec<_>, _>>()?,
                endpoint: arg_from_str(&peer.endpoint, "peer endpoint")?,
            },
            ipv4_gateway: arg_from_str(&config.ipv4_gateway, "ipv4 gateway")?,
            ipv6_gateway: config
                .ipv6_gateway
                .map(|addr| arg_from_str(&addr, "ipv6 gateway"))
                .transpose()?,
        })
    }
}

impl TryFrom<crate::LocationConstraint> for Constraint<LocationConstraint> {
    type Error = ConversionError;

    fn try_from(location: crate::LocationConstraint) -> Result<Self, Self::Error> {
        use crate::location_constraint::Type;

        match location.r#type {
            Some(Type::Location(location)) => Ok(Constraint::Only(LocationConstraint::Location(
                GeographicLocationConstraint::try_from(location)?,
            ))),
            Some(Type::CustomList(list_id)) => Ok(Constraint::Only(
                LocationConstraint::CustomList {
                    list_id: custom_list::Id::from_str(&list_id)
                        .map_err(|_| ConversionError::InvalidValue("custom list id"))?,
                },
            )),
            None => Ok(Constraint::Any),
        }
    }
}

impl TryFrom<crate::GeographicLocationConstraint> for GeographicLocationConstraint {
    type Error = ConversionError;

    fn try_from(location: crate::GeographicLocationConstraint) -> Result<Self, Self::Error> {
        match (location.country, location.city, location.hostname) {
            (country, None, None) => Ok(GeographicLocationConstraint::Country(country)),
            (country, Some(city), None) => Ok(GeographicLocationConstraint::City(country, city)),
            (country, Some(city), Some(hostname)) => Ok(GeographicLocationConstraint::Hostname(
                country, city, hostname,
            )),
            (_country, None, Some(_hostname)) => Err(ConversionError::InvalidValue(
                "location with hostname but no city",
            )),
        }
    }
}

pub fn try_providers_constraint(
    providers: &[String],
) -> Result<Constraint<Providers>, ConversionError> {
    if providers.is_empty() {
        return Ok(Constraint::Any);
    }
    Ok(Constraint::Only(
        Providers::new(providers.iter().cloned())
            .map_err(|_| ConversionError::InvalidValue("providers"))?,
    ))
}

pub fn try_ownership_constraint_from_i32(
    ownership: i32,
) -> Result<Constraint<Ownership>, ConversionError> {
    match crate::Ownership::try_from(ownership) {
        Ok(crate::Ownership::Any) => Ok(Constraint::Any),
        Ok(crate::Ownership::MullvadOwned) => Ok(Constraint::Only(Ownership::MullvadOwned)),
        Ok(crate::Ownership::Rented) => Ok(Constraint::Only(Ownership::Rented)),
        Err(_) => Err(ConversionError::InvalidValue("ownership")),
    }
}

impl TryFrom<crate::ObfuscationSettings> for ObfuscationSettings {
    type Error = ConversionError;

    fn try_from(settings: crate::ObfuscationSettings) -> Result<Self, Self::Error> {
        use crate::obfuscation_settings::SelectedObfuscation as ProtoSelectedObfuscation;

        let selected_obfuscation =
            match ProtoSelectedObfuscation::try_from(settings.selected_obfuscation) {
                Ok(ProtoSelectedObfuscation::Auto) => SelectedObfuscation::Auto,
                Ok(ProtoSelectedObfuscation::Off) => SelectedObfuscation::Off,
                Ok(ProtoSelectedObfuscation::Udp2tcp) => SelectedObfuscation::Udp2Tcp,
                Ok(ProtoSelectedObfuscation::Shadowsocks) => SelectedObfuscation::Shadowsocks,
                Ok(ProtoSelectedObfuscation::Quic) => SelectedObfuscation::Quic,
                Err(_) => return Err(ConversionError::InvalidValue("selected obfuscation")),
            };

        let udp2tcp = settings
            .udp2tcp
            .ok_or(ConversionError::Missing("udp2tcp settings"))?;
        let shadowsocks = settings
            .shadowsocks
            .ok_or(ConversionError::Missing("shadowsocks settings"))?;

        Ok(ObfuscationSettings {
            selected_obfuscation,
            udp2tcp: Udp2TcpObfuscationSettings {
                port: Constraint::from(udp2tcp.port.map(port_from_u32).transpose()?),
            },
            shadowsocks: ShadowsocksSettings {
                port: Constraint::from(shadowsocks.port.map(port_from_u32).transpose()?),
            },
        })
    }
}

impl TryFrom<crate::BridgeSettings> for BridgeSettings {
    type Error = ConversionError;

    fn try_from(settings: crate::BridgeSettings) -> Result<Self, Self::Error> {
        use crate::bridge_settings::BridgeType as ProtoBridgeType;

        let bridge_type = match ProtoBridgeType::try_from(settings.bridge_type) {
            Ok(ProtoBridgeType::Normal) => BridgeType::Normal,
            Ok(ProtoBridgeType::Custom) => BridgeType::Custom,
            Err(_) => return Err(ConversionError::InvalidValue("bridge type")),
        };

        let constraints = settings
            .normal
            .ok_or(ConversionError::Missing("normal bridge constraints"))?;

        Ok(BridgeSettings {
            bridge_type,
            normal: BridgeConstraints {
                location: constraints
                    .location
                    .map(Constraint::<LocationConstraint>::try_from)
                    .transpose()?
                    .unwrap_or(Constraint::Any),
                providers: try_providers_constraint(&constraints.providers)?,
                ownership: try_ownership_constraint_from_i32(constraints.ownership)?,
            },
            custom: settings.custom.map(CustomProxy::try_from).transpose()?,
        })
    }
}

impl TryFrom<crate::RelayOverride> for RelayOverride {
    type Error = ConversionError;

    fn try_from(relay_override: crate::RelayOverride) -> Result<Self, Self::Error> {
        Ok(RelayOverride {
            hostname: relay_override.hostname,
            ipv4_addr_in: relay_override
                .ipv4_addr_in
                .map(|addr| arg_from_str(&addr, "IPv4 override address"))
                .transpose()?,
            ipv6_addr_in: relay_override
                .ipv6_addr_in
                .map(|addr| arg_from_str(&addr, "IPv6 override address"))
                .transpose()?,
        })
    }
}

impl TryFrom<crate::CustomListSettings> for custom_list::CustomListsSettings {
    type Error = ConversionError;

    fn try_from(settings: crate::CustomListSettings) -> Result<Self, Self::Error> {
        Ok(custom_list::CustomListsSettings::from(
            settings
                .custom_lists
                .into_iter()
                .map(custom_list::CustomList::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }
}

impl TryFrom<crate::CustomList> for custom_list::CustomList {
    type Error = ConversionError;

    fn try_from(list: crate::CustomList) -> Result<Self, Self::Error> {
        Ok(custom_list::CustomList {
            id: custom_list::Id::from_str(&list.id)
                .map_err(|_| ConversionError::InvalidValue("custom list id"))?,
            name: list.name,
            locations: list
                .locations
                .into_iter()
                .map(GeographicLocationConstraint::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

impl TryFrom<crate::ApiAccessMethodSettings> for access_method::Settings {
    type Error = ConversionError;

    fn try_from(settings: crate::ApiAccessMethodSettings) -> Result<Self, Self::Error> {
        Ok(access_method::Settings {
            access_method_settings: settings
                .access_method_settings
                .into_iter()
                .map(access_method::AccessMethodSetting::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

impl TryFrom<crate::AccessMethodSetting> for access_method::AccessMethodSetting {
    type Error = ConversionError;

    fn try_from(setting: crate::AccessMethodSetting) -> Result<Self, Self::Error> {
        let id = access_method::Id::try_from(
            setting
                .id
                .ok_or(ConversionError::Missing("access method id"))?,
        )?;
        let access_method = access_method::AccessMethod::try_from(
            setting
                .access_method
                .ok_or(ConversionError::Missing("access method"))?,
        )?;

        Ok(access_method::AccessMethodSetting::with_id(
            id,
            setting.name,
            setting.enabled,
            access_method,
        ))
    }
}

impl TryFrom<crate::Uuid> for access_method::Id {
    type Error = ConversionError;

    fn try_from(uuid: crate::Uuid) -> Result<Self, Self::Error> {
        access_method::Id::from_str(&uuid.value)
            .map_err(|_| ConversionError::InvalidValue("access method id"))
    }
}

impl TryFrom<crate::AccessMethod> for access_method::AccessMethod {
    type Error = ConversionError;

    fn try_from(method: crate::AccessMethod) -> Result<Self, Self::Error> {
        use access_method::BuiltInAccessMethod;
        use crate::access_method::AccessMethod as ProtoAccessMethod;

        let method = match method
            .access_method
            .ok_or(ConversionError::Missing("access method"))?
        {
            ProtoAccessMethod::Direct(_) => {
                access_method::AccessMethod::from(BuiltInAccessMethod::Direct)
            }
            ProtoAccessMethod::Bridges(_) => {
                access_method::AccessMethod::from(BuiltInAccessMethod::Bridge)
            }
            ProtoAccessMethod::EncryptedDnsProxy(_) => {
                access_method::AccessMethod::from(BuiltInAccessMethod::EncryptedDnsProxy)
            }
            ProtoAccessMethod::Socks5local(local) => access_method::AccessMethod::from(
                CustomProxy::Socks5Local(local.try_into()?),
            ),
            ProtoAccessMethod::Socks5remote(remote) => access_method::AccessMethod::from(
                CustomProxy::Socks5Remote(remote.try_into()?),
            ),
            ProtoAccessMethod::Shadowsocks(shadowsocks) => access_method::AccessMethod::from(
                CustomProxy::Shadowsocks(shadowsocks.try_into()?),
            ),
        };

        Ok(method)
    }
}
