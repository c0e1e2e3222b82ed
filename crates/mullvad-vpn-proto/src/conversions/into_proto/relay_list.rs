// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use mullvad_vpn_types::relay_list::{
    Relay, RelayEndpointData, RelayList, RelayListCity, RelayListCountry,
    WireguardRelayEndpointData,
};

impl From<RelayList> for crate::RelayList {
    fn from(list: RelayList) -> Self {
        crate::RelayList {
            countries: list
                .countries
                .into_iter()
                .map(crate::RelayListCountry::from)
                .collect(),
        }
    }
}

impl From<RelayListCountry> for crate::RelayListCountry {
    fn from(country: RelayListCountry) -> Self {
        crate::RelayListCountry {
            name: country.name,
            code: country.code,
            cities: country
                .cities
                .into_iter()
                .map(crate::RelayListCity::from)
                .collect(),
        }
    }
}

impl From<RelayListCity> for crate::RelayListCity {
    fn from(city: RelayListCity) -> Self {
        crate::RelayListCity {
            name: city.name,
            code: city.code,
            latitude: city.latitude,
            longitude: city.longitude,
            relays: city.relays.into_iter().map(crate::Relay::from).collect(),
        }
    }
}

impl From<Relay> for crate::Relay {
    fn from(relay: Relay) -> Self {
        crate::Relay {
            hostname: relay.hostname,
            ipv4_addr_in: relay.ipv4_addr_in.to_string(),
            ipv6_addr_in: relay.ipv6_addr_in.map(|addr| addr.to_string()),
            include_in_country: relay.include_in_country,
            active: relay.active,
            owned: relay.owned,
            provider: relay.provider,
            weight: relay.weight,
            endpoint_data: Some(crate::RelayEndpointData::from(relay.endpoint_data)),
        }
    }
}

impl From<RelayEndpointData> for crate::RelayEndpointData {
    fn from(data: RelayEndpointData) -> Self {
        use crate::relay_endpoint_data::EndpointType;

        let endpoint_type = match data {
            RelayEndpointData::Bridge => EndpointType::Bridge(()),
            RelayEndpointData::Wireguard(wireguard) => EndpointType::Wireguard(
                crate::relay_endpoint_data::WireguardRelayEndpointData::from(wireguard),
            ),
        };

        crate::RelayEndpointData {
            endpoint_type: Some(endpoint_type),
        }
    }
}

impl From<WireguardRelayEndpointData> for crate::relay_endpoint_data::WireguardRelayEndpointData {
    fn from(data: WireguardRelayEndpointData) -> Self {
        crate::relay_endpoint_data::WireguardRelayEndpointData {
            public_key: data.public_key.to_vec(),
            daita: data.daita,
            quic_addr_in: data.quic_addr_in.iter().map(|addr| addr.to_string()).collect(),
            shadowsocks_extra_ports: data
                .shadowsocks_extra_ports
                .iter()
                .copied()
                .map(u32::from)
                .collect(),
        }
    }
}
