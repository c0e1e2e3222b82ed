// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use mullvad_vpn_types::relay_list::{
    Relay, RelayEndpointData, RelayList, RelayListCity, RelayListCountry,
    WireguardRelayEndpointData,
};

use crate::conversions::{
    error::ConversionError,
    from_proto::net::port_from_u32,
    util::{arg_from_str, key_from_bytes},
};

impl TryFrom<crate::RelayList> for RelayList {
    type Error = ConversionError;

    fn try_from(list: crate::RelayList) -> Result<Self, Self::Error> {
        Ok(RelayList {
            countries: list
                .countries
                .into_iter()
                .map(RelayListCountry::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

impl TryFrom<crate::RelayListCountry> for RelayListCountry {
    type Error = ConversionError;

    fn try_from(country: crate::RelayListCountry) -> Result<Self, Self::Error> {
        Ok(RelayListCountry {
            name: country.name,
            code: country.code,
            cities: country
                .cities
                .into_iter()
                .map(RelayListCity::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

impl TryFrom<crate::RelayListCity> for RelayListCity {
    type Error = ConversionError;

    fn try_from(city: crate::RelayListCity) -> Result<Self, Self::Error> {
        Ok(RelayListCity {
            name: city.name,
            code: city.code,
            latitude: city.latitude,
            longitude: city.longitude,
            relays: city
                .relays
                .into_iter()
                .map(Relay::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

impl TryFrom<crate::Relay> for Relay {
    type Error = ConversionError;

    fn try_from(relay: crate::Relay) -> Result<Self, Self::Error> {
        Ok(Relay {
            hostname: relay.hostname,
            ipv4_addr_in: arg_from_str(&relay.ipv4_addr_in, "relay IPv4 address")?,
            ipv6_addr_in: relay
                .ipv6_addr_in
                .map(|addr| arg_from_str(&addr, "relay IPv6 address"))
                .transpose()?,
            include_in_country: relay.include_in_country,
            active: relay.active,
            owned: relay.owned,
            provider: relay.provider,
            weight: relay.weight,
            endpoint_data: RelayEndpointData::try_from(
                relay
                    .endpoint_data
                    .ok_or(ConversionError::Missing("relay endpoint data"))?,
            )?,
        })
    }
}

impl TryFrom<crate::RelayEndpointData> for RelayEndpointData {
    type Error = ConversionError;

    fn try_from(data: crate::RelayEndpointData) -> Result<Self, Self::Error> {
        use crate::relay_endpoint_data::EndpointType;

        match data
            .endpoint_type
            .ok_or(ConversionError::Missing("relay endpoint type"))?
        {
            EndpointType::Bridge(()) => Ok(RelayEndpointData::Bridge),
            EndpointType::Wireguard(wireguard) => Ok(RelayEndpointData::Wireguard(
                WireguardRelayEndpointData::try_from(wireguard)?,
            )),
        }
    }
}

impl TryFrom<crate::relay_endpoint_data::WireguardRelayEndpointData>
    for WireguardRelayEndpointData
{
    type Error = ConversionError;

    fn try_from(
        data: crate::relay_endpoint_data::WireguardRelayEndpointData,
    ) -> Result<Self, Self::Error> {
        Ok(WireguardRelayEndpointData {
            public_key: key_from_bytes(&data.public_key, "relay public key")?,
            daita: data.daita,
            quic_addr_in: data
                .quic_addr_in
                .iter()
                .map(|addr| arg_from_str(addr, "QUIC address"))
                .collect::<Result<Vec<_>, _>>()?,
            shadowsocks_extra_ports: data
                .shadowsocks_extra_ports
                .into_iter()
                .map(port_from_u32)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}
