// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

//! The country → city → relay tree handed to frontends and used by the relay
//! selector.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

use crate::location::{CityCode, CountryCode};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayList {
    pub countries: Vec<RelayListCountry>,
}

impl RelayList {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn lookup_country(&self, code: &str) -> Option<&RelayListCountry> {
        self.countries.iter().find(|country| country.code == code)
    }

    /// Flat iterator over every relay together with its country and city.
    pub fn relays(&self) -> impl Iterator<Item = (&RelayListCountry, &RelayListCity, &Relay)> {
        self.countries.iter().flat_map(|country| {
            country
                .cities
                .iter()
                .flat_map(move |city| city.relays.iter().map(move |relay| (country, city, relay)))
        })
    }

    pub fn lookup_relay(&self, hostname: &str) -> Option<(&RelayListCountry, &RelayListCity, &Relay)> {
        self.relays().find(|(_, _, relay)| relay.hostname == hostname)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayListCountry {
    pub name: String,
    pub code: CountryCode,
    pub cities: Vec<RelayListCity>,
}

impl RelayListCountry {
    pub fn lookup_city(&self, code: &str) -> Option<&RelayListCity> {
        self.cities.iter().find(|city| city.code == code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayListCity {
    pub name: String,
    pub code: CityCode,
    pub latitude: f64,
    pub longitude: f64,
    pub relays: Vec<Relay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relay {
    pub hostname: String,
    pub ipv4_addr_in: Ipv4Addr,
    pub ipv6_addr_in: Option<Ipv6Addr>,
    pub include_in_country: bool,
    pub active: bool,
    pub owned: bool,
    pub provider: String,
    pub weight: u64,
    pub endpoint_data: RelayEndpointData,
}

impl Relay {
    pub fn is_wireguard(&self) -> bool {
        matches!(self.endpoint_data, RelayEndpointData::Wireguard(_))
    }
}

/// What kind of endpoint the relay provides, along with its capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayEndpointData {
    Bridge,
    Wireguard(WireguardRelayEndpointData),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireguardRelayEndpointData {
    pub public_key: [u8; 32],
    pub daita: bool,
    pub quic_addr_in: Vec<IpAddr>,
    pub shadowsocks_extra_ports: Vec<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_with_one_relay() -> RelayList {
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
                            daita: true,
                            quic_addr_in: Vec::new(),
                            shadowsocks_extra_ports: vec![8443],
                        }),
                    }],
                }],
            }],
        }
    }

    #[test]
    fn relay_lookup_by_hostname() {
        let list = list_with_one_relay();
        let (country, city, relay) = list.lookup_relay("se-got-wg-001").unwrap();
        assert_eq!(country.code, "se");
        assert_eq!(city.code, "got");
        assert!(relay.is_wireguard());
        assert!(list.lookup_relay("se-got-wg-999").is_none());
    }
}
