// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

//! Relay selection at the management level: filter the relay tree by the
//! user's constraints and pick a weighted-random candidate.

use std::net::{IpAddr, SocketAddr};

use rand::Rng;

use mullvad_vpn_types::{
    custom_list::CustomListsSettings,
    location::GeoIpLocation,
    net::{Endpoint, ObfuscationEndpoint, ObfuscationType, TransportProtocol, TunnelEndpoint},
    relay_constraints::{
        LocationConstraint, ObfuscationSettings, Ownership, Providers, RelayConstraints,
        RelayOverride, SelectedObfuscation,
    },
    relay_list::{Relay, RelayEndpointData, RelayList, RelayListCity, RelayListCountry},
    settings::Settings,
    states::ParameterGenerationError,
    Constraint,
};

const DEFAULT_WIREGUARD_PORT: u16 = 51820;
const DEFAULT_UDP2TCP_PORT: u16 = 443;
const DEFAULT_SHADOWSOCKS_PORT: u16 = 443;
const DEFAULT_QUIC_PORT: u16 = 443;

pub(crate) struct SelectedRelay {
    pub endpoint: TunnelEndpoint,
    pub location: GeoIpLocation,
}

struct Candidate<'a> {
    country: &'a RelayListCountry,
    city: &'a RelayListCity,
    relay: &'a Relay,
}

pub(crate) fn select_tunnel_endpoint(
    relay_list: &RelayList,
    settings: &Settings,
    constraints: &RelayConstraints,
) -> Result<SelectedRelay, ParameterGenerationError> {
    let exit = pick_relay(
        relay_list,
        &constraints.location,
        &constraints.providers,
        &constraints.ownership,
        &settings.custom_lists,
    )
    .ok_or(ParameterGenerationError::NoMatchingRelay)?;

    let wg = &constraints.wireguard_constraints;
    let entry = if wg.use_multihop {
        Some(
            pick_relay(
                relay_list,
                &wg.entry_location,
                &wg.entry_providers,
                &wg.entry_ownership,
                &settings.custom_lists,
            )
            .ok_or(ParameterGenerationError::NoMatchingRelay)?,
        )
    } else {
        None
    };

    let port = wg.port.option().unwrap_or(DEFAULT_WIREGUARD_PORT);
    let exit_addr = relay_address(exit.relay, &settings.relay_overrides);
    let obfuscation = obfuscation_endpoint(&settings.obfuscation_settings, exit.relay, exit_addr);

    let daita_enabled = settings.tunnel_options.wireguard.daita.enabled
        && matches!(
            &exit.relay.endpoint_data,
            RelayEndpointData::Wireguard(data) if data.daita
        );

    let endpoint = TunnelEndpoint {
        endpoint: Endpoint::new(SocketAddr::new(exit_addr, port), TransportProtocol::Udp),
        quantum_resistant: matches!(
            settings.tunnel_options.wireguard.quantum_resistant,
            mullvad_vpn_types::wireguard::QuantumResistantState::On
        ),
        obfuscation,
        entry_endpoint: entry.as_ref().map(|entry| {
            Endpoint::new(
                SocketAddr::new(
                    relay_address(entry.relay, &settings.relay_overrides),
                    DEFAULT_WIREGUARD_PORT,
                ),
                TransportProtocol::Udp,
            )
        }),
        tunnel_interface: None,
        daita: daita_enabled,
    };

    let location = GeoIpLocation {
        ipv4: match exit_addr {
            IpAddr::V4(addr) => Some(addr),
            IpAddr::V6(_) => None,
        },
        ipv6: None,
        country: exit.country.name.clone(),
        city: Some(exit.city.name.clone()),
        latitude: exit.city.latitude,
        longitude: exit.city.longitude,
        mullvad_exit_ip: true,
        hostname: Some(exit.relay.hostname.clone()),
        bridge_hostname: None,
        entry_hostname: entry.map(|entry| entry.relay.hostname.clone()),
        obfuscator_hostname: None,
    };

    Ok(SelectedRelay { endpoint, location })
}

fn pick_relay<'a>(
    relay_list: &'a RelayList,
    location: &Constraint<LocationConstraint>,
    providers: &Constraint<Providers>,
    ownership: &Constraint<Ownership>,
    custom_lists: &CustomListsSettings,
) -> Option<Candidate<'a>> {
    let candidates = matching_relays(relay_list, location, providers, ownership, custom_lists);
    pick_weighted(candidates)
}

fn matching_relays<'a>(
    relay_list: &'a RelayList,
    location: &Constraint<LocationConstraint>,
    providers: &Constraint<Providers>,
    ownership: &Constraint<Ownership>,
    custom_lists: &CustomListsSettings,
) -> Vec<Candidate<'a>> {
    relay_list
        .relays()
        .filter(|(_, _, relay)| relay.active && relay.is_wireguard())
        .filter(|(country, city, relay)| {
            location_matches(location, custom_lists, &country.code, &city.code, relay)
        })
        .filter(|(_, _, relay)|

            providers.matches_with(&relay.provider, |providers, provider| {
                providers.contains(provider)
            }))
        .filter(|(_, _, relay)| {
            ownership.matches_with(&relay.owned, |ownership, owned| ownership.matches(*owned))
        })
        .map(|(country, city, relay)| Candidate {
            country,
            city,
            relay,
        })
        .collect()
}

fn location_matches(
    location: &Constraint<LocationConstraint>,
    custom_lists: &CustomListsSettings,
    country: &str,
    city: &str,
    relay: &Relay,
) -> bool {
    match location {
        Constraint::Any => true,
        Constraint::Only(LocationConstraint::Location(geo)) => {
            geo.matches(country, city, &relay.hostname)
        }
        Constraint::Only(LocationConstraint::CustomList { list_id }) => custom_lists
            .find(list_id)
            .map(|list| {
                list.locations
                    .iter()
                    .any(|geo| geo.matches(country, city, &relay.hostname))
            })
            .unwrap_or(false),
    }
}

fn pick_weighted(candidates: Vec<Candidate<'_>>) -> Option<Candidate<'_>> {
    let total_weight: u64 = candidates.iter().map(|candidate| candidate.relay.weight).sum();
    if candidates.is_empty() {
        return None;
    }
    if total_weight == 0 {
        let index = rand::thread_rng().gen_range(0..candidates.len());
        return candidates.into_iter().nth(index);
    }
    let mut remaining = rand::thread_rng().gen_range(0..total_weight);
    candidates.into_iter().find(|candidate| {
        if remaining < candidate.relay.weight {
            true
        } else {
            remaining -= candidate.relay.weight;
            false
        }
    })
}

fn relay_address(relay: &Relay, overrides: &[RelayOverride]) -> IpAddr {
    overrides
        .iter()
        .find(|relay_override| relay_override.hostname == relay.hostname)
        .and_then(|relay_override| relay_override.ipv4_addr_in)
        .map(IpAddr::V4)
        .unwrap_or(IpAddr::V4(relay.ipv4_addr_in))
}

fn obfuscation_endpoint(
    settings: &ObfuscationSettings,
    relay: &Relay,
    relay_addr: IpAddr,
) -> Option<ObfuscationEndpoint> {
    let (obfuscation_type, address, port) = match settings.selected_obfuscation {
        SelectedObfuscation::Off | SelectedObfuscation::Auto => return None,
        SelectedObfuscation::Udp2Tcp => (
            ObfuscationType::Udp2Tcp,
            relay_addr,
            settings.udp2tcp.port.option().unwrap_or(DEFAULT_UDP2TCP_PORT),
        ),
        SelectedObfuscation::Shadowsocks => {
            let port = settings.shadowsocks.port.option().or_else(|| {
                match &relay.endpoint_data {
                    RelayEndpointData::Wireguard(data) => {
                        data.shadowsocks_extra_ports.first().copied()
                    }
                    RelayEndpointData::Bridge => None,
                }
            });
            (
                ObfuscationType::Shadowsocks,
                relay_addr,
                port.unwrap_or(DEFAULT_SHADOWSOCKS_PORT),
            )
        }
        SelectedObfuscation::Quic => {
            let address = match &relay.endpoint_data {
                RelayEndpointData::Wireguard(data) => data.quic_addr_in.first().copied()?,
                RelayEndpointData::Bridge => return None,
            };
            (ObfuscationType::Quic, address, DEFAULT_QUIC_PORT)
        }
    };

    let protocol = match obfuscation_type {
        ObfuscationType::Udp2Tcp | ObfuscationType::Shadowsocks => TransportProtocol::Tcp,
        ObfuscationType::Quic => TransportProtocol::Udp,
    };

    Some(ObfuscationEndpoint {
        endpoint: Endpoint::new(SocketAddr::new(address, port), protocol),
        obfuscation_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mullvad_vpn_types::{
        custom_list::CustomList,
        relay_constraints::GeographicLocationConstraint,
        relay_list::WireguardRelayEndpointData,
    };
    use std::net::Ipv4Addr;

    fn relay(hostname: &str, owned: bool, provider: &str) -> Relay {
        Relay {
            hostname: hostname.to_string(),
            ipv4_addr_in: Ipv4Addr::new(185, 213, 154, 68),
            ipv6_addr_in: None,
            include_in_country: true,
            active: true,
            owned,
            provider: provider.to_string(),
            weight: 100,
            endpoint_data: RelayEndpointData::Wireguard(WireguardRelayEndpointData {
                public_key: [1u8; 32],
                daita: false,
                quic_addr_in: Vec::new(),
                shadowsocks_extra_ports: Vec::new(),
            }),
        }
    }

    fn relay_list() -> RelayList {
        RelayList {
            countries: vec![
                RelayListCountry {
                    name: "Sweden".to_string(),
                    code: "se".to_string(),
                    cities: vec![RelayListCity {
                        name: "Gothenburg".to_string(),
                        code: "got".to_string(),
                        latitude: 57.7,
                        longitude: 11.97,
                        relays: vec![
                            relay("se-got-wg-001", true, "31173"),
                            relay("se-got-wg-002", false, "100TB"),
                        ],
                    }],
                },
                RelayListCountry {
                    name: "Germany".to_string(),
                    code: "de".to_string(),
                    cities: vec![RelayListCity {
                        name: "Frankfurt".to_string(),
                        code: "fra".to_string(),
                        latitude: 50.11,
                        longitude: 8.68,
                        relays: vec![relay("de-fra-wg-001", false, "31173")],
                    }],
                },
            ],
        }
    }

    #[test]
    fn country_constraint_filters_candidates() {
        let list = relay_list();
        let custom_lists = CustomListsSettings::default();
        let location = Constraint::Only(LocationConstraint::Location(
            GeographicLocationConstraint::Country("de".to_string()),
        ));

        let candidates = matching_relays(
            &list,
            &location,
            &Constraint::Any,
            &Constraint::Any,
            &custom_lists,
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].relay.hostname, "de-fra-wg-001");
    }

    #[test]
    fn ownership_and_provider_constraints() {
        let list = relay_list();
        let custom_lists = CustomListsSettings::default();

        let owned = matching_relays(
            &list,
            &Constraint::Any,
            &Constraint::Any,
            &Constraint::Only(Ownership::MullvadOwned),
            &custom_lists,
        );
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].relay.hostname, "se-got-wg-001");

        let providers = Constraint::Only(Providers::new(["31173".to_string()]).unwrap());
        let by_provider = matching_relays(
            &list,
            &Constraint::Any,
            &providers,
            &Constraint::Any,
            &custom_lists,
        );
        assert_eq!(by_provider.len(), 2);
    }

    #[test]
    fn custom_list_constraint_resolves_members() {
        let list = relay_list();
        let mut custom_lists = CustomListsSettings::default();
        let mut germany = CustomList::new("germany".to_string());
        germany
            .locations
            .push(GeographicLocationConstraint::Country("de".to_string()));
        let list_id = germany.id;
        custom_lists.add(germany).unwrap();

        let location = Constraint::Only(LocationConstraint::CustomList { list_id });
        let candidates = matching_relays(
            &list,
            &location,
            &Constraint::Any,
            &Constraint::Any,
            &custom_lists,
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].relay.hostname, "de-fra-wg-001");
    }

    #[test]
    fn no_matching_relay_is_an_error() {
        let list = relay_list();
        let settings = Settings::default();
        let constraints = RelayConstraints {
            location: Constraint::Only(LocationConstraint::Location(
                GeographicLocationConstraint::Country("xx".to_string()),
            )),
            ..RelayConstraints::default()
        };

        let result = select_tunnel_endpoint(&list, &settings, &constraints);
        assert!(matches!(
            result,
            Err(ParameterGenerationError::NoMatchingRelay)
        ));
    }

    #[test]
    fn selection_produces_exit_location() {
        let list = relay_list();
        let settings = Settings::default();
        let constraints = RelayConstraints {
            location: Constraint::Only(LocationConstraint::Location(
                GeographicLocationConstraint::Hostname(
                    "se".to_string(),
                    "got".to_string(),
                    "se-got-wg-001".to_string(),
                ),
            )),
            ..RelayConstraints::default()
        };

        let selected = select_tunnel_endpoint(&list, &settings, &constraints).unwrap();
        assert_eq!(selected.location.hostname.as_deref(), Some("se-got-wg-001"));
        assert_eq!(selected.location.country, "Sweden");
        assert!(selected.location.mullvad_exit_ip);
        assert_eq!(
            selected.endpoint.endpoint.address.port(),
            DEFAULT_WIREGUARD_PORT
        );
    }
}
