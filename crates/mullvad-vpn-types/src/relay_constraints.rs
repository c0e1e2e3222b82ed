// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

//! Constraints the user places on relay selection, and the obfuscation and
//! bridge settings that travel with them.

use std::{
    fmt,
    net::{Ipv4Addr, Ipv6Addr},
};

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

use crate::{
    constraints::Constraint,
    custom_list,
    net::{proxy::CustomProxy, IpVersion},
    wireguard::ConnectionConfig,
};

/// Whether to let the relay selector pick a relay from the list, or to
/// connect to a fixed user-supplied endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelaySettings {
    Normal(RelayConstraints),
    CustomTunnelEndpoint(CustomTunnelEndpoint),
}

impl Default for RelaySettings {
    fn default() -> Self {
        RelaySettings::Normal(RelayConstraints::default())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConstraints {
    pub location: Constraint<LocationConstraint>,
    pub providers: Constraint<Providers>,
    pub ownership: Constraint<Ownership>,
    pub wireguard_constraints: WireguardConstraints,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireguardConstraints {
    pub port: Constraint<u16>,
    pub ip_version: Constraint<IpVersion>,
    pub allowed_ips: Vec<IpNetwork>,
    pub use_multihop: bool,
    pub entry_location: Constraint<LocationConstraint>,
    pub entry_providers: Constraint<Providers>,
    pub entry_ownership: Constraint<Ownership>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomTunnelEndpoint {
    pub host: String,
    pub config: ConnectionConfig,
}

/// Either a place in the built-in relay tree or a reference to a custom list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationConstraint {
    Location(GeographicLocationConstraint),
    CustomList { list_id: custom_list::Id },
}

impl From<GeographicLocationConstraint> for LocationConstraint {
    fn from(location: GeographicLocationConstraint) -> Self {
        LocationConstraint::Location(location)
    }
}

/// A whole country, a city within a country, or a single relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeographicLocationConstraint {
    Country(String),
    City(String, String),
    Hostname(String, String, String),
}

impl GeographicLocationConstraint {
    pub fn country(&self) -> &str {
        match self {
            GeographicLocationConstraint::Country(country)
            | GeographicLocationConstraint::City(country, _)
            | GeographicLocationConstraint::Hostname(country, _, _) => country,
        }
    }

    pub fn matches(&self, country: &str, city: &str, hostname: &str) -> bool {
        match self {
            GeographicLocationConstraint::Country(ref const_country) => const_country == country,
            GeographicLocationConstraint::City(ref const_country, ref const_city) => {
                const_country == country && const_city == city
            }
            GeographicLocationConstraint::Hostname(
                ref const_country,
                ref const_city,
                ref const_hostname,
            ) => const_country == country && const_city == city && const_hostname == hostname,
        }
    }
}

impl fmt::Display for GeographicLocationConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeographicLocationConstraint::Country(country) => write!(f, "{country}"),
            GeographicLocationConstraint::City(country, city) => write!(f, "{city}, {country}"),
            GeographicLocationConstraint::Hostname(country, city, hostname) => {
                write!(f, "{hostname} in {city}, {country}")
            }
        }
    }
}

/// A non-empty set of hosting providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Providers(Vec<String>);

impl Providers {
    pub fn new(providers: impl IntoIterator<Item = String>) -> Result<Self, NoProviders> {
        let providers: Vec<String> = providers.into_iter().collect();
        if providers.is_empty() {
            return Err(NoProviders);
        }
        Ok(Providers(providers))
    }

    pub fn contains(&self, provider: &str) -> bool {
        self.0.iter().any(|p| p == provider)
    }
}

impl From<Providers> for Vec<String> {
    fn from(providers: Providers) -> Self {
        providers.0
    }
}

#[derive(Debug, thiserror::Error)]
#[error("provider list may not be empty")]
pub struct NoProviders;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    MullvadOwned,
    Rented,
}

impl Ownership {
    pub fn matches(self, owned: bool) -> bool {
        match self {
            Ownership::MullvadOwned => owned,
            Ownership::Rented => !owned,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportPort {
    pub protocol: crate::net::TransportProtocol,
    pub port: Constraint<u16>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObfuscationSettings {
    pub selected_obfuscation: SelectedObfuscation,
    pub udp2tcp: Udp2TcpObfuscationSettings,
    pub shadowsocks: ShadowsocksSettings,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectedObfuscation {
    #[default]
    Auto,
    Off,
    Udp2Tcp,
    Shadowsocks,
    Quic,
}

impl fmt::Display for SelectedObfuscation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectedObfuscation::Auto => write!(f, "auto"),
            SelectedObfuscation::Off => write!(f, "off"),
            SelectedObfuscation::Udp2Tcp => write!(f, "udp2tcp"),
            SelectedObfuscation::Shadowsocks => write!(f, "shadowsocks"),
            SelectedObfuscation::Quic => write!(f, "quic"),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Udp2TcpObfuscationSettings {
    pub port: Constraint<u16>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowsocksSettings {
    pub port: Constraint<u16>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeState {
    #[default]
    Auto,
    On,
    Off,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeType {
    #[default]
    Normal,
    Custom,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConstraints {
    pub location: Constraint<LocationConstraint>,
    pub providers: Constraint<Providers>,
    pub ownership: Constraint<Ownership>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeSettings {
    pub bridge_type: BridgeType,
    pub normal: BridgeConstraints,
    pub custom: Option<CustomProxy>,
}

/// Replaces the listed addresses of the relay with the given hostname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayOverride {
    pub hostname: String,
    pub ipv4_addr_in: Option<Ipv4Addr>,
    pub ipv6_addr_in: Option<Ipv6Addr>,
}

impl RelayOverride {
    pub fn empty(hostname: String) -> Self {
        Self {
            hostname,
            ipv4_addr_in: None,
            ipv6_addr_in: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ipv4_addr_in.is_none() && self.ipv6_addr_in.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geographic_constraint_narrowing() {
        let country = GeographicLocationConstraint::Country("se".to_string());
        let city = GeographicLocationConstraint::City("se".to_string(), "got".to_string());
        let host = GeographicLocationConstraint::Hostname(
            "se".to_string(),
            "got".to_string(),
            "se-got-wg-001".to_string(),
        );

        assert!(country.matches("se", "got", "se-got-wg-001"));
        assert!(country.matches("se", "sto", "se-sto-wg-001"));
        assert!(city.matches("se", "got", "se-got-wg-002"));
        assert!(!city.matches("se", "sto", "se-sto-wg-001"));
        assert!(host.matches("se", "got", "se-got-wg-001"));
        assert!(!host.matches("se", "got", "se-got-wg-002"));
    }

    #[test]
    fn ownership_matching() {
        assert!(Ownership::MullvadOwned.matches(true));
        assert!(!Ownership::MullvadOwned.matches(false));
        assert!(Ownership::Rented.matches(false));
    }

    #[test]
    fn providers_must_be_non_empty() {
        assert!(Providers::new(Vec::new()).is_err());
        assert!(Providers::new(["31173".to_string()]).is_ok());
    }
}
