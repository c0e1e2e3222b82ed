// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::{
    access_method,
    custom_list::CustomListsSettings,
    relay_constraints::{
        BridgeSettings, BridgeState, LocationConstraint, ObfuscationSettings, RelayOverride,
        RelaySettings,
    },
    split_tunnel::SplitTunnelSettings,
    wireguard,
};

/// The complete, persisted daemon configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub relay_settings: RelaySettings,
    pub bridge_settings: BridgeSettings,
    pub bridge_state: BridgeState,
    pub obfuscation_settings: ObfuscationSettings,
    pub allow_lan: bool,
    /// Keep blocking outgoing traffic while disconnected.
    pub block_when_disconnected: bool,
    pub auto_connect: bool,
    pub show_beta_releases: bool,
    pub tunnel_options: TunnelOptions,
    pub split_tunnel: SplitTunnelSettings,
    pub custom_lists: CustomListsSettings,
    pub api_access_methods: access_method::Settings,
    pub relay_overrides: Vec<RelayOverride>,
    /// Recently used locations. `None` means the feature is disabled.
    pub recents: Option<Vec<LocationConstraint>>,
}

impl Settings {
    pub fn set_relay_override(&mut self, relay_override: RelayOverride) {
        // An override with no addresses removes any existing entry.
        if relay_override.is_empty() {
            self.relay_overrides
                .retain(|other| other.hostname != relay_override.hostname);
            return;
        }
        let existing = self
            .relay_overrides
            .iter_mut()
            .find(|other| other.hostname == relay_override.hostname);
        match existing {
            Some(entry) => *entry = relay_override,
            None => self.relay_overrides.push(relay_override),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelOptions {
    pub openvpn: OpenVpnTunnelOptions,
    pub wireguard: wireguard::TunnelOptions,
    pub generic: GenericTunnelOptions,
    pub dns_options: DnsOptions,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenVpnTunnelOptions {
    pub mssfix: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericTunnelOptions {
    pub enable_ipv6: bool,
}

impl Default for GenericTunnelOptions {
    fn default() -> Self {
        Self { enable_ipv6: true }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DnsState {
    #[default]
    Default,
    Custom,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsOptions {
    pub state: DnsState,
    pub default_options: DefaultDnsOptions,
    pub custom_options: CustomDnsOptions,
}

impl DnsOptions {
    /// The custom resolvers in effect, if any.
    pub fn custom_addresses(&self) -> Option<&[IpAddr]> {
        match self.state {
            DnsState::Default => None,
            DnsState::Custom => Some(&self.custom_options.addresses),
        }
    }
}

/// Content-blocker toggles applied when using the default relay resolver.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultDnsOptions {
    pub block_ads: bool,
    pub block_trackers: bool,
    pub block_malware: bool,
    pub block_adult_content: bool,
    pub block_gambling: bool,
    pub block_social_media: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomDnsOptions {
    pub addresses: Vec<IpAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn default_settings_round_trip_through_toml() {
        let settings = Settings::default();
        let serialized = toml::to_string(&settings).unwrap();
        let deserialized: Settings = toml::from_str(&serialized).unwrap();
        assert_eq!(settings, deserialized);
    }

    #[test]
    fn custom_dns_only_active_in_custom_state() {
        let mut options = DnsOptions::default();
        options.custom_options.addresses = vec![IpAddr::V4(Ipv4Addr::new(10, 64, 0, 1))];
        assert_eq!(options.custom_addresses(), None);

        options.state = DnsState::Custom;
        assert_eq!(options.custom_addresses().map(|a| a.len()), Some(1));
    }

    #[test]
    fn empty_override_removes_existing_entry() {
        let mut settings = Settings::default();
        settings.set_relay_override(RelayOverride {
            hostname: "se-got-wg-001".to_string(),
            ipv4_addr_in: Some(Ipv4Addr::new(10, 0, 0, 1)),
            ipv6_addr_in: None,
        });
        assert_eq!(settings.relay_overrides.len(), 1);

        settings.set_relay_override(RelayOverride::empty("se-got-wg-001".to_string()));
        assert!(settings.relay_overrides.is_empty());
    }
}
