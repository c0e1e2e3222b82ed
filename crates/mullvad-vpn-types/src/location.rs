// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

pub type CountryCode = String;
pub type CityCode = String;

/// The location the daemon believes the device appears from, as reported to
/// frontends. All fields beyond the country are best-effort.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoIpLocation {
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
    pub country: String,
    pub city: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub mullvad_exit_ip: bool,
    pub hostname: Option<String>,
    pub bridge_hostname: Option<String>,
    pub entry_hostname: Option<String>,
    pub obfuscator_hostname: Option<String>,
}
