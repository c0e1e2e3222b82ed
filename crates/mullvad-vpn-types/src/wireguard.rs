// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    time::Duration,
};

use base64::engine::{general_purpose::STANDARD as BASE64, Engine};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};

/// Default automatic key rotation interval.
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(60 * 60 * 24);
pub const MIN_ROTATION_INTERVAL: Duration = Duration::from_secs(60 * 60 * 24);
pub const MAX_ROTATION_INTERVAL: Duration = Duration::from_secs(60 * 60 * 24 * 30);

/// A device WireGuard public key and when it was generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub key: [u8; 32],
    #[serde(with = "time::serde::rfc3339")]
    pub created: time::OffsetDateTime,
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BASE64.encode(self.key))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantumResistantState {
    #[default]
    Auto,
    On,
    Off,
}

impl fmt::Display for QuantumResistantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantumResistantState::Auto => write!(f, "auto"),
            QuantumResistantState::On => write!(f, "on"),
            QuantumResistantState::Off => write!(f, "off"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaitaSettings {
    pub enabled: bool,
    pub use_multihop_if_necessary: bool,
}

/// Key rotation interval, bounded to [1, 30] days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RotationInterval(Duration);

impl RotationInterval {
    pub fn as_duration(&self) -> &Duration {
        &self.0
    }
}

impl TryFrom<Duration> for RotationInterval {
    type Error = RotationIntervalError;

    fn try_from(duration: Duration) -> Result<Self, Self::Error> {
        if duration < MIN_ROTATION_INTERVAL || duration > MAX_ROTATION_INTERVAL {
            return Err(RotationIntervalError(duration));
        }
        Ok(RotationInterval(duration))
    }
}

impl Default for RotationInterval {
    fn default() -> Self {
        RotationInterval(DEFAULT_ROTATION_INTERVAL)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("rotation interval {0:?} is outside the allowed range")]
pub struct RotationIntervalError(Duration);

/// User-tweakable WireGuard tunnel behavior, part of the settings.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelOptions {
    pub mtu: Option<u16>,
    pub rotation_interval: Option<RotationInterval>,
    pub quantum_resistant: QuantumResistantState,
    pub daita: DaitaSettings,
}

/// A full custom WireGuard endpoint configuration, used when relay selection
/// is bypassed entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub tunnel: TunnelConfig,
    pub peer: PeerConfig,
    pub ipv4_gateway: Ipv4Addr,
    pub ipv6_gateway: Option<Ipv6Addr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TunnelConfig {
    pub private_key: [u8; 32],
    pub addresses: Vec<IpAddr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerConfig {
    pub public_key: [u8; 32],
    pub allowed_ips: Vec<IpNetwork>,
    pub endpoint: SocketAddr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_interval_bounds() {
        assert!(RotationInterval::try_from(Duration::from_secs(60)).is_err());
        assert!(RotationInterval::try_from(MIN_ROTATION_INTERVAL).is_ok());
        assert!(RotationInterval::try_from(MAX_ROTATION_INTERVAL).is_ok());
        assert!(
            RotationInterval::try_from(MAX_ROTATION_INTERVAL + Duration::from_secs(1)).is_err()
        );
    }
}
