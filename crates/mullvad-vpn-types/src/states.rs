// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

//! Tunnel state as reported over the management interface, and the error
//! taxonomy carried inside the blocked state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{location::GeoIpLocation, net::TunnelEndpoint};

/// The state the user wants the daemon to be in, as opposed to the state the
/// tunnel is actually in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
    #[default]
    Unsecured,
    Secured,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TunnelState {
    Disconnected {
        location: Option<GeoIpLocation>,
        /// Whether traffic is blocked while disconnected, because lockdown
        /// mode is enabled.
        locked_down: bool,
    },
    Connecting {
        endpoint: TunnelEndpoint,
        location: Option<GeoIpLocation>,
    },
    Connected {
        endpoint: TunnelEndpoint,
        location: Option<GeoIpLocation>,
    },
    Disconnecting(ActionAfterDisconnect),
    Error(ErrorState),
}

impl TunnelState {
    pub fn is_connected(&self) -> bool {
        matches!(self, TunnelState::Connected { .. })
    }

    pub fn is_disconnected(&self) -> bool {
        matches!(self, TunnelState::Disconnected { .. })
    }

    /// Whether the device traffic is prevented from leaking outside the
    /// tunnel in this state.
    pub fn is_secured(&self) -> bool {
        match self {
            TunnelState::Connecting { .. }
            | TunnelState::Connected { .. }
            | TunnelState::Disconnecting(_) => true,
            TunnelState::Disconnected { locked_down, .. } => *locked_down,
            TunnelState::Error(error_state) => error_state.is_blocking(),
        }
    }
}

impl fmt::Display for TunnelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TunnelState::Disconnected { .. } => write!(f, "disconnected"),
            TunnelState::Connecting { endpoint, .. } => write!(f, "connecting to {endpoint}"),
            TunnelState::Connected { endpoint, .. } => write!(f, "connected to {endpoint}"),
            TunnelState::Disconnecting(_) => write!(f, "disconnecting"),
            TunnelState::Error(error_state) => write!(f, "error: {}", error_state.cause()),
        }
    }
}

/// What the tunnel state machine does next once the tunnel is down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionAfterDisconnect {
    Nothing,
    Block,
    Reconnect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorState {
    cause: ErrorStateCause,
    /// Set if entering the blocked state itself failed, meaning traffic may
    /// leak.
    block_failure: Option<FirewallPolicyError>,
}

impl ErrorState {
    pub fn new(cause: ErrorStateCause, block_failure: Option<FirewallPolicyError>) -> Self {
        Self {
            cause,
            block_failure,
        }
    }

    pub fn cause(&self) -> &ErrorStateCause {
        &self.cause
    }

    pub fn block_failure(&self) -> Option<&FirewallPolicyError> {
        self.block_failure.as_ref()
    }

    pub fn is_blocking(&self) -> bool {
        self.block_failure.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStateCause {
    AuthFailed(Option<String>),
    Ipv6Unavailable,
    SetFirewallPolicyError(FirewallPolicyError),
    SetDnsError,
    StartTunnelError,
    TunnelParameterError(ParameterGenerationError),
    IsOffline,
    SplitTunnelError,
}

impl fmt::Display for ErrorStateCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorStateCause::AuthFailed(reason) => match reason {
                Some(reason) => write!(f, "authentication failed: {reason}"),
                None => write!(f, "authentication failed"),
            },
            ErrorStateCause::Ipv6Unavailable => write!(f, "IPv6 is unavailable"),
            ErrorStateCause::SetFirewallPolicyError(_) => {
                write!(f, "failed to apply firewall policy")
            }
            ErrorStateCause::SetDnsError => write!(f, "failed to set system DNS"),
            ErrorStateCause::StartTunnelError => write!(f, "failed to start the tunnel"),
            ErrorStateCause::TunnelParameterError(error) => {
                write!(f, "failed to generate tunnel parameters: {error}")
            }
            ErrorStateCause::IsOffline => write!(f, "the device is offline"),
            ErrorStateCause::SplitTunnelError => write!(f, "split tunneling failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailed {
    InvalidAccount,
    ExpiredAccount,
    TooManyConnections,
    Unknown,
}

impl AuthFailed {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthFailed::InvalidAccount => "INVALID_ACCOUNT",
            AuthFailed::ExpiredAccount => "EXPIRED_ACCOUNT",
            AuthFailed::TooManyConnections => "TOO_MANY_CONNECTIONS",
            AuthFailed::Unknown => "UNKNOWN",
        }
    }
}

impl From<&str> for AuthFailed {
    fn from(reason: &str) -> Self {
        match reason {
            "INVALID_ACCOUNT" => AuthFailed::InvalidAccount,
            "EXPIRED_ACCOUNT" => AuthFailed::ExpiredAccount,
            "TOO_MANY_CONNECTIONS" => AuthFailed::TooManyConnections,
            _ => AuthFailed::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirewallPolicyError {
    Generic,
    /// Another process holds a lock on the firewall.
    Locked(Option<BlockingApplication>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingApplication {
    pub pid: u32,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterGenerationError {
    NoMatchingRelay,
    NoMatchingBridgeRelay,
    NoWireguardKey,
    CustomTunnelHostResolutionError,
}

impl fmt::Display for ParameterGenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterGenerationError::NoMatchingRelay => {
                write!(f, "no relay matches the current constraints")
            }
            ParameterGenerationError::NoMatchingBridgeRelay => {
                write!(f, "no bridge matches the current constraints")
            }
            ParameterGenerationError::NoWireguardKey => write!(f, "no WireGuard key is available"),
            ParameterGenerationError::CustomTunnelHostResolutionError => {
                write!(f, "failed to resolve the custom tunnel host")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_security_follows_lockdown() {
        let unlocked = TunnelState::Disconnected {
            location: None,
            locked_down: false,
        };
        let locked = TunnelState::Disconnected {
            location: None,
            locked_down: true,
        };
        assert!(!unlocked.is_secured());
        assert!(locked.is_secured());
    }

    #[test]
    fn error_state_blocks_unless_blocking_failed() {
        let blocking = ErrorState::new(ErrorStateCause::IsOffline, None);
        let leaking = ErrorState::new(
            ErrorStateCause::IsOffline,
            Some(FirewallPolicyError::Generic),
        );
        assert!(TunnelState::Error(blocking).is_secured());
        assert!(!TunnelState::Error(leaking).is_secured());
    }
}
