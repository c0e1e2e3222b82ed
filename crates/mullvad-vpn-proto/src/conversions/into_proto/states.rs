// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use mullvad_vpn_types::{location::GeoIpLocation, states};

impl From<states::TunnelState> for crate::TunnelState {
    fn from(state: states::TunnelState) -> Self {
        use crate::tunnel_state;

        let state = match state {
            states::TunnelState::Disconnected {
                location,
                locked_down,
            } => tunnel_state::State::Disconnected(tunnel_state::Disconnected {
                disconnected_location: location.map(crate::GeoIpLocation::from),
                locked_down,
            }),
            states::TunnelState::Connecting { endpoint, location } => {
                tunnel_state::State::Connecting(tunnel_state::Connecting {
                    relay_info: Some(crate::TunnelStateRelayInfo {
                        tunnel_endpoint: Some(crate::TunnelEndpoint::from(endpoint)),
                        location: location.map(crate::GeoIpLocation::from),
                    }),
                })
            }
            states::TunnelState::Connected { endpoint, location } => {
                tunnel_state::State::Connected(tunnel_state::Connected {
                    relay_info: Some(crate::TunnelStateRelayInfo {
                        tunnel_endpoint: Some(crate::TunnelEndpoint::from(endpoint)),
                        location: location.map(crate::GeoIpLocation::from),
                    }),
                })
            }
            states::TunnelState::Disconnecting(after_disconnect) => {
                tunnel_state::State::Disconnecting(tunnel_state::Disconnecting {
                    after_disconnect: i32::from(crate::AfterDisconnect::from(after_disconnect)),
                })
            }
            states::TunnelState::Error(error_state) => {
                tunnel_state::State::Error(tunnel_state::Error {
                    error_state: Some(crate::ErrorState::from(error_state)),
                })
            }
        };

        crate::TunnelState { state: Some(state) }
    }
}

impl From<states::ActionAfterDisconnect> for crate::AfterDisconnect {
    fn from(action: states::ActionAfterDisconnect) -> Self {
        match action {
            states::ActionAfterDisconnect::Nothing => crate::AfterDisconnect::Nothing,
            states::ActionAfterDisconnect::Block => crate::AfterDisconnect::Block,
            states::ActionAfterDisconnect::Reconnect => crate::AfterDisconnect::Reconnect,
        }
    }
}

impl From<states::ErrorState> for crate::ErrorState {
    fn from(error_state: states::ErrorState) -> Self {
        use crate::error_state::{Cause, GenerationError};

        let cause = match error_state.cause() {
            states::ErrorStateCause::AuthFailed(_) => Cause::AuthFailed,
            states::ErrorStateCause::Ipv6Unavailable => Cause::Ipv6Unavailable,
            states::ErrorStateCause::SetFirewallPolicyError(_) => Cause::SetFirewallPolicyError,
            states::ErrorStateCause::SetDnsError => Cause::SetDnsError,
            states::ErrorStateCause::StartTunnelError => Cause::StartTunnelError,
            states::ErrorStateCause::TunnelParameterError(_) => Cause::TunnelParameterError,
            states::ErrorStateCause::IsOffline => Cause::IsOffline,
            states::ErrorStateCause::SplitTunnelError => Cause::SplitTunnelError,
        };

        let auth_failed_error = match error_state.cause() {
            states::ErrorStateCause::AuthFailed(reason) => {
                let auth_failed = reason
                    .as_deref()
                    .map(states::AuthFailed::from)
                    .unwrap_or(states::AuthFailed::Unknown);
                i32::from(crate::error_state::AuthFailedError::from(auth_failed))
            }
            _ => 0,
        };

        let parameter_error = match error_state.cause() {
            states::ErrorStateCause::TunnelParameterError(reason) => i32::from(match reason {
                states::ParameterGenerationError::NoMatchingRelay => {
                    GenerationError::NoMatchingRelay
                }
                states::ParameterGenerationError::NoMatchingBridgeRelay => {
                    GenerationError::NoMatchingBridgeRelay
                }
                states::ParameterGenerationError::NoWireguardKey => GenerationError::NoWireguardKey,
                states::ParameterGenerationError::CustomTunnelHostResolutionError => {
                    GenerationError::CustomTunnelHostResolutionError
                }
            }),
            _ => 0,
        };

        let policy_error = match error_state.cause() {
            states::ErrorStateCause::SetFirewallPolicyError(error) => {
                Some(firewall_policy_error(error))
            }
            _ => None,
        };

        crate::ErrorState {
            cause: i32::from(cause),
            blocking_error: error_state.block_failure().map(firewall_policy_error),
            auth_failed_error,
            parameter_error,
            policy_error,
        }
    }
}

impl From<states::AuthFailed> for crate::error_state::AuthFailedError {
    fn from(auth_failed: states::AuthFailed) -> Self {
        use crate::error_state::AuthFailedError;

        match auth_failed {
            states::AuthFailed::InvalidAccount => AuthFailedError::InvalidAccount,
            states::AuthFailed::ExpiredAccount => AuthFailedError::ExpiredAccount,
            states::AuthFailed::TooManyConnections => AuthFailedError::TooManyConnections,
            states::AuthFailed::Unknown => AuthFailedError::Unknown,
        }
    }
}

fn firewall_policy_error(
    error: &states::FirewallPolicyError,
) -> crate::error_state::FirewallPolicyError {
    use crate::error_state::firewall_policy_error::ErrorType;

    match error {
        states::FirewallPolicyError::Generic => crate::error_state::FirewallPolicyError {
            r#type: i32::from(ErrorType::Generic),
            ..Default::default()
        },
        states::FirewallPolicyError::Locked(blocking_app) => {
            let (lock_pid, lock_name) = match blocking_app {
                Some(app) => (app.pid, app.name.clone()),
                None => (0, String::new()),
            };
            crate::error_state::FirewallPolicyError {
                r#type: i32::from(ErrorType::Locked),
                lock_pid,
                lock_name,
            }
        }
    }
}

impl From<GeoIpLocation> for crate::GeoIpLocation {
    fn from(location: GeoIpLocation) -> Self {
        crate::GeoIpLocation {
            ipv4: location.ipv4.map(|ip| ip.to_string()),
            ipv6: location.ipv6.map(|ip| ip.to_string()),
            country: location.country,
            city: location.city,
            latitude: location.latitude,
            longitude: location.longitude,
            mullvad_exit_ip: location.mullvad_exit_ip,
            hostname: location.hostname,
            bridge_hostname: location.bridge_hostname,
            entry_hostname: location.entry_hostname,
            obfuscator_hostname: location.obfuscator_hostname,
        }
    }
}
