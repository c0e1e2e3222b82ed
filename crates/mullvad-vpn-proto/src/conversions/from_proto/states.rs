// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use mullvad_vpn_types::{location::GeoIpLocation, net, states};

use crate::conversions::error::ConversionError;

impl TryFrom<crate::TunnelState> for states::TunnelState {
    type Error = ConversionError;

    fn try_from(state: crate::TunnelState) -> Result<Self, ConversionError> {
        use crate::tunnel_state::State;

        let state = match state.state {
            Some(State::Disconnected(disconnected)) => states::TunnelState::Disconnected {
                location: disconnected
                    .disconnected_location
                    .map(GeoIpLocation::try_from)
                    .transpose()?,
                locked_down: disconnected.locked_down,
            },
            Some(State::Connecting(connecting)) => {
                let (endpoint, location) = relay_info(connecting.relay_info)?;
                states::TunnelState::Connecting { endpoint, location }
            }
            Some(State::Connected(connected)) => {
                let (endpoint, location) = relay_info(connected.relay_info)?;
                states::TunnelState::Connected { endpoint, location }
            }
            Some(State::Disconnecting(disconnecting)) => states::TunnelState::Disconnecting(
                try_after_disconnect_from_i32(disconnecting.after_disconnect)?,
            ),
            Some(State::Error(error)) => states::TunnelState::Error(states::ErrorState::try_from(
                error
                    .error_state
                    .ok_or(ConversionError::Missing("error state"))?,
            )?),
            None => return Err(ConversionError::Missing("tunnel state")),
        };

        Ok(state)
    }
}

fn relay_info(
    relay_info: Option<crate::TunnelStateRelayInfo>,
) -> Result<(net::TunnelEndpoint, Option<GeoIpLocation>), ConversionError> {
    let relay_info = relay_info.ok_or(ConversionError::Missing("relay info"))?;
    let endpoint = net::TunnelEndpoint::try_from(
        relay_info
            .tunnel_endpoint
            .ok_or(ConversionError::Missing("tunnel endpoint"))?,
    )?;
    let location = relay_info
        .location
        .map(GeoIpLocation::try_from)
        .transpose()?;
    Ok((endpoint, location))
}

fn try_after_disconnect_from_i32(
    after_disconnect: i32,
) -> Result<states::ActionAfterDisconnect, ConversionError> {
    match crate::AfterDisconnect::try_from(after_disconnect) {
        Ok(crate::AfterDisconnect::Nothing) => Ok(states::ActionAfterDisconnect::Nothing),
        Ok(crate::AfterDisconnect::Block) => Ok(states::ActionAfterDisconnect::Block),
        Ok(crate::AfterDisconnect::Reconnect) => Ok(states::ActionAfterDisconnect::Reconnect),
        Err(_) => Err(ConversionError::InvalidValue("after disconnect action")),
    }
}

impl TryFrom<crate::ErrorState> for states::ErrorState {
    type Error = ConversionError;

    fn try_from(error_state: crate::ErrorState) -> Result<Self, Self::Error> {
        use crate::error_state::{Cause, GenerationError};

        let cause = match Cause::try_from(error_state.cause) {
            Ok(Cause::AuthFailed) => {
                let auth_failed = try_auth_failed_from_i32(error_state.auth_failed_error)?;
                states::ErrorStateCause::AuthFailed(Some(auth_failed.as_str().to_string()))
            }
            Ok(Cause::Ipv6Unavailable) => states::ErrorStateCause::Ipv6Unavailable,
            Ok(Cause::SetFirewallPolicyError) => {
                let policy_error = error_state
                    .policy_error
                    .ok_or(ConversionError::Missing("firewall policy error"))?;
                states::ErrorStateCause::SetFirewallPolicyError(try_firewall_policy_error(
                    policy_error,
                )?)
            }
            Ok(Cause::SetDnsError) => states::ErrorStateCause::SetDnsError,
            Ok(Cause::StartTunnelError) => states::ErrorStateCause::StartTunnelError,
            Ok(Cause::TunnelParameterError) => {
                let parameter_error = match GenerationError::try_from(error_state.parameter_error) {
                    Ok(GenerationError::NoMatchingRelay) => {
                        states::ParameterGenerationError::NoMatchingRelay
                    }
                    Ok(GenerationError::NoMatchingBridgeRelay) => {
                        states::ParameterGenerationError::NoMatchingBridgeRelay
                    }
                    Ok(GenerationError::NoWireguardKey) => {
                        states::ParameterGenerationError::NoWireguardKey
                    }
                    Ok(GenerationError::CustomTunnelHostResolutionError) => {
                        states::ParameterGenerationError::CustomTunnelHostResolutionError
                    }
                    Err(_) => return Err(ConversionError::InvalidValue("parameter error")),
                };
                states::ErrorStateCause::TunnelParameterError(parameter_error)
            }
            Ok(Cause::IsOffline) => states::ErrorStateCause::IsOffline,
            Ok(Cause::SplitTunnelError) => states::ErrorStateCause::SplitTunnelError,
            Err(_) => return Err(ConversionError::InvalidValue("error cause")),
        };

        let block_failure = error_state
            .blocking_error
            .map(try_firewall_policy_error)
            .transpose()?;

        Ok(states::ErrorState::new(cause, block_failure))
    }
}

fn try_auth_failed_from_i32(auth_failed_error: i32) -> Result<states::AuthFailed, ConversionError> {
    use crate::error_state::AuthFailedError;

    match AuthFailedError::try_from(auth_failed_error) {
        Ok(AuthFailedError::InvalidAccount) => Ok(states::AuthFailed::InvalidAccount),
        Ok(AuthFailedError::ExpiredAccount) => Ok(states::AuthFailed::ExpiredAccount),
        Ok(AuthFailedError::TooManyConnections) => Ok(states::AuthFailed::TooManyConnections),
        Ok(AuthFailedError::Unknown) => Ok(states::AuthFailed::Unknown),
        Err(_) => Err(ConversionError::InvalidValue("auth failed error")),
    }
}

fn try_firewall_policy_error(
    error: crate::error_state::FirewallPolicyError,
) -> Result<states::FirewallPolicyError, ConversionError> {
    use crate::error_state::firewall_policy_error::ErrorType;

    match ErrorType::try_from(error.r#type) {
        Ok(ErrorType::Generic) => Ok(states::FirewallPolicyError::Generic),
        Ok(ErrorType::Locked) => {
            let blocking_app = if error.lock_name.is_empty() {
                None
            } else {
                Some(states::BlockingApplication {
                    pid: error.lock_pid,
                    name: error.lock_name,
                })
            };
            Ok(states::FirewallPolicyError::Locked(blocking_app))
        }
        Err(_) => Err(ConversionError::InvalidValue("firewall policy error")),
    }
}

impl TryFrom<crate::GeoIpLocation> for GeoIpLocation {
    type Error = ConversionError;

    fn try_from(location: crate::GeoIpLocation) -> Result<Self, Self::Error> {
        Ok(GeoIpLocation {
            ipv4: location
                .ipv4
                .map(|addr| {
                    addr.parse()
                        .map_err(|_| ConversionError::InvalidValue("IPv4 address"))
                })
                .transpose()?,
            ipv6: location
                .ipv6
                .map(|addr| {
                    addr.parse()
                        .map_err(|_| ConversionError::InvalidValue("IPv6 address"))
                })
                .transpose()?,
            country: location.country,
            city: location.city,
            latitude: location.latitude,
            longitude: location.longitude,
            mullvad_exit_ip: location.mullvad_exit_ip,
            hostname: location.hostname,
            bridge_hostname: location.bridge_hostname,
            entry_hostname: location.entry_hostname,
            obfuscator_hostname: location.obfuscator_hostname,
        })
    }
}
