// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::net::{IpAddr, SocketAddr};

use mullvad_vpn_types::net::{self, proxy};

use crate::conversions::{error::ConversionError, util::arg_from_str};

pub(crate) fn try_transport_protocol_from_i32(
    protocol: i32,
) -> Result<net::TransportProtocol, ConversionError> {
    Ok(crate::TransportProtocol::try_from(protocol)
        .map_err(|_| ConversionError::InvalidValue("transport protocol"))?
        .into())
}

impl From<crate::TransportProtocol> for net::TransportProtocol {
    fn from(protocol: crate::TransportProtocol) -> Self {
        match protocol {
            crate::TransportProtocol::Udp => net::TransportProtocol::Udp,
            crate::TransportProtocol::Tcp => net::TransportProtocol::Tcp,
        }
    }
}

impl From<crate::IpVersion> for net::IpVersion {
    fn from(version: crate::IpVersion) -> Self {
        match version {
            crate::IpVersion::V4 => net::IpVersion::V4,
            crate::IpVersion::V6 => net::IpVersion::V6,
        }
    }
}

impl TryFrom<crate::Endpoint> for net::Endpoint {
    type Error = ConversionError;

    fn try_from(endpoint: crate::Endpoint) -> Result<Self, Self::Error> {
        Ok(net::Endpoint {
            address: arg_from_str(&endpoint.address, "endpoint address")?,
            protocol: try_transport_protocol_from_i32(endpoint.protocol)?,
        })
    }
}

impl TryFrom<crate::ObfuscationEndpoint> for net::ObfuscationEndpoint {
    type Error = ConversionError;

    fn try_from(endpoint: crate::ObfuscationEndpoint) -> Result<Self, Self::Error> {
        use crate::obfuscation_endpoint::ObfuscationType;

        let obfuscation_type = match ObfuscationType::try_from(endpoint.obfuscation_type) {
            Ok(ObfuscationType::Udp2tcp) => net::ObfuscationType::Udp2Tcp,
            Ok(ObfuscationType::Shadowsocks) => net::ObfuscationType::Shadowsocks,
            Ok(ObfuscationType::Quic) => net::ObfuscationType::Quic,
            Err(_) => return Err(ConversionError::InvalidValue("obfuscation type")),
        };

        Ok(net::ObfuscationEndpoint {
            endpoint: net::Endpoint::try_from(
                endpoint
                    .endpoint
                    .ok_or(ConversionError::Missing("obfuscation endpoint"))?,
            )?,
            obfuscation_type,
        })
    }
}

impl TryFrom<crate::TunnelEndpoint> for net::TunnelEndpoint {
    type Error = ConversionError;

    fn try_from(endpoint: crate::TunnelEndpoint) -> Result<Self, Self::Error> {
        Ok(net::TunnelEndpoint {
            endpoint: net::Endpoint {
                address: arg_from_str(&endpoint.address, "tunnel endpoint address")?,
                protocol: try_transport_protocol_from_i32(endpoint.protocol)?,
            },
            quantum_resistant: endpoint.quantum_resistant,
            obfuscation: endpoint
                .obfuscation
                .map(net::ObfuscationEndpoint::try_from)
                .transpose()?,
            entry_endpoint: endpoint
                .entry_endpoint
                .map(net::Endpoint::try_from)
                .transpose()?,
            tunnel_interface: endpoint
                .tunnel_metadata
                .map(|metadata| metadata.tunnel_interface),
            daita: endpoint.daita,
        })
    }
}

impl TryFrom<crate::CustomProxy> for proxy::CustomProxy {
    type Error = ConversionError;

    fn try_from(proxy: crate::CustomProxy) -> Result<Self, Self::Error> {
        use crate::custom_proxy::ProxyMethod;

        Ok(match proxy.proxy_method {
            Some(ProxyMethod::Socks5local(local)) => {
                proxy::CustomProxy::Socks5Local(proxy::Socks5Local::try_from(local)?)
            }
            Some(ProxyMethod::Socks5remote(remote)) => {
                proxy::CustomProxy::Socks5Remote(proxy::Socks5Remote::try_from(remote)?)
            }
            Some(ProxyMethod::Shadowsocks(shadowsocks)) => {
                proxy::CustomProxy::Shadowsocks(proxy::Shadowsocks::try_from(shadowsocks)?)
            }
            None => return Err(ConversionError::Missing("proxy method")),
        })
    }
}

impl TryFrom<crate::Socks5Local> for proxy::Socks5Local {
    type Error = ConversionError;

    fn try_from(proxy: crate::Socks5Local) -> Result<Self, Self::Error> {
        let remote_ip: IpAddr = arg_from_str(&proxy.remote_ip, "SOCKS5 remote ip")?;
        let remote_port = port_from_u32(proxy.remote_port)?;
        let local_port = port_from_u32(proxy.local_port)?;

        Ok(proxy::Socks5Local::new(
            net::Endpoint::new(
                SocketAddr::new(remote_ip, remote_port),
                try_transport_protocol_from_i32(proxy.remote_transport_protocol)?,
            ),
            local_port,
        ))
    }
}

impl TryFrom<crate::Socks5Remote> for proxy::Socks5Remote {
    type Error = ConversionError;

    fn try_from(proxy: crate::Socks5Remote) -> Result<Self, Self::Error> {
        let ip: IpAddr = arg_from_str(&proxy.ip, "SOCKS5 ip")?;
        let peer = SocketAddr::new(ip, port_from_u32(proxy.port)?);

        Ok(match proxy.auth.map(proxy::SocksAuth::from) {
            Some(auth) => proxy::Socks5Remote::new_with_authentication(peer, auth),
            None => proxy::Socks5Remote::new(peer),
        })
    }
}

impl TryFrom<crate::Shadowsocks> for proxy::Shadowsocks {
    type Error = ConversionError;

    fn try_from(proxy: crate::Shadowsocks) -> Result<Self, Self::Error> {
        let ip: IpAddr = arg_from_str(&proxy.ip, "Shadowsocks ip")?;
        let peer = SocketAddr::new(ip, port_from_u32(proxy.port)?);

        Ok(proxy::Shadowsocks::new(peer, proxy.cipher, proxy.password))
    }
}

impl From<crate::SocksAuth> for proxy::SocksAuth {
    fn from(auth: crate::SocksAuth) -> Self {
        proxy::SocksAuth {
            username: auth.username,
            password: auth.password,
        }
    }
}

pub(crate) fn port_from_u32(port: u32) -> Result<u16, ConversionError> {
    u16::try_from(port).map_err(|_| ConversionError::InvalidValue("port"))
}
