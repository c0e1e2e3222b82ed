// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use mullvad_vpn_types::net::{self, proxy};

impl From<net::TransportProtocol> for crate::TransportProtocol {
    fn from(protocol: net::TransportProtocol) -> Self {
        match protocol {
            net::TransportProtocol::Udp => crate::TransportProtocol::Udp,
            net::TransportProtocol::Tcp => crate::TransportProtocol::Tcp,
        }
    }
}

impl From<net::IpVersion> for crate::IpVersion {
    fn from(version: net::IpVersion) -> Self {
        match version {
            net::IpVersion::V4 => crate::IpVersion::V4,
            net::IpVersion::V6 => crate::IpVersion::V6,
        }
    }
}

impl From<net::Endpoint> for crate::Endpoint {
    fn from(endpoint: net::Endpoint) -> Self {
        crate::Endpoint {
            address: endpoint.address.to_string(),
            protocol: i32::from(crate::TransportProtocol::from(endpoint.protocol)),
        }
    }
}

impl From<net::ObfuscationEndpoint> for crate::ObfuscationEndpoint {
    fn from(endpoint: net::ObfuscationEndpoint) -> Self {
        use crate::obfuscation_endpoint::ObfuscationType;

        crate::ObfuscationEndpoint {
            endpoint: Some(crate::Endpoint::from(endpoint.endpoint)),
            obfuscation_type: i32::from(match endpoint.obfuscation_type {
                net::ObfuscationType::Udp2Tcp => ObfuscationType::Udp2tcp,
                net::ObfuscationType::Shadowsocks => ObfuscationType::Shadowsocks,
                net::ObfuscationType::Quic => ObfuscationType::Quic,
            }),
        }
    }
}

impl From<net::TunnelEndpoint> for crate::TunnelEndpoint {
    fn from(endpoint: net::TunnelEndpoint) -> Self {
        crate::TunnelEndpoint {
            address: endpoint.endpoint.address.to_string(),
            protocol: i32::from(crate::TransportProtocol::from(endpoint.endpoint.protocol)),
            quantum_resistant: endpoint.quantum_resistant,
            obfuscation: endpoint.obfuscation.map(crate::ObfuscationEndpoint::from),
            entry_endpoint: endpoint.entry_endpoint.map(crate::Endpoint::from),
            tunnel_metadata: endpoint
                .tunnel_interface
                .map(|tunnel_interface| crate::TunnelMetadata { tunnel_interface }),
            daita: endpoint.daita,
        }
    }
}

impl From<proxy::CustomProxy> for crate::CustomProxy {
    fn from(proxy: proxy::CustomProxy) -> Self {
        use crate::custom_proxy::ProxyMethod;

        crate::CustomProxy {
            proxy_method: Some(match proxy {
                proxy::CustomProxy::Socks5Local(local) => {
                    ProxyMethod::Socks5local(crate::Socks5Local::from(local))
                }
                proxy::CustomProxy::Socks5Remote(remote) => {
                    ProxyMethod::Socks5remote(crate::Socks5Remote::from(remote))
                }
                proxy::CustomProxy::Shadowsocks(shadowsocks) => {
                    ProxyMethod::Shadowsocks(crate::Shadowsocks::from(shadowsocks))
                }
            }),
        }
    }
}

impl From<proxy::Socks5Local> for crate::Socks5Local {
    fn from(proxy: proxy::Socks5Local) -> Self {
        crate::Socks5Local {
            remote_ip: proxy.remote_endpoint.address.ip().to_string(),
            remote_port: u32::from(proxy.remote_endpoint.address.port()),
            remote_transport_protocol: i32::from(crate::TransportProtocol::from(
                proxy.remote_endpoint.protocol,
            )),
            local_port: u32::from(proxy.local_port),
        }
    }
}

impl From<proxy::Socks5Remote> for crate::Socks5Remote {
    fn from(proxy: proxy::Socks5Remote) -> Self {
        crate::Socks5Remote {
            ip: proxy.peer.ip().to_string(),
            port: u32::from(proxy.peer.port()),
            auth: proxy.auth.map(crate::SocksAuth::from),
        }
    }
}

impl From<proxy::Shadowsocks> for crate::Shadowsocks {
    fn from(proxy: proxy::Shadowsocks) -> Self {
        crate::Shadowsocks {
            ip: proxy.peer.ip().to_string(),
            port: u32::from(proxy.peer.port()),
            password: proxy.password,
            cipher: proxy.cipher,
        }
    }
}

impl From<proxy::SocksAuth> for crate::SocksAuth {
    fn from(auth: proxy::SocksAuth) -> Self {
        crate::SocksAuth {
            username: auth.username,
            password: auth.password,
        }
    }
}
