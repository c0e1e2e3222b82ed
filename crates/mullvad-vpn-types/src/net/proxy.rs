// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::{fmt, net::SocketAddr};

use serde::{Deserialize, Serialize};

use super::{Endpoint, TransportProtocol};

/// A user-supplied proxy used either as an OpenVPN bridge replacement or as
/// an API access method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomProxy {
    Socks5Local(Socks5Local),
    Socks5Remote(Socks5Remote),
    Shadowsocks(Shadowsocks),
}

impl CustomProxy {
    /// The remote endpoint a client has to be able to reach for this proxy to
    /// be usable at all.
    pub fn remote_endpoint(&self) -> Endpoint {
        match self {
            CustomProxy::Socks5Local(local) => local.remote_endpoint,
            CustomProxy::Socks5Remote(remote) => {
                Endpoint::new(remote.peer, TransportProtocol::Tcp)
            }
            CustomProxy::Shadowsocks(shadowsocks) => {
                Endpoint::new(shadowsocks.peer, TransportProtocol::Tcp)
            }
        }
    }
}

impl fmt::Display for CustomProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomProxy::Socks5Local(local) => write!(
                f,
                "SOCKS5 (local) {} via localhost:{}",
                local.remote_endpoint, local.local_port
            ),
            CustomProxy::Socks5Remote(remote) => write!(f, "SOCKS5 {}", remote.peer),
            CustomProxy::Shadowsocks(shadowsocks) => {
                write!(f, "Shadowsocks {} ({})", shadowsocks.peer, shadowsocks.cipher)
            }
        }
    }
}

/// A SOCKS5 server reached through a proxy process running on localhost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Socks5Local {
    pub remote_endpoint: Endpoint,
    pub local_port: u16,
}

impl Socks5Local {
    pub fn new(remote_endpoint: Endpoint, local_port: u16) -> Self {
        Self {
            remote_endpoint,
            local_port,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Socks5Remote {
    pub peer: SocketAddr,
    pub auth: Option<SocksAuth>,
}

impl Socks5Remote {
    pub fn new(peer: SocketAddr) -> Self {
        Self { peer, auth: None }
    }

    pub fn new_with_authentication(peer: SocketAddr, auth: SocksAuth) -> Self {
        Self {
            peer,
            auth: Some(auth),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shadowsocks {
    pub peer: SocketAddr,
    pub password: String,
    pub cipher: String,
}

impl Shadowsocks {
    pub fn new(peer: SocketAddr, cipher: String, password: String) -> Self {
        Self {
            peer,
            password,
            cipher,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocksAuth {
    pub username: String,
    pub password: String,
}
