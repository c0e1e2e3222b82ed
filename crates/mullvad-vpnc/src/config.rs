// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

#[cfg(unix)]
const DEFAULT_SOCKET_PATH: &str = "/var/run/mullvad-vpnd.socket";
#[cfg(windows)]
const DEFAULT_SOCKET_PATH: &str = "//./pipe/mullvad-vpnd";

const DEFAULT_TCP_ENDPOINT: &str = "http://127.0.0.1:44930";

pub(crate) fn socket_path() -> PathBuf {
    std::env::var("MULLVAD_VPND_SOCKET_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SOCKET_PATH))
}

pub(crate) fn default_endpoint() -> String {
    std::env::var("MULLVAD_VPND_TCP_ENDPOINT")
        .unwrap_or_else(|_| DEFAULT_TCP_ENDPOINT.to_string())
}
