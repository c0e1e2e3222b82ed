// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

pub fn new_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}
