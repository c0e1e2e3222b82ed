// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tokio::net::UnixListener;
use tokio_stream::wrappers::UnixListenerStream;

/// Binds the management socket and wraps it in a stream that tonic can serve
/// connections from.
pub(super) fn setup_socket_stream(socket_path: &Path) -> std::io::Result<UnixListenerStream> {
    let listener = UnixListener::bind(socket_path)?;

    // The desktop app runs unprivileged and must be able to reach the daemon.
    let permissions = std::fs::Permissions::from_mode(0o766);
    std::fs::set_permissions(socket_path, permissions)?;

    Ok(UnixListenerStream::new(listener))
}
