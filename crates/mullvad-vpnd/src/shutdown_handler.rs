// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Cancels the given token once a termination signal arrives.
pub(crate) fn install(shutdown_token: CancellationToken) -> JoinSet<()> {
    let mut join_set = JoinSet::new();

    #[cfg(unix)]
    join_set.spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(error) => {
                tracing::error!("Failed to install SIGTERM handler: {error}");
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT, shutting down");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, shutting down");
            }
        }
        shutdown_token.cancel();
    });

    #[cfg(not(unix))]
    join_set.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received ctrl-c, shutting down");
        }
        shutdown_token.cancel();
    });

    join_set
}
