// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use tokio::sync::{mpsc::UnboundedSender, oneshot};
use tonic::Status;

use crate::service::DaemonCommand;

/// Forwards commands from the gRPC layer into the daemon service task and
/// waits for the reply.
#[derive(Clone)]
pub(super) struct CommandInterfaceConnectionHandler {
    daemon_tx: UnboundedSender<DaemonCommand>,
}

impl CommandInterfaceConnectionHandler {
    pub(super) fn new(daemon_tx: UnboundedSender<DaemonCommand>) -> Self {
        Self { daemon_tx }
    }

    pub(super) async fn send<R>(
        &self,
        build_command: impl FnOnce(oneshot::Sender<R>) -> DaemonCommand,
    ) -> Result<R, Status> {
        let (tx, rx) = oneshot::channel();
        self.daemon_tx
            .send(build_command(tx))
            .map_err(|_| Status::unavailable("the daemon is shutting down"))?;
        rx.await
            .map_err(|_| Status::internal("the daemon did not reply"))
    }
}
