// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use tokio::sync::broadcast;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::service::config;

const LOG_CHANNEL_CAPACITY: usize = 512;

/// A log line as handed to `LogListen` subscribers.
#[derive(Debug, Clone)]
pub struct LogMessage {
    pub level: tracing::Level,
    pub message: String,
}

/// Forwards every log event into a broadcast channel so that the management
/// interface can stream them to clients.
struct BroadcastLayer {
    tx: broadcast::Sender<LogMessage>,
}

impl<S: tracing::Subscriber> Layer<S> for BroadcastLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let _ = self.tx.send(LogMessage {
            level: *event.metadata().level(),
            message: visitor.message,
        });
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        .from_env_lossy()
        .add_directive("hyper=info".parse().unwrap())
        .add_directive("h2=info".parse().unwrap())
}

pub fn setup_logging() -> broadcast::Sender<LogMessage> {
    let (log_tx, _) = broadcast::channel(LOG_CHANNEL_CAPACITY);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().compact())
        .with(BroadcastLayer { tx: log_tx.clone() })
        .init();

    log_tx
}

pub fn setup_logging_to_file() -> (broadcast::Sender<LogMessage>, WorkerGuard) {
    let log_dir = config::log_dir();
    let file_appender = tracing_appender::rolling::never(log_dir, config::DEFAULT_LOG_FILE);
    let (file_writer, worker_guard) = tracing_appender::non_blocking(file_appender);

    let (log_tx, _) = broadcast::channel(LOG_CHANNEL_CAPACITY);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .with(BroadcastLayer { tx: log_tx.clone() })
        .init();

    std::panic::set_hook(Box::new(|panic| {
        tracing::error!(message = %panic);
    }));

    (log_tx, worker_guard)
}
