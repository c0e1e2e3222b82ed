// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

//! Downloads and verifies app installers, streaming progress to listeners.

use std::{path::PathBuf, time::Duration};

use futures::StreamExt;
use sha2::{Digest, Sha256};
use tokio::{io::AsyncWriteExt, sync::broadcast, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use mullvad_vpn_types::app_upgrade::{AppUpgradeError, AppUpgradeEvent};

use super::version_check::SuggestedUpgradeInfo;

pub(crate) struct AppUpgradeTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl AppUpgradeTask {
    pub(crate) fn spawn(
        upgrade: SuggestedUpgradeInfo,
        download_dir: PathBuf,
        event_tx: broadcast::Sender<AppUpgradeEvent>,
    ) -> Self {
        let token = CancellationToken::new();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => {
                    let _ = event_tx.send(AppUpgradeEvent::Aborted);
                }
                result = run_upgrade(&upgrade, download_dir, event_tx.clone()) => {
                    match result {
                        Ok(installer_path) => {
                            let _ = event_tx.send(AppUpgradeEvent::VerifiedInstaller { installer_path });
                        }
                        Err(error) => {
                            tracing::error!("App upgrade failed: {error}");
                            let _ = event_tx.send(AppUpgradeEvent::Error(error));
                        }
                    }
                }
            }
        });

        Self { token, handle }
    }

    pub(crate) fn abort(&self) {
        self.token.cancel();
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

async fn run_upgrade(
    upgrade: &SuggestedUpgradeInfo,
    download_dir: PathBuf,
    event_tx: broadcast::Sender<AppUpgradeEvent>,
) -> Result<PathBuf, AppUpgradeError> {
    let url = upgrade
        .installer_url
        .as_deref()
        .ok_or(AppUpgradeError::GeneralError)?;
    let server = server_from_url(url);

    let _ = event_tx.send(AppUpgradeEvent::DownloadStarting {
        server: server.clone(),
    });

    let response = reqwest::get(url)
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|_| AppUpgradeError::DownloadFailed)?;
    let total_bytes = response.content_length();

    let installer_path = download_dir.join(format!("installer-{}", upgrade.version));
    let mut file = tokio::fs::File::create(&installer_path)
        .await
        .map_err(|_| AppUpgradeError::DownloadFailed)?;

    let started = std::time::Instant::now();
    let mut downloaded: u64 = 0;
    let mut last_progress = 0u32;
    let mut hasher = Sha256::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|_| AppUpgradeError::DownloadFailed)?;
        hasher.update(&chunk);
        file.write_all(&chunk)
            .await
            .map_err(|_| AppUpgradeError::DownloadFailed)?;
        downloaded += chunk.len() as u64;

        if let Some(total) = total_bytes {
            let progress = ((downloaded * 100) / total.max(1)) as u32;
            if progress > last_progress {
                last_progress = progress;
                let _ = event_tx.send(AppUpgradeEvent::DownloadProgress {
                    server: server.clone(),
                    progress,
                    time_left: estimate_time_left(started.elapsed(), downloaded, total),
                });
            }
        }
    }

    file.flush().await.map_err(|_| AppUpgradeError::DownloadFailed)?;
    drop(file);

    let _ = event_tx.send(AppUpgradeEvent::VerifyingInstaller);
    verify_installer(&installer_path, hasher, upgrade.installer_sha256.as_deref()).await?;

    Ok(installer_path)
}

async fn verify_installer(
    installer_path: &PathBuf,
    hasher: Sha256,
    expected_sha256: Option<&str>,
) -> Result<(), AppUpgradeError> {
    let expected = expected_sha256.ok_or(AppUpgradeError::VerificationFailed)?;
    let actual = hex::encode(hasher.finalize());
    if !actual.eq_ignore_ascii_case(expected) {
        let _ = tokio::fs::remove_file(installer_path).await;
        return Err(AppUpgradeError::VerificationFailed);
    }
    Ok(())
}

fn estimate_time_left(elapsed: Duration, downloaded: u64, total: u64) -> Option<Duration> {
    if downloaded == 0 || total <= downloaded {
        return None;
    }
    let rate = downloaded as f64 / elapsed.as_secs_f64().max(0.001);
    Some(Duration::from_secs_f64(
        (total - downloaded) as f64 / rate.max(1.0),
    ))
}

fn server_from_url(url: &str) -> String {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or(url)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_name_is_extracted_from_url() {
        assert_eq!(
            server_from_url("https://releases.mullvad.net/desktop/app.tar.gz"),
            "releases.mullvad.net"
        );
        assert_eq!(server_from_url("releases.mullvad.net"), "releases.mullvad.net");
    }

    #[test]
    fn time_left_estimation() {
        assert_eq!(estimate_time_left(Duration::from_secs(1), 0, 100), None);
        assert_eq!(estimate_time_left(Duration::from_secs(1), 100, 100), None);
        let left = estimate_time_left(Duration::from_secs(10), 50, 100).unwrap();
        assert!(left >= Duration::from_secs(9) && left <= Duration::from_secs(11));
    }
}
