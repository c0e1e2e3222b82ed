// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use mullvad_vpn_types::settings::Settings;

use super::config::{self, ConfigSetupError};

/// Owns the daemon settings and keeps the on-disk copy in sync.
pub(crate) struct SettingsPersister {
    settings: Settings,
    path: PathBuf,
}

impl SettingsPersister {
    pub(crate) fn load(path: PathBuf) -> Self {
        let settings = match config::read_config_file(&path) {
            Ok(settings) => settings,
            Err(ConfigSetupError::ReadConfig { error, .. })
                if error.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::info!("No settings file found, using defaults");
                Settings::default()
            }
            Err(error) => {
                tracing::error!("Failed to load settings, using defaults: {error}");
                Settings::default()
            }
        };
        Self { settings, path }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Applies `update` and writes the result to disk. Returns whether the
    /// settings actually changed.
    pub(crate) fn update(
        &mut self,
        update: impl FnOnce(&mut Settings),
    ) -> Result<bool, ConfigSetupError> {
        let mut new_settings = self.settings.clone();
        update(&mut new_settings);
        if new_settings == self.settings {
            return Ok(false);
        }
        self.settings = new_settings;
        self.persist()?;
        Ok(true)
    }

    pub(crate) fn replace(&mut self, settings: Settings) -> Result<bool, ConfigSetupError> {
        self.update(|current| *current = settings)
    }

    pub(crate) fn reset(&mut self) -> Result<bool, ConfigSetupError> {
        self.replace(Settings::default())
    }

    fn persist(&self) -> Result<(), ConfigSetupError> {
        config::create_config_file(&self.path, &self.settings)?;
        config::write_config_file(&self.path, &self.settings)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut persister = SettingsPersister::load(path.clone());
        let changed = persister.update(|settings| settings.allow_lan = true).unwrap();
        assert!(changed);

        let reloaded = SettingsPersister::load(path);
        assert!(reloaded.settings().allow_lan);
    }

    #[test]
    fn identical_update_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut persister = SettingsPersister::load(path);
        let changed = persister.update(|settings| settings.allow_lan = false).unwrap();
        assert!(!changed);
    }
}
