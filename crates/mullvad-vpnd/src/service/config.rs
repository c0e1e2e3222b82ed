// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::{fs, path::PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

#[cfg(not(windows))]
const DEFAULT_DATA_DIR: &str = "/var/lib/mullvad-vpnd";
#[cfg(not(windows))]
const DEFAULT_LOG_DIR: &str = "/var/log/mullvad-vpnd";
#[cfg(not(windows))]
const DEFAULT_CONFIG_DIR: &str = "/etc/mullvad-vpnd";

pub(crate) const DEFAULT_SETTINGS_FILE: &str = "settings.toml";
pub(crate) const DEFAULT_ACCOUNT_FILE: &str = "account.toml";
pub(crate) const DEFAULT_RELAY_LIST_FILE: &str = "relays.json";
pub(crate) const DEFAULT_VERSION_CACHE_FILE: &str = "version-info.json";
pub(crate) const DEFAULT_LOG_FILE: &str = "mullvad-vpnd.log";

#[cfg(windows)]
pub(crate) fn program_data_path() -> PathBuf {
    PathBuf::from(std::env::var("ProgramData").unwrap_or_else(|_| "C:\\ProgramData".to_string()))
}

fn default_data_dir() -> PathBuf {
    #[cfg(windows)]
    return program_data_path().join("mullvad-vpnd").join("data");

    #[cfg(not(windows))]
    return DEFAULT_DATA_DIR.into();
}

pub(crate) fn data_dir() -> PathBuf {
    std::env::var("MULLVAD_VPND_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_data_dir())
}

fn default_log_dir() -> PathBuf {
    #[cfg(windows)]
    return program_data_path().join("mullvad-vpnd").join("log");

    #[cfg(not(windows))]
    return DEFAULT_LOG_DIR.into();
}

pub(crate) fn log_dir() -> PathBuf {
    std::env::var("MULLVAD_VPND_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_log_dir())
}

fn default_config_dir() -> PathBuf {
    #[cfg(windows)]
    return program_data_path().join("mullvad-vpnd").join("config");

    #[cfg(not(windows))]
    return DEFAULT_CONFIG_DIR.into();
}

pub(crate) fn config_dir() -> PathBuf {
    std::env::var("MULLVAD_VPND_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_config_dir())
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigSetupError {
    #[error("failed to parse config file {file}: {error}")]
    Parse {
        file: PathBuf,
        error: Box<toml::de::Error>,
    },

    #[error("failed to serialize config: {error}")]
    Serialize { error: Box<toml::ser::Error> },

    #[error("failed to read config file {file}: {error}")]
    ReadConfig {
        file: PathBuf,
        error: std::io::Error,
    },

    #[error("failed to get parent directory of {file}")]
    GetParentDirectory { file: PathBuf },

    #[error("failed to create directory {dir}: {error}")]
    CreateDirectory { dir: PathBuf, error: std::io::Error },

    #[error("failed to write file {file}: {error}")]
    WriteFile {
        file: PathBuf,
        error: std::io::Error,
    },

    #[cfg(unix)]
    #[error("failed to set permissions for directory {dir}: {error}")]
    SetPermissions { dir: PathBuf, error: std::io::Error },
}

// Create the TOML representation of the provided config, only if it doesn't already exist
pub(crate) fn create_config_file<C>(file_path: &PathBuf, config: C) -> Result<C, ConfigSetupError>
where
    C: Serialize,
{
    let config_str = toml::to_string(&config).map_err(|error| ConfigSetupError::Serialize {
        error: Box::new(error),
    })?;

    let config_dir = file_path
        .parent()
        .ok_or_else(|| ConfigSetupError::GetParentDirectory {
            file: file_path.clone(),
        })?;
    fs::create_dir_all(config_dir).map_err(|error| ConfigSetupError::CreateDirectory {
        dir: config_dir.to_path_buf(),
        error,
    })?;

    if !file_path.exists() {
        fs::write(file_path, config_str).map_err(|error| ConfigSetupError::WriteFile {
            file: file_path.clone(),
            error,
        })?;
        info!("Config file created at {}", file_path.display());
    }
    Ok(config)
}

pub(crate) fn read_config_file<C>(file_path: &PathBuf) -> Result<C, ConfigSetupError>
where
    C: DeserializeOwned,
{
    let file_content =
        fs::read_to_string(file_path).map_err(|error| ConfigSetupError::ReadConfig {
            file: file_path.clone(),
            error,
        })?;
    toml::from_str(&file_content).map_err(|error| ConfigSetupError::Parse {
        file: file_path.clone(),
        error: Box::new(error),
    })
}

pub(crate) fn write_config_file<C>(file_path: &PathBuf, config: C) -> Result<C, ConfigSetupError>
where
    C: Serialize,
{
    let config_str = toml::to_string(&config).map_err(|error| ConfigSetupError::Serialize {
        error: Box::new(error),
    })?;
    fs::write(file_path, config_str).map_err(|error| ConfigSetupError::WriteFile {
        file: file_path.clone(),
        error,
    })?;
    Ok(config)
}

pub(crate) fn create_data_dir(data_dir: &PathBuf) -> Result<(), ConfigSetupError> {
    fs::create_dir_all(data_dir).map_err(|error| ConfigSetupError::CreateDirectory {
        dir: data_dir.clone(),
        error,
    })?;
    info!("Making sure data dir exists at {}", data_dir.display());

    #[cfg(unix)]
    {
        // 700: the data dir holds device keys
        let permissions = fs::Permissions::from_mode(0o700);
        fs::set_permissions(data_dir, permissions).map_err(|error| {
            ConfigSetupError::SetPermissions {
                dir: data_dir.clone(),
                error,
            }
        })?;
    }

    Ok(())
}
