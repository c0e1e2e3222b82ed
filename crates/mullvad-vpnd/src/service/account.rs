// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

//! Account and device state owned by the daemon, persisted in the data
//! directory.

use std::{collections::HashMap, path::PathBuf};

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};

use mullvad_vpn_types::{
    account::{AccountData, AccountNumber, VoucherSubmission},
    device::{
        AccountAndDevice, Device, DeviceEvent, DeviceEventCause, DeviceId, DeviceState,
        RemoveDeviceEvent,
    },
    wireguard,
};

use super::config::{self, ConfigSetupError};

const MAX_DEVICES_PER_ACCOUNT: usize = 5;
const ACCOUNT_TIME_ON_CREATION: time::Duration = time::Duration::days(30);
const VOUCHER_TIME: time::Duration = time::Duration::days(30);

const DEVICE_ADJECTIVES: &[&str] = &[
    "alert", "brave", "calm", "eager", "fancy", "happy", "keen", "merry", "proud", "swift",
];
const DEVICE_NOUNS: &[&str] = &[
    "otter", "lynx", "heron", "moose", "raven", "viper", "wombat", "gecko", "stoat", "curlew",
];

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("the account does not exist")]
    InvalidAccount,

    #[error("no account is logged in")]
    NotLoggedIn,

    #[error("an account is already logged in")]
    AlreadyLoggedIn,

    #[error("there are too many devices on the account")]
    TooManyDevices,

    #[error("the device was not found")]
    DeviceNotFound,

    #[error("the voucher code is invalid")]
    InvalidVoucher,

    #[error("the voucher code has already been used")]
    UsedVoucher,

    #[error("failed to persist account state")]
    Persist(#[source] ConfigSetupError),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AccountStore {
    history: Option<AccountNumber>,
    /// Accounts known to this daemon, with their expiry.
    accounts: HashMap<AccountNumber, AccountData>,
    /// Devices registered per account.
    devices: HashMap<AccountNumber, Vec<Device>>,
    /// Vouchers that have already been redeemed.
    used_vouchers: Vec<String>,
    current: Option<CurrentDevice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CurrentDevice {
    account_number: AccountNumber,
    device_id: DeviceId,
    private_key: [u8; 32],
}

pub(crate) struct AccountManager {
    store: AccountStore,
    path: PathBuf,
}

impl AccountManager {
    pub(crate) fn load(path: PathBuf) -> Self {
        let store = match config::read_config_file(&path) {
            Ok(store) => store,
            Err(ConfigSetupError::ReadConfig { error, .. })
                if error.kind() == std::io::ErrorKind::NotFound =>
            {
                AccountStore::default()
            }
            Err(error) => {
                tracing::error!("Failed to load account state, starting logged out: {error}");
                AccountStore::default()
            }
        };
        Self { store, path }
    }

    fn persist(&self) -> Result<(), AccountError> {
        config::create_config_file(&self.path, &self.store).map_err(AccountError::Persist)?;
        config::write_config_file(&self.path, &self.store).map_err(AccountError::Persist)?;
        Ok(())
    }

    pub(crate) fn device_state(&self) -> DeviceState {
        match &self.store.current {
            Some(current) => {
                let device = self
                    .store
                    .devices
                    .get(&current.account_number)
                    .and_then(|devices| {
                        devices
                            .iter()
                            .find(|device| device.id == current.device_id)
                    });
                match device {
                    Some(device) => DeviceState::LoggedIn(AccountAndDevice {
                        account_number: current.account_number.clone(),
                        device: device.clone(),
                    }),
                    // The device was removed behind our back.
                    None => DeviceState::Revoked,
                }
            }
            None => DeviceState::LoggedOut,
        }
    }

    pub(crate) fn history(&self) -> Option<AccountNumber> {
        self.store.history.clone()
    }

    pub(crate) fn clear_history(&mut self) -> Result<(), AccountError> {
        self.store.history = None;
        self.persist()
    }

    pub(crate) fn account_data(&self, account: &str) -> Result<AccountData, AccountError> {
        self.store
            .accounts
            .get(account)
            .cloned()
            .ok_or(AccountError::InvalidAccount)
    }

    pub(crate) fn create_account(&mut self) -> Result<(AccountNumber, DeviceEvent), AccountError> {
        if self.store.current.is_some() {
            return Err(AccountError::AlreadyLoggedIn);
        }

        let number = generate_account_number();
        self.store.accounts.insert(
            number.clone(),
            AccountData {
                id: uuid_like_id(),
                expiry: time::OffsetDateTime::now_utc() + ACCOUNT_TIME_ON_CREATION,
            },
        );
        let event = self.login(number.clone())?;
        Ok((number, event))
    }

    pub(crate) fn login(&mut self, account: AccountNumber) -> Result<DeviceEvent, AccountError> {
        if self.store.current.is_some() {
            return Err(AccountError::AlreadyLoggedIn);
        }
        if !is_valid_account_number(&account) {
            return Err(AccountError::InvalidAccount);
        }

        // Logging in to an unknown but well-formed account registers it,
        // since there is no API backend to ask.
        self.store
            .accounts
            .entry(account.clone())
            .or_insert_with(|| AccountData {
                id: uuid_like_id(),
                expiry: time::OffsetDateTime::now_utc() + ACCOUNT_TIME_ON_CREATION,
            });

        let devices = self.store.devices.entry(account.clone()).or_default();
        if devices.len() >= MAX_DEVICES_PER_ACCOUNT {
            return Err(AccountError::TooManyDevices);
        }

        let private_key = StaticSecret::random_from_rng(rand::rngs::OsRng);
        let device = Device {
            id: uuid_like_id(),
            name: generate_device_name(devices),
            pubkey: PublicKey::from(&private_key).to_bytes(),
            hijack_dns: false,
            created: time::OffsetDateTime::now_utc(),
        };
        devices.push(device.clone());

        self.store.current = Some(CurrentDevice {
            account_number: account.clone(),
            device_id: device.id.clone(),
            private_key: private_key.to_bytes(),
        });
        self.store.history = Some(account.clone());
        self.persist()?;

        Ok(DeviceEvent {
            cause: DeviceEventCause::LoggedIn,
            new_state: DeviceState::LoggedIn(AccountAndDevice {
                account_number: account,
                device,
            }),
        })
    }

    pub(crate) fn logout(&mut self) -> Result<DeviceEvent, AccountError> {
        let current = self.store.current.take().ok_or(AccountError::NotLoggedIn)?;
        if let Some(devices) = self.store.devices.get_mut(&current.account_number) {
            devices.retain(|device| device.id != current.device_id);
        }
        self.persist()?;

        Ok(DeviceEvent {
            cause: DeviceEventCause::LoggedOut,
            new_state: DeviceState::LoggedOut,
        })
    }

    pub(crate) fn submit_voucher(
        &mut self,
        voucher: String,
    ) -> Result<VoucherSubmission, AccountError> {
        let current = self.store.current.as_ref().ok_or(AccountError::NotLoggedIn)?;
        let normalized: String = voucher
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        if normalized.len() != 16 || !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AccountError::InvalidVoucher);
        }
        if self.store.used_vouchers.contains(&normalized) {
            return Err(AccountError::UsedVoucher);
        }

        let account_number = current.account_number.clone();
        let data = self
            .store
            .accounts
            .get_mut(&account_number)
            .ok_or(AccountError::InvalidAccount)?;
        data.expiry += VOUCHER_TIME;
        let submission = VoucherSubmission {
            seconds_added: VOUCHER_TIME.whole_seconds() as u64,
            new_expiry: data.expiry,
        };
        self.store.used_vouchers.push(normalized);
        self.persist()?;
        Ok(submission)
    }

    pub(crate) fn list_devices(&self, account: &str) -> Result<Vec<Device>, AccountError> {
        if !self.store.accounts.contains_key(account) {
            return Err(AccountError::InvalidAccount);
        }
        Ok(self.store.devices.get(account).cloned().unwrap_or_default())
    }

    pub(crate) fn remove_device(
        &mut self,
        account: &str,
        device_id: &str,
    ) -> Result<RemoveDeviceEvent, AccountError> {
        let devices = self
            .store
            .devices
            .get_mut(account)
            .ok_or(AccountError::InvalidAccount)?;
        let index = devices
            .iter()
            .position(|device| device.id == device_id)
            .ok_or(AccountError::DeviceNotFound)?;
        devices.remove(index);
        let new_devices = devices.clone();

        // Removing the device we are running as revokes the login.
        if let Some(current) = &self.store.current {
            if current.account_number == account && current.device_id == device_id {
                self.store.current = None;
            }
        }
        self.persist()?;

        Ok(RemoveDeviceEvent {
            account_number: account.to_string(),
            new_devices,
        })
    }

    pub(crate) fn rotate_key(&mut self) -> Result<DeviceEvent, AccountError> {
        let current = self.store.current.as_mut().ok_or(AccountError::NotLoggedIn)?;
        let private_key = StaticSecret::random_from_rng(rand::rngs::OsRng);
        let pubkey = PublicKey::from(&private_key).to_bytes();
        current.private_key = private_key.to_bytes();

        let account_number = current.account_number.clone();
        let device_id = current.device_id.clone();
        let devices = self
            .store
            .devices
            .get_mut(&account_number)
            .ok_or(AccountError::DeviceNotFound)?;
        let device = devices
            .iter_mut()
            .find(|device| device.id == device_id)
            .ok_or(AccountError::DeviceNotFound)?;
        device.pubkey = pubkey;
        device.created = time::OffsetDateTime::now_utc();
        let device = device.clone();
        self.persist()?;

        Ok(DeviceEvent {
            cause: DeviceEventCause::RotatedKey,
            new_state: DeviceState::LoggedIn(AccountAndDevice {
                account_number,
                device,
            }),
        })
    }

    pub(crate) fn wireguard_key(&self) -> Result<wireguard::PublicKey, AccountError> {
        match self.device_state() {
            DeviceState::LoggedIn(account_and_device) => Ok(wireguard::PublicKey {
                key: account_and_device.device.pubkey,
                created: account_and_device.device.created,
            }),
            _ => Err(AccountError::NotLoggedIn),
        }
    }

    /// Forget everything, including the on-disk state.
    pub(crate) fn factory_reset(&mut self) -> Result<(), AccountError> {
        self.store = AccountStore::default();
        self.persist()
    }
}

fn is_valid_account_number(account: &str) -> bool {
    (10..=16).contains(&account.len()) && account.chars().all(|c| c.is_ascii_digit())
}

fn generate_account_number() -> AccountNumber {
    let mut rng = rand::thread_rng();
    (0..16).map(|_| char::from(b'0' + rng.gen_range(0..10))).collect()
}

fn uuid_like_id() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    hex::encode(bytes)
}

fn generate_device_name(existing: &[Device]) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let adjective = DEVICE_ADJECTIVES.choose(&mut rng).unwrap_or(&"quiet");
        let noun = DEVICE_NOUNS.choose(&mut rng).unwrap_or(&"mole");
        let name = format!("{adjective} {noun}");
        if !existing.iter().any(|device| device.name == name) {
            return name;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (AccountManager, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let manager = AccountManager::load(dir.path().join("account.toml"));
        (manager, dir)
    }

    #[test]
    fn create_account_logs_in() {
        let (mut manager, _dir) = manager();
        let (number, event) = manager.create_account().unwrap();
        assert!(is_valid_account_number(&number));
        assert!(matches!(event.cause, DeviceEventCause::LoggedIn));
        assert!(manager.device_state().is_logged_in());
    }

    #[test]
    fn login_rejects_malformed_numbers() {
        let (mut manager, _dir) = manager();
        assert!(matches!(
            manager.login("not-a-number".to_string()),
            Err(AccountError::InvalidAccount)
        ));
        assert!(matches!(
            manager.login("123".to_string()),
            Err(AccountError::InvalidAccount)
        ));
    }

    #[test]
    fn double_login_is_rejected() {
        let (mut manager, _dir) = manager();
        manager.login("1234567890123456".to_string()).unwrap();
        assert!(matches!(
            manager.login("1234567890123456".to_string()),
            Err(AccountError::AlreadyLoggedIn)
        ));
    }

    #[test]
    fn logout_removes_own_device() {
        let (mut manager, _dir) = manager();
        manager.login("1234567890123456".to_string()).unwrap();
        manager.logout().unwrap();
        assert!(!manager.device_state().is_logged_in());
        assert!(manager
            .list_devices("1234567890123456")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn removing_current_device_revokes_login() {
        let (mut manager, _dir) = manager();
        manager.login("1234567890123456".to_string()).unwrap();
        let device_id = manager
            .device_state()
            .logged_in()
            .unwrap()
            .device
            .id
            .clone();
        manager
            .remove_device("1234567890123456", &device_id)
            .unwrap();
        assert!(matches!(manager.device_state(), DeviceState::Revoked | DeviceState::LoggedOut));
    }

    #[test]
    fn key_rotation_changes_pubkey() {
        let (mut manager, _dir) = manager();
        manager.login("1234567890123456".to_string()).unwrap();
        let before = manager.wireguard_key().unwrap();
        let event = manager.rotate_key().unwrap();
        assert!(matches!(event.cause, DeviceEventCause::RotatedKey));
        let after = manager.wireguard_key().unwrap();
        assert_ne!(before.key, after.key);
    }

    #[test]
    fn vouchers_extend_expiry_once() {
        let (mut manager, _dir) = manager();
        manager.login("1234567890123456".to_string()).unwrap();
        let before = manager.account_data("1234567890123456").unwrap().expiry;

        let submission = manager
            .submit_voucher("AAAA-BBBB-CCCC-DDDD".to_string())
            .unwrap();
        assert_eq!(submission.seconds_added, 30 * 24 * 60 * 60);
        assert!(submission.new_expiry > before);

        assert!(matches!(
            manager.submit_voucher("AAAA-BBBB-CCCC-DDDD".to_string()),
            Err(AccountError::UsedVoucher)
        ));
        assert!(matches!(
            manager.submit_voucher("short".to_string()),
            Err(AccountError::InvalidVoucher)
        ));
    }
}
