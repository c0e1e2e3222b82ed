// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

//! Ways of reaching the Mullvad API, addressable by id so frontends can
//! toggle, test and replace them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::net::proxy::CustomProxy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(uuid::Uuid);

impl Id {
    pub fn random() -> Self {
        Id(uuid::Uuid::new_v4())
    }
}

impl FromStr for Id {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(Id).map_err(|_| ParseIdError)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("not a valid access method id")]
pub struct ParseIdError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMethod {
    BuiltIn(BuiltInAccessMethod),
    Custom(CustomProxy),
}

impl From<BuiltInAccessMethod> for AccessMethod {
    fn from(value: BuiltInAccessMethod) -> Self {
        AccessMethod::BuiltIn(value)
    }
}

impl From<CustomProxy> for AccessMethod {
    fn from(value: CustomProxy) -> Self {
        AccessMethod::Custom(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltInAccessMethod {
    Direct,
    Bridge,
    EncryptedDnsProxy,
}

impl fmt::Display for BuiltInAccessMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuiltInAccessMethod::Direct => write!(f, "Direct"),
            BuiltInAccessMethod::Bridge => write!(f, "Mullvad Bridges"),
            BuiltInAccessMethod::EncryptedDnsProxy => write!(f, "Encrypted DNS proxy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessMethodSetting {
    pub id: Id,
    pub name: String,
    pub enabled: bool,
    pub access_method: AccessMethod,
}

impl AccessMethodSetting {
    pub fn new(name: String, enabled: bool, access_method: AccessMethod) -> Self {
        Self {
            id: Id::random(),
            name,
            enabled,
            access_method,
        }
    }

    pub fn with_id(id: Id, name: String, enabled: bool, access_method: AccessMethod) -> Self {
        Self {
            id,
            name,
            enabled,
            access_method,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.access_method, AccessMethod::BuiltIn(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub access_method_settings: Vec<AccessMethodSetting>,
}

impl Settings {
    pub fn find(&self, id: &Id) -> Option<&AccessMethodSetting> {
        self.access_method_settings
            .iter()
            .find(|setting| &setting.id == id)
    }

    pub fn find_mut(&mut self, id: &Id) -> Option<&mut AccessMethodSetting> {
        self.access_method_settings
            .iter_mut()
            .find(|setting| &setting.id == id)
    }

    pub fn append(&mut self, setting: AccessMethodSetting) {
        self.access_method_settings.push(setting);
    }

    /// Removes a custom method. Built-in methods can be disabled but never
    /// removed.
    pub fn remove(&mut self, id: &Id) -> Result<(), Error> {
        let setting = self.find(id).ok_or(Error::NotFound)?;
        if setting.is_builtin() {
            return Err(Error::RemoveBuiltIn);
        }
        self.access_method_settings
            .retain(|setting| &setting.id != id);
        Ok(())
    }

    pub fn retain_builtin(&mut self) {
        self.access_method_settings
            .retain(AccessMethodSetting::is_builtin);
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            access_method_settings: vec![
                AccessMethodSetting::new(
                    BuiltInAccessMethod::Direct.to_string(),
                    true,
                    AccessMethod::BuiltIn(BuiltInAccessMethod::Direct),
                ),
                AccessMethodSetting::new(
                    BuiltInAccessMethod::Bridge.to_string(),
                    true,
                    AccessMethod::BuiltIn(BuiltInAccessMethod::Bridge),
                ),
                AccessMethodSetting::new(
                    BuiltInAccessMethod::EncryptedDnsProxy.to_string(),
                    true,
                    AccessMethod::BuiltIn(BuiltInAccessMethod::EncryptedDnsProxy),
                ),
            ],
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("no access method with that id")]
    NotFound,
    #[error("built-in access methods cannot be removed")]
    RemoveBuiltIn,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_methods_cannot_be_removed() {
        let mut settings = Settings::default();
        let direct_id = settings.access_method_settings[0].id;
        assert_eq!(settings.remove(&direct_id), Err(Error::RemoveBuiltIn));
    }

    #[test]
    fn custom_methods_can_be_removed() {
        let mut settings = Settings::default();
        let custom = AccessMethodSetting::new(
            "my proxy".to_string(),
            true,
            AccessMethod::Custom(CustomProxy::Socks5Remote(
                crate::net::proxy::Socks5Remote::new("10.0.0.1:1080".parse().unwrap()),
            )),
        );
        let id = custom.id;
        settings.append(custom);
        settings.remove(&id).unwrap();
        assert!(settings.find(&id).is_none());
    }
}
