// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::relay_constraints::GeographicLocationConstraint;

/// Stable identity of a custom list. Names can be changed, ids cannot.
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
#[error("not a valid custom list id")]
pub struct ParseIdError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomList {
    pub id: Id,
    pub name: String,
    pub locations: Vec<GeographicLocationConstraint>,
}

impl CustomList {
    pub fn new(name: String) -> Self {
        Self {
            id: Id::random(),
            name,
            locations: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomListsSettings {
    custom_lists: Vec<CustomList>,
}

impl CustomListsSettings {
    pub fn iter(&self) -> impl Iterator<Item = &CustomList> {
        self.custom_lists.iter()
    }

    pub fn find(&self, id: &Id) -> Option<&CustomList> {
        self.custom_lists.iter().find(|list| &list.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&CustomList> {
        self.custom_lists.iter().find(|list| list.name == name)
    }

    /// Adds a list. Names must be unique across the settings.
    pub fn add(&mut self, list: CustomList) -> Result<(), Error> {
        if self.find_by_name(&list.name).is_some() {
            return Err(Error::ListExists);
        }
        self.custom_lists.push(list);
        Ok(())
    }

    pub fn remove(&mut self, id: &Id) -> Result<CustomList, Error> {
        let index = self
            .custom_lists
            .iter()
            .position(|list| &list.id == id)
            .ok_or(Error::ListNotFound)?;
        Ok(self.custom_lists.remove(index))
    }

    pub fn update(&mut self, new_list: CustomList) -> Result<(), Error> {
        if self
            .custom_lists
            .iter()
            .any(|list| list.id != new_list.id && list.name == new_list.name)
        {
            return Err(Error::ListExists);
        }
        let list = self
            .custom_lists
            .iter_mut()
            .find(|list| list.id == new_list.id)
            .ok_or(Error::ListNotFound)?;
        *list = new_list;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.custom_lists.clear();
    }
}

impl From<Vec<CustomList>> for CustomListsSettings {
    fn from(custom_lists: Vec<CustomList>) -> Self {
        Self { custom_lists }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("a list with that name already exists")]
    ListExists,
    #[error("no list with that id")]
    ListNotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_names() {
        let mut settings = CustomListsSettings::default();
        settings.add(CustomList::new("relays".to_string())).unwrap();
        assert_eq!(
            settings.add(CustomList::new("relays".to_string())),
            Err(Error::ListExists)
        );
    }

    #[test]
    fn update_replaces_by_id() {
        let mut settings = CustomListsSettings::default();
        let mut list = CustomList::new("old".to_string());
        settings.add(list.clone()).unwrap();

        list.name = "new".to_string();
        settings.update(list.clone()).unwrap();

        assert_eq!(settings.find(&list.id).unwrap().name, "new");
        assert!(settings.find_by_name("old").is_none());
    }
}
