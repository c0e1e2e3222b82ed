// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

/// A limitation on some aspect of relay selection: either anything goes, or
/// only the contained value is acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint<T> {
    Any,
    Only(T),
}

// Not derived: the derive would put a `T: Default` bound on the impl.
impl<T> Default for Constraint<T> {
    fn default() -> Self {
        Constraint::Any
    }
}

impl<T> Constraint<T> {
    pub fn is_any(&self) -> bool {
        matches!(self, Constraint::Any)
    }

    pub fn option(self) -> Option<T> {
        match self {
            Constraint::Any => None,
            Constraint::Only(value) => Some(value),
        }
    }

    pub fn as_ref(&self) -> Constraint<&T> {
        match self {
            Constraint::Any => Constraint::Any,
            Constraint::Only(ref value) => Constraint::Only(value),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Constraint<U> {
        match self {
            Constraint::Any => Constraint::Any,
            Constraint::Only(value) => Constraint::Only(f(value)),
        }
    }

    /// Whether `value` satisfies this constraint according to `predicate`.
    /// `Any` is satisfied by everything.
    pub fn matches_with<U, F: FnOnce(&T, &U) -> bool>(&self, value: &U, predicate: F) -> bool {
        match self {
            Constraint::Any => true,
            Constraint::Only(only) => predicate(only, value),
        }
    }
}

impl<T: PartialEq> Constraint<T> {
    pub fn matches_eq(&self, value: &T) -> bool {
        self.matches_with(value, |only, value| only == value)
    }
}

impl<T> From<Option<T>> for Constraint<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Constraint::Only(value),
            None => Constraint::Any,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_matches_everything() {
        let constraint: Constraint<u16> = Constraint::Any;
        assert!(constraint.matches_eq(&0));
        assert!(constraint.matches_eq(&u16::MAX));
    }

    #[test]
    fn only_matches_exact_value() {
        let constraint = Constraint::Only(51820u16);
        assert!(constraint.matches_eq(&51820));
        assert!(!constraint.matches_eq(&443));
    }

    #[test]
    fn serialized_form_is_stable() {
        assert_eq!(serde_json::to_string(&Constraint::<u16>::Any).unwrap(), "\"any\"");
        assert_eq!(
            serde_json::to_string(&Constraint::Only(443u16)).unwrap(),
            "{\"only\":443}"
        );
    }
}
