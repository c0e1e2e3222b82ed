// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

/// A Mullvad account number. Purely numeric, but treated as an opaque string
/// everywhere outside validation.
pub type AccountNumber = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountData {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expiry: time::OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherSubmission {
    pub seconds_added: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub new_expiry: time::OffsetDateTime,
}
