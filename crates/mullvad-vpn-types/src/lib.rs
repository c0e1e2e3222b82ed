// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

//! Value types shared between the daemon and its management clients.
//!
//! Everything here is a plain data type with `serde` support: settings are
//! persisted to disk, and most types cross the management interface after
//! conversion to their protobuf counterparts.

pub mod access_method;
pub mod account;
pub mod app_upgrade;
pub mod constraints;
pub mod custom_list;
pub mod device;
pub mod location;
pub mod net;
pub mod relay_constraints;
pub mod relay_list;
pub mod settings;
pub mod split_tunnel;
pub mod states;
pub mod version;
pub mod wireguard;

pub use constraints::Constraint;
