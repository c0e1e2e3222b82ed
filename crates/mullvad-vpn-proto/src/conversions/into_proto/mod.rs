// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

//! Native type → protobuf conversions. These are infallible: every native
//! value has a wire representation.

mod account;
mod net;
mod relay_list;
mod settings;
mod states;
