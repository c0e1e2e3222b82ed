// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

mod connection_handler;
mod listener;
mod protobuf;
#[cfg(unix)]
mod socket_stream;
mod start;

pub(crate) use start::{start_command_interface, CommandInterfaceOptions, EventStreams};

#[cfg(test)]
pub(crate) use listener::{CommandInterface, ListenerType};
