// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

tonic::include_proto!("mullvad_daemon.management_interface");

// client implementation only
tonic::include_proto!("grpc.health.v1");

// needed for reflection
pub const MGMT_FD_SET: &[u8] =
    tonic::include_file_descriptor_set!("management_interface_descriptor");

#[cfg(feature = "conversions")]
pub mod conversions;

#[cfg(feature = "client")]
pub mod client;
