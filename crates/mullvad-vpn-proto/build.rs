// Copyright 2025 - Mullvad VPN AB
// SPDX-License-Identifier: GPL-3.0-only

use std::{env, path::PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Point prost-build at a bundled `protoc` binary when the environment does
    // not already provide one, so the build does not depend on a system install.
    if env::var_os("PROTOC").is_none() {
        if let Ok(protoc) = protoc_bin_vendored::protoc_bin_path() {
            env::set_var("PROTOC", protoc);
        }
    }

    // needed for reflection
    let mgmt_fd =
        PathBuf::from(env::var("OUT_DIR").unwrap()).join("management_interface_descriptor.bin");
    tonic_build::configure()
        .file_descriptor_set_path(mgmt_fd)
        .compile(
            &["../../proto/mullvad/management_interface.proto"],
            &["../../proto/mullvad/"],
        )?;

    tonic_build::configure()
        // server implementation is handled by tonic-health crate
        .build_server(false)
        .compile(&["../../proto/grpc/health.proto"], &["../../proto/grpc/"])?;
    Ok(())
}
