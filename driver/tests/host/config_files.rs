// This file is part of zynq-pl, a user-space driver for the Zynq programmable logic GPIO register blocks.
//
// Copyright 2025 Canonical Ltd.
//
// SPDX-License-Identifier: GPL-3.0-only
//
// zynq-pl is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License version 3, as published by the Free Software Foundation.
//
// zynq-pl is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranties of MERCHANTABILITY, SATISFACTORY QUALITY, or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with this program.  If not, see http://www.gnu.org/licenses/.

use crate::host::scratch_path;
use googletest::prelude::*;
use rstest::*;
use std::fs;
use std::path::{Path, PathBuf};
use zynq_pl::config::{DriverConfig, config_from_file, load_layered_config};

const VENDOR: &str = r#"
[system_paths]
config_device = "/dev/vendor_cfg"
default_bitstream = "/lib/firmware/vendor.bin"

[register_map]
id_rev_base = 0x43C00000
"#;

const USER: &str = r#"
[system_paths]
default_bitstream = "/lib/firmware/user.bin"
"#;

fn write_config(name: &str, contents: &str) -> PathBuf {
    let path = scratch_path(name);
    fs::write(&path, contents).expect("failed to write config");
    path
}

#[gtest]
fn test_user_file_overrides_vendor_file() {
    let user = write_config("user.toml", USER);
    let vendor = write_config("vendor.toml", VENDOR);

    let config = load_layered_config(&user, &vendor);
    expect_that!(config.default_bitstream, eq(&PathBuf::from("/lib/firmware/user.bin")));
    expect_that!(config.config_device, eq(&PathBuf::from("/dev/vendor_cfg")));
    expect_that!(config.block_bases.id_rev, eq(0x43C0_0000));
    expect_that!(config.block_bases.dr, eq(0x4120_2000));
    expect_that!(config.mem_device, eq(&PathBuf::from("/dev/mem")));

    let _ = fs::remove_file(user);
    let _ = fs::remove_file(vendor);
}

#[gtest]
fn test_broken_user_file_is_ignored() {
    let user = write_config("broken_user.toml", "[system_paths\n");
    let vendor = write_config("good_vendor.toml", VENDOR);

    let config = load_layered_config(&user, &vendor);
    expect_that!(config.default_bitstream, eq(&PathBuf::from("/lib/firmware/vendor.bin")));

    let _ = fs::remove_file(user);
    let _ = fs::remove_file(vendor);
}

#[gtest]
#[rstest]
#[case::missing(
    "/nonexistent/zynq-pl/config.toml",
    err(displays_as(contains_substring("Config file not found")))
)]
#[case::directory("/etc/", err(displays_as(contains_substring("Config file not found"))))]
fn test_config_from_file_errors<M: for<'a> Matcher<&'a std::result::Result<DriverConfig, zynq_pl::ZynqError>>>(
    #[case] path: &str,
    #[case] condition: M,
) {
    let r = config_from_file(Path::new(path));
    expect_that!(r, condition);
}
