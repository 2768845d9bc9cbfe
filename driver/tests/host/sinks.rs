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

use crate::common::test_data;
use crate::host::scratch_path;
use googletest::prelude::*;
use rstest::*;
use std::fs;
use std::path::Path;
use zynq_pl::loader::{BitstreamSink, CatSink, DirectSink};

fn sink(kind: &str, device: &Path) -> Box<dyn BitstreamSink> {
    match kind {
        "cat" => Box::new(CatSink::new(device)),
        _ => Box::new(DirectSink::new(device)),
    }
}

#[gtest]
#[rstest]
#[case::cat("cat")]
#[case::direct("direct")]
fn test_bitstream_reaches_device(#[case] kind: &str) {
    let device = scratch_path(&format!("{kind}_device"));
    fs::write(&device, b"").expect("failed to create fake device");
    let bitstream = test_data("sample.bit.bin");

    let r = sink(kind, &device).deliver(&bitstream);
    expect_that!(r, ok(anything()));
    expect_that!(
        fs::read(&device).expect("failed to read back fake device"),
        eq(&fs::read(&bitstream).expect("failed to read bitstream"))
    );
    let _ = fs::remove_file(&device);
}

#[gtest]
#[rstest]
#[case::cat("cat")]
#[case::direct("direct")]
fn test_missing_bitstream_fails(#[case] kind: &str) {
    let device = scratch_path(&format!("{kind}_device_missing_bitstream"));
    fs::write(&device, b"").expect("failed to create fake device");

    let r = sink(kind, &device).deliver(&test_data("no_such.bit.bin"));
    expect_that!(
        r,
        err(displays_as(contains_substring("ZynqError::ConfigurationFailed")))
    );
    let _ = fs::remove_file(&device);
}

#[gtest]
#[rstest]
#[case::cat("cat")]
#[case::direct("direct")]
fn test_missing_device_fails(#[case] kind: &str) {
    let device = scratch_path(&format!("{kind}_no_device_dir")).join("xdevcfg");
    let r = sink(kind, &device).deliver(&test_data("sample.bit.bin"));
    expect_that!(
        r,
        err(displays_as(contains_substring("ZynqError::ConfigurationFailed")))
    );
}
