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
use googletest::prelude::*;
use rstest::*;
use std::path::Path;
use zynq_pl::error::ZynqError;
use zynq_pl::system_io::{fs_read, fs_read_byte, fs_write_bytes};

#[gtest]
#[rstest]
#[case::not_found(
    "bad_input",
    err(displays_as(contains_substring("No such file or directory")))
)]
#[case::is_dir("/etc/", err(displays_as(contains_substring("Is a directory"))))]
#[case::ok("prog_done_ready", ok(eq("1\n")))]
fn test_fs_read<M: for<'a> Matcher<&'a std::result::Result<String, ZynqError>>>(
    #[case] name: &str,
    #[case] condition: M,
) {
    let path = if name.starts_with('/') {
        Path::new(name).to_owned()
    } else {
        test_data(name)
    };
    let r = fs_read(&path);
    expect_that!(r, condition);
}

#[gtest]
#[rstest]
#[case::ready("prog_done_ready", ok(some(eq(&b'1'))))]
#[case::not_ready("prog_done_not_ready", ok(some(eq(&b'0'))))]
#[case::empty("prog_done_empty", ok(none()))]
#[case::missing(
    "prog_done_missing",
    err(displays_as(contains_substring("ZynqError::IORead")))
)]
fn test_fs_read_byte<M: for<'a> Matcher<&'a std::result::Result<Option<u8>, ZynqError>>>(
    #[case] name: &str,
    #[case] condition: M,
) {
    let r = fs_read_byte(&test_data(name));
    expect_that!(r, condition);
}

#[gtest]
fn test_fs_write_bytes_requires_existing_file_unless_creating() {
    let path = crate::host::scratch_path("fs_write_bytes");
    let _ = std::fs::remove_file(&path);
    expect_that!(
        fs_write_bytes(&path, false, b"abc"),
        err(displays_as(contains_substring("ZynqError::IOWrite")))
    );
    expect_that!(fs_write_bytes(&path, true, b"abc"), ok(anything()));
    expect_that!(std::fs::read(&path).unwrap(), eq(&b"abc".to_vec()));
    let _ = std::fs::remove_file(&path);
}
