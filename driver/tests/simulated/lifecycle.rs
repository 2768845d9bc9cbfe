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

use crate::common::*;
use googletest::prelude::*;
use rstest::*;
use zynq_pl::memory::simulated::SimulatedMemory;
use zynq_pl::{DriverState, InitFlags, OpMode, ZynqError};

#[gtest]
#[rstest]
fn test_open_maps_three_windows(memory: SimulatedMemory) {
    let mut driver = simulated_driver(&memory, "prog_done_ready");
    expect_that!(driver.init(OpMode::Normal, InitFlags::REQUEST_OPEN), ok(anything()));
    expect_that!(driver.state(), eq(DriverState::Initialized));
    expect_that!(driver.is_open(), eq(true));
    expect_that!(driver.is_programmed(), eq(true));
    expect_that!(driver.is_initialized(), eq(true));
    expect_that!(memory.live_windows(), eq(3));
}

#[gtest]
#[rstest]
fn test_program_and_open(memory: SimulatedMemory) {
    let mut driver = simulated_driver(&memory, "prog_done_ready");
    expect_that!(driver.init(OpMode::Normal, InitFlags::all()), ok(anything()));
    expect_that!(driver.state(), eq(DriverState::Initialized));
    expect_that!(driver.close(), ok(anything()));
    expect_that!(driver.state(), eq(DriverState::Closed));
    expect_that!(memory.live_windows(), eq(0));
    expect_that!(memory.is_device_open(), eq(false));
}

#[gtest]
#[rstest]
#[case::not_ready("prog_done_not_ready")]
#[case::empty("prog_done_empty")]
#[case::missing("no_such_prog_done")]
fn test_unconfigured_fabric_is_not_mapped(memory: SimulatedMemory, #[case] status: &str) {
    let mut driver = simulated_driver(&memory, status);
    let r = driver.init(OpMode::Normal, InitFlags::REQUEST_OPEN);
    expect_that!(r, err(displays_as(contains_substring("ZynqError::NotReady"))));
    expect_that!(driver.state(), eq(DriverState::Unopened));
    expect_that!(driver.is_initialized(), eq(false));
    expect_that!(driver.is_programmed(), eq(false));
    expect_that!(memory.is_device_open(), eq(false));
    expect_that!(memory.live_windows(), eq(0));
}

#[gtest]
#[rstest]
#[case::id_rev(0)]
#[case::cr(1)]
#[case::dr(2)]
fn test_failed_window_releases_the_others(memory: SimulatedMemory, #[case] failing_call: usize) {
    memory.fail_map_call(failing_call);
    let mut driver = simulated_driver(&memory, "prog_done_ready");
    let r = driver.init(OpMode::Normal, InitFlags::REQUEST_OPEN);
    expect_that!(r, err(displays_as(contains_substring("ZynqError::MapFailure"))));
    expect_that!(driver.state(), eq(DriverState::Unopened));
    expect_that!(driver.is_open(), eq(false));
    expect_that!(memory.live_windows(), eq(0));
    expect_that!(memory.is_device_open(), eq(false));

    expect_that!(driver.init(OpMode::Normal, InitFlags::REQUEST_OPEN), ok(anything()));
    expect_that!(memory.live_windows(), eq(3));
}

#[gtest]
#[rstest]
fn test_device_open_failure(memory: SimulatedMemory) {
    memory.fail_open();
    let mut driver = simulated_driver(&memory, "prog_done_ready");
    let r = driver.init(OpMode::Test, InitFlags::REQUEST_OPEN);
    expect_that!(r, err(displays_as(contains_substring("ZynqError::MapFailure"))));
    expect_that!(driver.op_mode(), eq(OpMode::Normal));
    expect_that!(memory.journal(), is_empty());
}

#[gtest]
#[rstest]
fn test_unmap_failure_still_closes(memory: SimulatedMemory) {
    memory.fail_unmap_of(0x4120_2000);
    let mut driver = simulated_driver(&memory, "prog_done_ready");
    driver.init(OpMode::Normal, InitFlags::REQUEST_OPEN).unwrap();
    let r = driver.close();
    expect_that!(r, err(displays_as(contains_substring("ZynqError::UnmapFailure: DR"))));
    expect_that!(driver.state(), eq(DriverState::Closed));
    expect_that!(driver.is_open(), eq(false));
    expect_that!(memory.is_device_open(), eq(false));
}

#[gtest]
#[rstest]
fn test_close_without_open(memory: SimulatedMemory) {
    let mut driver = simulated_driver(&memory, "prog_done_ready");
    let r = driver.close();
    assert!(matches!(r, Err(ZynqError::NotOpen(_))));
    expect_that!(driver.state(), eq(DriverState::Closed));
}

#[gtest]
#[rstest]
fn test_program_with_explicit_bitstream(memory: SimulatedMemory) {
    let mut driver = simulated_driver(&memory, "prog_done_ready");
    let bitstream = test_data("sample.bit.bin");
    expect_that!(driver.program(Some(&bitstream)), ok(anything()));
    expect_that!(driver.state(), eq(DriverState::Configured));
    expect_that!(driver.is_programmed(), eq(true));
    expect_that!(driver.is_open(), eq(false));
}
