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
use zynq_pl::{BlockSelector, ChannelMask, Driver, InitFlags, OpMode};

fn test_mode_driver(memory: &SimulatedMemory) -> Driver {
    let mut driver = simulated_driver(memory, "prog_done_ready");
    driver
        .init(OpMode::Test, InitFlags::REQUEST_OPEN)
        .expect("simulated init failed");
    driver
}

#[gtest]
#[rstest]
fn test_init_configures_control_register(memory: SimulatedMemory) {
    let driver = test_mode_driver(&memory);
    expect_that!(driver.op_mode(), eq(OpMode::Test));
    expect_that!(memory.peek(CR_CH1_DIRECTION), eq(0xFFFF_FFFF));
    expect_that!(memory.peek(CR_CH2_DIRECTION), eq(0xFFFF_FFFF));
    expect_that!(memory.peek(CR_CH1_DATA), eq(0));
    expect_that!(memory.peek(CR_CH2_DATA), eq(1));
    // Entering test mode is not itself latched.
    expect_that!(memory.writes_to(CR_CH1_DATA), elements_are![eq(&0)]);
}

#[gtest]
#[rstest]
fn test_data_write_is_followed_by_one_clock_pulse(memory: SimulatedMemory) {
    let mut driver = test_mode_driver(&memory);
    memory.clear_journal();

    driver
        .write(BlockSelector::Dr, &[0x0003_0003, 0], ChannelMask::CHANNEL1)
        .unwrap();

    expect_that!(memory.peek(DR_CH1_DATA), eq(0x0003_0003));
    expect_that!(memory.writes_to(DR_CH1_DATA), elements_are![eq(&0x0003_0003)]);
    expect_that!(memory.writes_to(DR_CH2_DATA), is_empty());
    expect_that!(memory.writes_to(CR_CH1_DATA), elements_are![eq(&1), eq(&0)]);
    expect_that!(memory.writes_to(CR_CH2_DATA), is_empty());
}

#[gtest]
#[rstest]
#[case::lower_word(true)]
#[case::upper_word(false)]
fn test_half_word_write_is_latched(memory: SimulatedMemory, #[case] lower: bool) {
    let mut driver = test_mode_driver(&memory);
    memory.clear_journal();
    let r = if lower {
        driver.write_lower_word(BlockSelector::Dr, &[0xFFFF_FFFF, 0], ChannelMask::CHANNEL1)
    } else {
        driver.write_upper_word(BlockSelector::Dr, &[0xFFFF_FFFF, 0], ChannelMask::CHANNEL1)
    };
    expect_that!(r, ok(anything()));
    expect_that!(memory.writes_to(CR_CH1_DATA), elements_are![eq(&1), eq(&0)]);
}

#[gtest]
#[rstest]
fn test_direction_write_is_not_latched(memory: SimulatedMemory) {
    let mut driver = test_mode_driver(&memory);
    memory.clear_journal();
    driver
        .set_direction(BlockSelector::Dr, &[0xFFFF_FFFF, 0xFFFF_FFFF], ChannelMask::all())
        .unwrap();
    expect_that!(memory.writes_to(CR_CH1_DATA), is_empty());
}

#[gtest]
#[rstest]
fn test_normal_mode_write_is_not_latched(memory: SimulatedMemory) {
    let mut driver = simulated_driver(&memory, "prog_done_ready");
    driver.init(OpMode::Normal, InitFlags::REQUEST_OPEN).unwrap();
    memory.clear_journal();
    driver
        .write(BlockSelector::Dr, &[0x0003_0003, 0], ChannelMask::CHANNEL1)
        .unwrap();
    expect_that!(memory.writes_to(CR_CH1_DATA), is_empty());
    expect_that!(memory.journal().len(), eq(1));
}

#[gtest]
#[rstest]
fn test_reads_are_not_latched(memory: SimulatedMemory) {
    let driver = test_mode_driver(&memory);
    memory.clear_journal();
    driver.read(BlockSelector::Dr, ChannelMask::all()).unwrap();
    expect_that!(memory.writes_to(CR_CH1_DATA), is_empty());
}
