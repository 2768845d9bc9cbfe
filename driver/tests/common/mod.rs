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

#![allow(dead_code)]

use rstest::*;
use std::path::{Path, PathBuf};
use zynq_pl::Driver;
use zynq_pl::config::DriverConfig;
use zynq_pl::error::ZynqError;
use zynq_pl::loader::BitstreamSink;
use zynq_pl::memory::simulated::SimulatedMemory;

pub const ID_REV_CH1_DATA: u64 = 0x4120_0000;
pub const ID_REV_CH2_DATA: u64 = 0x4120_0008;
pub const CR_CH1_DATA: u64 = 0x4120_1000;
pub const CR_CH1_DIRECTION: u64 = 0x4120_1004;
pub const CR_CH2_DATA: u64 = 0x4120_1008;
pub const CR_CH2_DIRECTION: u64 = 0x4120_100C;
pub const DR_CH1_DATA: u64 = 0x4120_2000;
pub const DR_CH2_DATA: u64 = 0x4120_2008;

pub fn test_data(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/test_data")
        .join(name)
}

/// Accepts every bitstream without touching the filesystem.
pub struct NullSink;

impl BitstreamSink for NullSink {
    fn deliver(&mut self, _bitstream: &Path) -> Result<(), ZynqError> {
        Ok(())
    }
}

/// A default configuration whose `prog_done` attribute is the named test data file.
pub fn config_with_status(status: &str) -> DriverConfig {
    DriverConfig {
        prog_done: test_data(status),
        ..DriverConfig::default()
    }
}

pub fn simulated_driver(memory: &SimulatedMemory, status: &str) -> Driver {
    Driver::new(
        &config_with_status(status),
        Box::new(memory.clone()),
        Box::new(NullSink),
    )
}

/// Route driver logging to the test harness. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Trace)
        .try_init();
}

#[fixture]
pub fn memory() -> SimulatedMemory {
    init_logging();
    SimulatedMemory::new()
}
