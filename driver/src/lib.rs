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

//! User-space driver for the GPIO register blocks of a Zynq programmable logic design.
//!
//! The design exposes three AXI GPIO cores at fixed physical addresses:
//!
//! | block  | base          | contents                                   |
//! |--------|---------------|--------------------------------------------|
//! | ID_REV | `0x4120_0000` | FPGA id (channel 1), revision (channel 2)  |
//! | CR     | `0x4120_1000` | control; channel 1 is the software clock   |
//! | DR     | `0x4120_2000` | data                                       |
//!
//! [`Driver`] maps them through `/dev/mem`, programs the fabric through
//! `/dev/xdevcfg` and offers masked reads and writes of each channel's data and
//! direction words. The [`memory::simulated`] backend stands in for the hardware
//! so that everything can run on a development machine.

pub mod channel_io;
pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
pub mod loader;
pub mod mapper;
pub mod memory;
pub mod registers;
pub mod system_io;

pub use driver::{Driver, DriverState};
pub use error::ZynqError;
pub use registers::{BlockSelector, ChannelMask, DebugLevel, InitFlags, OpMode};
