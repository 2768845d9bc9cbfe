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

//! Lifecycle controller and public operation surface.
//!
//! A [`Driver`] owns the mapped register blocks, the configuration loader and the
//! operating mode. There is no global state: a process that wants to talk to the
//! programmable logic builds one `Driver` and drives it through
//!
//! ```text
//! Unopened --init(REQUEST_PROGRAM)--> Configured
//!          --init(REQUEST_OPEN)-----> Mapped --(test mode set up)--> Initialized
//! any      --close------------------> Closed --init--> ...
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! # use zynq_pl::{BlockSelector, ChannelMask, Driver, InitFlags, OpMode};
//! # use zynq_pl::config::DriverConfig;
//! # fn example() -> Result<(), zynq_pl::error::ZynqError> {
//! let mut driver = Driver::with_hardware(&DriverConfig::default());
//! driver.init(OpMode::Test, InitFlags::REQUEST_OPEN)?;
//! driver.write(BlockSelector::Dr, &[0x0003_0003, 0], ChannelMask::CHANNEL1)?;
//! let [ch1, _] = driver.read(BlockSelector::Dr, ChannelMask::CHANNEL1)?;
//! driver.close()?;
//! # Ok(())
//! # }
//! ```

use crate::clock;
use crate::config::DriverConfig;
use crate::error::ZynqError;
use crate::loader::{BitstreamSink, CatSink, ConfigLoader};
use crate::mapper::AddressSpace;
use crate::memory::PhysicalMemory;
use crate::memory::devmem::DevMem;
use crate::registers::{
    ALL_OUTPUTS, BlockSelector, ChannelMask, DebugLevel, InitFlags, MAX_CHANS, OpMode,
};
use log::{debug, error};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Unopened,
    Configured,
    Mapped,
    Initialized,
    Closed,
}

pub struct Driver {
    space: AddressSpace,
    loader: ConfigLoader,
    state: DriverState,
    op_mode: OpMode,
    initialized: bool,
    debug_level: DebugLevel,
}

impl Driver {
    /// Build a driver over the given physical memory and bitstream sink.
    pub fn new(
        config: &DriverConfig,
        memory: Box<dyn PhysicalMemory>,
        sink: Box<dyn BitstreamSink>,
    ) -> Driver {
        Driver {
            space: AddressSpace::new(memory, config.block_bases),
            loader: ConfigLoader::new(sink, &config.prog_done, &config.default_bitstream),
            state: DriverState::Unopened,
            op_mode: OpMode::Normal,
            initialized: false,
            debug_level: DebugLevel::empty(),
        }
    }

    /// Build a driver over `/dev/mem` that programs the fabric with `cat`.
    pub fn with_hardware(config: &DriverConfig) -> Driver {
        Driver::new(
            config,
            Box::new(DevMem::new(&config.mem_device)),
            Box::new(CatSink::new(&config.config_device)),
        )
    }

    /// Set which classes of diagnostics are emitted.
    ///
    /// This adjusts the process-wide `log` max level, since that is where the
    /// messages go.
    pub fn set_debug_level(&mut self, level: DebugLevel) {
        self.debug_level = level;
        log::set_max_level(level.level_filter());
    }

    pub fn debug_level(&self) -> DebugLevel {
        self.debug_level
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn op_mode(&self) -> OpMode {
        self.op_mode
    }

    pub fn is_programmed(&self) -> bool {
        self.loader.is_programmed()
    }

    pub fn is_open(&self) -> bool {
        self.space.is_open()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Bring the programmable logic up.
    ///
    /// 1. With `REQUEST_PROGRAM`, load the default bitstream.
    /// 2. With `REQUEST_OPEN`, check the fabric reports configured, then map the
    ///    register blocks.
    /// 3. In [`OpMode::Test`], once mapped, make both CR channels outputs and write
    ///    `(0, mode)` to them.
    ///
    /// Stops at the first failing step. The driver only counts as initialized
    /// when every requested step succeeded; after a failure call
    /// [`Driver::close`] before trying again.
    ///
    /// # Returns: `Result<(), ZynqError>`
    /// * `Ok(())` - Every requested step succeeded
    /// * `Err(ZynqError::ConfigurationFailed)` - Programming failed
    /// * `Err(ZynqError::NotReady)` - The fabric is not configured
    /// * `Err(ZynqError::AlreadyOpen)` / `Err(ZynqError::MapFailure)` - Mapping failed
    pub fn init(&mut self, op_mode: OpMode, flags: InitFlags) -> Result<(), ZynqError> {
        debug!("init: op_mode={op_mode:?}, flags={flags:?}");
        self.initialized = false;

        if flags.contains(InitFlags::REQUEST_PROGRAM) {
            self.loader
                .program(None)
                .inspect_err(|e| error!("init: Error in program() call: {e}"))?;
            if matches!(self.state, DriverState::Unopened | DriverState::Closed) {
                self.state = DriverState::Configured;
            }
        }

        if flags.contains(InitFlags::REQUEST_OPEN) {
            self.loader
                .check_ready()
                .inspect_err(|e| error!("init: Error in check_ready() call: {e}"))?;
            self.space
                .open()
                .inspect_err(|e| error!("init: Error in open() call: {e}"))?;
            self.state = DriverState::Mapped;
        }

        if self.space.is_open() {
            // Recorded before CR is touched, so a failed setup still reports the mode.
            self.op_mode = op_mode;
            if op_mode == OpMode::Test {
                self.enter_test_mode()
                    .inspect_err(|e| error!("init: Error entering test mode: {e}"))?;
            }
            self.state = DriverState::Initialized;
        }

        self.initialized = true;
        Ok(())
    }

    fn enter_test_mode(&mut self) -> Result<(), ZynqError> {
        self.space
            .write_direction(BlockSelector::Cr, &[ALL_OUTPUTS; MAX_CHANS], ChannelMask::all())?;
        self.space.write_data(
            BlockSelector::Cr,
            &[0, OpMode::Test.raw()],
            ChannelMask::all(),
        )
    }

    /// Program the fabric with `bitstream` without touching the mapping.
    pub fn program(&mut self, bitstream: Option<&Path>) -> Result<(), ZynqError> {
        self.loader.program(bitstream)?;
        if matches!(self.state, DriverState::Unopened | DriverState::Closed) {
            self.state = DriverState::Configured;
        }
        Ok(())
    }

    /// Check the fabric reports configured, without touching the mapping.
    pub fn check_ready(&mut self) -> Result<(), ZynqError> {
        self.loader.check_ready()
    }

    /// Unmap the register blocks and release the memory device.
    ///
    /// The driver ends up `Closed`, not initialized and in normal mode whatever
    /// the outcome.
    ///
    /// # Returns: `Result<(), ZynqError>`
    /// * `Ok(())` - Everything was released
    /// * `Err(ZynqError::NotOpen)` - Nothing was mapped
    /// * `Err(ZynqError::UnmapFailure)` - A block could not be unmapped
    pub fn close(&mut self) -> Result<(), ZynqError> {
        let outcome = self.space.close();
        self.initialized = false;
        self.op_mode = OpMode::Normal;
        self.state = DriverState::Closed;
        match &outcome {
            Ok(()) => debug!("close: Unmap memory successful..."),
            Err(e) => error!("close: Error in close() call: {e}"),
        }
        outcome
    }

    /// Latch a completed write into the fabric when in test mode.
    fn latch(&mut self, op: &str) -> Result<(), ZynqError> {
        if self.op_mode == OpMode::Test {
            clock::pulse(&mut self.space)
                .inspect_err(|e| error!("{op}: Error in clock pulse: {e}"))?;
        }
        Ok(())
    }

    /// Set the direction word of each masked channel. Bit *i* set makes pin *i* an output.
    pub fn set_direction<S>(
        &mut self,
        selector: S,
        direction: &[u32],
        mask: ChannelMask,
    ) -> Result<(), ZynqError>
    where
        S: TryInto<BlockSelector>,
        ZynqError: From<S::Error>,
    {
        self.space
            .write_direction(selector, direction, mask)
            .inspect_err(|e| error!("set_direction: {e}"))
    }

    pub fn get_direction<S>(
        &self,
        selector: S,
        mask: ChannelMask,
    ) -> Result<[u32; MAX_CHANS], ZynqError>
    where
        S: TryInto<BlockSelector>,
        ZynqError: From<S::Error>,
    {
        self.space
            .read_direction(selector, mask)
            .inspect_err(|e| error!("get_direction: {e}"))
    }

    /// Write the data word of each masked channel, then pulse the clock in test mode.
    pub fn write<S>(
        &mut self,
        selector: S,
        data: &[u32],
        mask: ChannelMask,
    ) -> Result<(), ZynqError>
    where
        S: TryInto<BlockSelector>,
        ZynqError: From<S::Error>,
    {
        self.space
            .write_data(selector, data, mask)
            .inspect_err(|e| error!("write: {e}"))?;
        self.latch("write")
    }

    /// Replace the low half of each masked data word, then pulse the clock in test mode.
    pub fn write_lower_word<S>(
        &mut self,
        selector: S,
        data: &[u32],
        mask: ChannelMask,
    ) -> Result<(), ZynqError>
    where
        S: TryInto<BlockSelector>,
        ZynqError: From<S::Error>,
    {
        self.space
            .write_lower_word(selector, data, mask)
            .inspect_err(|e| error!("write_lower_word: {e}"))?;
        self.latch("write_lower_word")
    }

    /// Replace the high half of each masked data word, then pulse the clock in test mode.
    pub fn write_upper_word<S>(
        &mut self,
        selector: S,
        data: &[u32],
        mask: ChannelMask,
    ) -> Result<(), ZynqError>
    where
        S: TryInto<BlockSelector>,
        ZynqError: From<S::Error>,
    {
        self.space
            .write_upper_word(selector, data, mask)
            .inspect_err(|e| error!("write_upper_word: {e}"))?;
        self.latch("write_upper_word")
    }

    pub fn read<S>(&self, selector: S, mask: ChannelMask) -> Result<[u32; MAX_CHANS], ZynqError>
    where
        S: TryInto<BlockSelector>,
        ZynqError: From<S::Error>,
    {
        self.space
            .read_full(selector, mask)
            .inspect_err(|e| error!("read: {e}"))
    }

    pub fn read_lower_word<S>(
        &self,
        selector: S,
        mask: ChannelMask,
    ) -> Result<[u32; MAX_CHANS], ZynqError>
    where
        S: TryInto<BlockSelector>,
        ZynqError: From<S::Error>,
    {
        self.space
            .read_lower_word(selector, mask)
            .inspect_err(|e| error!("read_lower_word: {e}"))
    }

    pub fn read_upper_word<S>(
        &self,
        selector: S,
        mask: ChannelMask,
    ) -> Result<[u32; MAX_CHANS], ZynqError>
    where
        S: TryInto<BlockSelector>,
        ZynqError: From<S::Error>,
    {
        self.space
            .read_upper_word(selector, mask)
            .inspect_err(|e| error!("read_upper_word: {e}"))
    }

    /// FPGA identification and revision, from the two ID_REV channels.
    pub fn identity(&self) -> Result<(u32, u32), ZynqError> {
        let [id, rev] = self.read(BlockSelector::IdRev, ChannelMask::all())?;
        Ok((id, rev))
    }
}
