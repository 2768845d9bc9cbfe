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

//! Register block data model.
//!
//! The programmable logic exposes three Xilinx AXI GPIO cores. Each core occupies
//! one 4 KiB page and starts with two channels, each made of a data word and a
//! direction (tri-state) word:
//!
//! ```text
//! offset  field
//! 0x000   channel 1 data
//! 0x004   channel 1 direction
//! 0x008   channel 2 data
//! 0x00C   channel 2 direction
//! 0x010   reserved ... up to 0xFFF
//! ```
//!
//! The structs below are never instantiated over hardware memory. They exist so
//! that field offsets are derived from a single `#[repr(C)]` layout instead of
//! being spelled out by hand.

use crate::error::ZynqError;
use bitflags::bitflags;
use log::LevelFilter;
use std::fmt;
use std::mem::{offset_of, size_of};

/// Size of a mapped window and of one register block.
pub const PAGE_SIZE: usize = 4096;
/// Bits of a physical address that fall inside a page.
pub const PAGE_MASK: u64 = (PAGE_SIZE as u64) - 1;

/// Number of channels in each GPIO core.
pub const MAX_CHANS: usize = 2;

/// Lower half of a 32 bit data word.
pub const LOWER_WORD: u32 = 0x0000_FFFF;
/// Upper half of a 32 bit data word.
pub const UPPER_WORD: u32 = 0xFFFF_0000;

/// Direction value that makes every pin of a channel an output.
pub const ALL_OUTPUTS: u32 = 0xFFFF_FFFF;

/// One data/direction lane of a GPIO core.
///
/// `direction` bit *i* set means pin *i* drives an output.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    pub data: u32,
    pub direction: u32,
}

/// Layout of a whole GPIO core page.
#[repr(C)]
pub struct RegisterBlock {
    pub channels: [Channel; MAX_CHANS],
    _reserved: [u32; (PAGE_SIZE - MAX_CHANS * size_of::<Channel>()) / size_of::<u32>()],
}

const _: () = assert!(size_of::<RegisterBlock>() == PAGE_SIZE);

/// Which word of a channel an access targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Data,
    Direction,
}

/// Byte offset of `field` of channel `index` from the start of a register block.
pub const fn field_offset(index: usize, field: Field) -> usize {
    let within = match field {
        Field::Data => offset_of!(Channel, data),
        Field::Direction => offset_of!(Channel, direction),
    };
    offset_of!(RegisterBlock, channels) + index * size_of::<Channel>() + within
}

/// The three register blocks of the design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockSelector {
    /// FPGA identification (channel 1) and revision (channel 2).
    IdRev = 0,
    /// Control register. Channel 1 carries the software clock in test mode.
    Cr = 1,
    /// Data register.
    Dr = 2,
}

impl BlockSelector {
    pub const ALL: [BlockSelector; 3] =
        [BlockSelector::IdRev, BlockSelector::Cr, BlockSelector::Dr];

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u32> for BlockSelector {
    type Error = ZynqError;

    fn try_from(offset: u32) -> Result<Self, Self::Error> {
        match offset {
            0 => Ok(BlockSelector::IdRev),
            1 => Ok(BlockSelector::Cr),
            2 => Ok(BlockSelector::Dr),
            _ => Err(ZynqError::InvalidOffset(offset)),
        }
    }
}

impl From<BlockSelector> for u32 {
    fn from(selector: BlockSelector) -> Self {
        selector as u32
    }
}

impl fmt::Display for BlockSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockSelector::IdRev => "ID_REV",
            BlockSelector::Cr => "CR",
            BlockSelector::Dr => "DR",
        };
        write!(f, "{name}")
    }
}

bitflags! {
    /// Set of channels an operation applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChannelMask: u32 {
        const CHANNEL1 = 0x1;
        const CHANNEL2 = 0x2;
    }
}

impl ChannelMask {
    /// Parse a raw channel mask, rejecting unknown bits.
    pub fn from_raw(raw: u32) -> Result<Self, ZynqError> {
        ChannelMask::from_bits(raw).ok_or_else(|| {
            ZynqError::Argument(format!("channel mask 0x{raw:X} has bits outside 0x3"))
        })
    }

    /// Channel indices selected by this mask, in ascending order.
    pub fn indices(self) -> impl Iterator<Item = usize> {
        (0..MAX_CHANS).filter(move |i| self.bits() & (1 << i) != 0)
    }

    pub(crate) fn require_non_empty(self) -> Result<Self, ZynqError> {
        if self.is_empty() {
            Err(ZynqError::Argument("channel mask selects no channel".into()))
        } else {
            Ok(self)
        }
    }
}

/// Operating mode chosen at init.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OpMode {
    /// Writes land in the registers and nothing else happens.
    #[default]
    Normal = 0,
    /// Every data write is followed by a clock pulse on CR channel 1.
    Test = 1,
}

impl OpMode {
    pub const fn raw(self) -> u32 {
        self as u32
    }
}

bitflags! {
    /// What `init` should do.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InitFlags: u32 {
        const REQUEST_PROGRAM = 0x1;
        const REQUEST_OPEN = 0x2;
    }
}

bitflags! {
    /// Diagnostic verbosity, as a bitmask of message classes.
    ///
    /// `log` filters by a single maximum level, so the bits are not independent:
    /// the highest one set wins and every less verbose class comes with it.
    /// `DIAG` alone therefore also emits debug and error messages.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct DebugLevel: u32 {
        const ERROR = 0x1;
        const DEBUG = 0x2;
        const DIAG = 0x4;
    }
}

impl DebugLevel {
    /// The `log` filter for the most verbose class set in this mask.
    pub fn level_filter(self) -> LevelFilter {
        if self.contains(DebugLevel::DIAG) {
            LevelFilter::Trace
        } else if self.contains(DebugLevel::DEBUG) {
            LevelFilter::Debug
        } else if self.contains(DebugLevel::ERROR) {
            LevelFilter::Error
        } else {
            LevelFilter::Off
        }
    }
}
