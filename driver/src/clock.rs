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

//! Software clock.
//!
//! In test mode the fabric latches register values on an edge of CR channel 1,
//! which the driver toggles by hand after each write.

use crate::error::ZynqError;
use crate::mapper::AddressSpace;
use crate::registers::{BlockSelector, ChannelMask};
use log::{debug, error};

/// Block carrying the software clock.
pub const CLOCK_BLOCK: BlockSelector = BlockSelector::Cr;
/// Channel of [`CLOCK_BLOCK`] whose data word is the clock line.
pub const CLOCK_CHANNEL: ChannelMask = ChannelMask::CHANNEL1;

/// Drive one 1 -> 0 pulse on the clock line.
///
/// Each level is followed by a read back of both CR channels so the store has
/// reached the fabric before the next one is issued.
///
/// # Returns: `Result<(), ZynqError>`
/// * `Ok(())` - The pulse completed
/// * `Err(ZynqError)` - The first of the four steps that failed
pub fn pulse(space: &mut AddressSpace) -> Result<(), ZynqError> {
    debug!("Pulsing the software clock");
    for level in [1, 0] {
        space
            .write_data(CLOCK_BLOCK, &[level], CLOCK_CHANNEL)
            .inspect_err(|e| error!("clock: Error driving clock to {level}: {e}"))?;
        space
            .read_data(CLOCK_BLOCK, ChannelMask::all())
            .inspect_err(|e| error!("clock: Error reading back clock: {e}"))?;
    }
    Ok(())
}
