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

//! Masked channel read/write primitives.
//!
//! Every operation takes a block selector, a [`ChannelMask`] and, for writes, one
//! value per channel indexed by channel number (`values[0]` for channel 1,
//! `values[1]` for channel 2). Checks run in this order and fail before any
//! register is touched:
//!
//! 1. the selector must name one of the three blocks (`InvalidOffset`)
//! 2. the blocks must be mapped (`NotOpen`)
//! 3. the mask must select at least one channel (`Argument`)
//! 4. `values` must hold an entry for every selected channel (`NullData`)
//!
//! Reads return both channel slots; slots outside the mask are zero and carry no
//! meaning.

use crate::error::ZynqError;
use crate::mapper::AddressSpace;
use crate::registers::{BlockSelector, ChannelMask, Field, LOWER_WORD, MAX_CHANS, UPPER_WORD};
use log::debug;

/// Resolve anything that names a register block into a [`BlockSelector`].
pub(crate) fn resolve<S>(selector: S) -> Result<BlockSelector, ZynqError>
where
    S: TryInto<BlockSelector>,
    ZynqError: From<S::Error>,
{
    selector.try_into().map_err(ZynqError::from)
}

fn check_values(values: &[u32], mask: ChannelMask) -> Result<(), ZynqError> {
    match mask.indices().find(|&i| i >= values.len()) {
        Some(i) => Err(ZynqError::NullData(format!(
            "No value supplied for channel {}",
            i + 1
        ))),
        None => Ok(()),
    }
}

impl AddressSpace {
    fn write_masked(
        &mut self,
        selector: BlockSelector,
        field: Field,
        values: &[u32],
        mask: ChannelMask,
    ) -> Result<(), ZynqError> {
        let block = self.block_mut(selector)?;
        mask.require_non_empty()?;
        check_values(values, mask)?;
        for i in mask.indices() {
            debug!(
                "{selector}: Writing channel {}, {field:?}=0x{:08x}",
                i + 1,
                values[i]
            );
            block.write(i, field, values[i])?;
        }
        Ok(())
    }

    fn read_masked(
        &self,
        selector: BlockSelector,
        field: Field,
        mask: ChannelMask,
    ) -> Result<[u32; MAX_CHANS], ZynqError> {
        let block = self.block(selector)?;
        mask.require_non_empty()?;
        let mut values = [0; MAX_CHANS];
        for i in mask.indices() {
            values[i] = block.read(i, field)?;
            debug!(
                "{selector}: Reading channel {}, {field:?}=0x{:08x}",
                i + 1,
                values[i]
            );
        }
        Ok(values)
    }

    /// Replace the bits of the masked channels' data words selected by `change`
    /// with the same bits of `values`, keeping the rest of each word.
    ///
    /// Both masked channels are read in full and written back in full even though
    /// only half of each word changes. The sequence is not atomic with respect to
    /// the fabric.
    fn merge_masked(
        &mut self,
        selector: BlockSelector,
        values: &[u32],
        mask: ChannelMask,
        change: u32,
    ) -> Result<(), ZynqError> {
        self.block(selector)?;
        mask.require_non_empty()?;
        check_values(values, mask)?;
        let mut merged = self.read_masked(selector, Field::Data, mask)?;
        for i in mask.indices() {
            merged[i] = (merged[i] & !change) | (values[i] & change);
        }
        self.write_masked(selector, Field::Data, &merged, mask)
    }

    /// Store `values[i]` into the data word of every channel `i` in `mask`.
    pub fn write_data<S>(
        &mut self,
        selector: S,
        values: &[u32],
        mask: ChannelMask,
    ) -> Result<(), ZynqError>
    where
        S: TryInto<BlockSelector>,
        ZynqError: From<S::Error>,
    {
        let selector = resolve(selector)?;
        self.write_masked(selector, Field::Data, values, mask)
    }

    /// Load the data word of every channel in `mask`.
    pub fn read_data<S>(
        &self,
        selector: S,
        mask: ChannelMask,
    ) -> Result<[u32; MAX_CHANS], ZynqError>
    where
        S: TryInto<BlockSelector>,
        ZynqError: From<S::Error>,
    {
        let selector = resolve(selector)?;
        self.read_masked(selector, Field::Data, mask)
    }

    /// Store `values[i]` into the direction word of every channel `i` in `mask`.
    pub fn write_direction<S>(
        &mut self,
        selector: S,
        values: &[u32],
        mask: ChannelMask,
    ) -> Result<(), ZynqError>
    where
        S: TryInto<BlockSelector>,
        ZynqError: From<S::Error>,
    {
        let selector = resolve(selector)?;
        self.write_masked(selector, Field::Direction, values, mask)
    }

    /// Load the direction word of every channel in `mask`.
    pub fn read_direction<S>(
        &self,
        selector: S,
        mask: ChannelMask,
    ) -> Result<[u32; MAX_CHANS], ZynqError>
    where
        S: TryInto<BlockSelector>,
        ZynqError: From<S::Error>,
    {
        let selector = resolve(selector)?;
        self.read_masked(selector, Field::Direction, mask)
    }

    /// Replace the low 16 bits of the masked data words, keeping the high 16 bits.
    pub fn write_lower_word<S>(
        &mut self,
        selector: S,
        values: &[u32],
        mask: ChannelMask,
    ) -> Result<(), ZynqError>
    where
        S: TryInto<BlockSelector>,
        ZynqError: From<S::Error>,
    {
        let selector = resolve(selector)?;
        self.merge_masked(selector, values, mask, LOWER_WORD)
    }

    /// Replace the high 16 bits of the masked data words, keeping the low 16 bits.
    pub fn write_upper_word<S>(
        &mut self,
        selector: S,
        values: &[u32],
        mask: ChannelMask,
    ) -> Result<(), ZynqError>
    where
        S: TryInto<BlockSelector>,
        ZynqError: From<S::Error>,
    {
        let selector = resolve(selector)?;
        self.merge_masked(selector, values, mask, UPPER_WORD)
    }

    /// Load the masked data words with the high 16 bits cleared.
    pub fn read_lower_word<S>(
        &self,
        selector: S,
        mask: ChannelMask,
    ) -> Result<[u32; MAX_CHANS], ZynqError>
    where
        S: TryInto<BlockSelector>,
        ZynqError: From<S::Error>,
    {
        Ok(self.read_data(selector, mask)?.map(|v| v & LOWER_WORD))
    }

    /// Load the masked data words with the low 16 bits cleared.
    pub fn read_upper_word<S>(
        &self,
        selector: S,
        mask: ChannelMask,
    ) -> Result<[u32; MAX_CHANS], ZynqError>
    where
        S: TryInto<BlockSelector>,
        ZynqError: From<S::Error>,
    {
        Ok(self.read_data(selector, mask)?.map(|v| v & UPPER_WORD))
    }

    /// Load the masked data words through the full `UPPER_WORD | LOWER_WORD` mask.
    pub fn read_full<S>(
        &self,
        selector: S,
        mask: ChannelMask,
    ) -> Result<[u32; MAX_CHANS], ZynqError>
    where
        S: TryInto<BlockSelector>,
        ZynqError: From<S::Error>,
    {
        Ok(self
            .read_data(selector, mask)?
            .map(|v| v & (UPPER_WORD | LOWER_WORD)))
    }
}
