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

//! Address space mapper.
//!
//! Maps the three GPIO register blocks into the process through a
//! [`PhysicalMemory`] capability. Each physical base address is split once, at
//! open time, into the page-aligned address that is actually mapped and the
//! offset of the block inside that page:
//!
//! ```text
//! page_base   = base & !PAGE_MASK
//! page_offset = base &  PAGE_MASK
//! ```
//!
//! The pair is kept with the window so register accesses never redo the
//! arithmetic. Mapping is all-or-nothing: if any of the three windows cannot be
//! mapped, the others are released and the mapper stays closed.

use crate::config::BlockBases;
use crate::error::ZynqError;
use crate::memory::{PhysicalMemory, RegisterWindow};
use crate::registers::{
    BlockSelector, Channel, Field, MAX_CHANS, PAGE_MASK, PAGE_SIZE, field_offset,
};
use log::{debug, error, warn};

/// A physical base address split into the mapped page and the offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSplit {
    pub page_base: u64,
    pub page_offset: usize,
}

impl PageSplit {
    pub const fn of(base: u64) -> PageSplit {
        PageSplit {
            page_base: base & !PAGE_MASK,
            page_offset: (base & PAGE_MASK) as usize,
        }
    }

    /// Whether a block's registers starting here stay inside the mapped page.
    pub const fn fits_in_page(&self) -> bool {
        self.page_offset % 4 == 0 && self.page_offset + BLOCK_LEN <= PAGE_SIZE
    }
}

/// Bytes covered by one block's channel registers.
const BLOCK_LEN: usize = MAX_CHANS * std::mem::size_of::<Channel>();

/// A live mapping of one register block.
pub(crate) struct MappedBlock {
    selector: BlockSelector,
    split: PageSplit,
    window: Box<dyn RegisterWindow>,
}

impl MappedBlock {
    pub(crate) fn read(&self, index: usize, field: Field) -> Result<u32, ZynqError> {
        self.window
            .read_field(self.split.page_offset + field_offset(index, field))
    }

    pub(crate) fn write(
        &mut self,
        index: usize,
        field: Field,
        value: u32,
    ) -> Result<(), ZynqError> {
        self.window
            .write_field(self.split.page_offset + field_offset(index, field), value)
    }

    fn unmap(self) -> Result<(), ZynqError> {
        let selector = self.selector;
        self.window.unmap().map_err(|e| match e {
            ZynqError::UnmapFailure(msg) => ZynqError::UnmapFailure(format!("{selector}: {msg}")),
            other => ZynqError::UnmapFailure(format!("{selector}: {other}")),
        })
    }
}

/// The three register blocks and the device they are mapped from.
pub struct AddressSpace {
    memory: Box<dyn PhysicalMemory>,
    bases: BlockBases,
    blocks: Vec<MappedBlock>,
}

impl AddressSpace {
    pub fn new(memory: Box<dyn PhysicalMemory>, bases: BlockBases) -> AddressSpace {
        AddressSpace {
            memory,
            bases,
            blocks: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        !self.blocks.is_empty()
    }

    /// Where `selector` lives, once mapped.
    pub fn page_split(&self, selector: BlockSelector) -> Option<PageSplit> {
        self.blocks.get(selector.index()).map(|b| b.split)
    }

    /// Open the physical memory device and map all three register blocks.
    ///
    /// Every block is attempted even after one fails, matching the behaviour of
    /// mapping each GPIO core independently, but the result is all-or-nothing.
    ///
    /// # Returns: `Result<(), ZynqError>`
    /// * `Ok(())` - All three blocks are mapped
    /// * `Err(ZynqError::AlreadyOpen)` - The blocks are already mapped
    /// * `Err(ZynqError::MapFailure)` - A base does not leave room for the block
    ///   inside its page, the device could not be opened or a block could not be
    ///   mapped. Nothing stays mapped.
    pub fn open(&mut self) -> Result<(), ZynqError> {
        if self.is_open() {
            error!("Device already opened...");
            return Err(ZynqError::AlreadyOpen);
        }
        self.check_bases()?;
        self.memory.open()?;
        debug!("Physical memory device opened");

        let mut mapped = Vec::with_capacity(BlockSelector::ALL.len());
        let mut first_error = None;
        for selector in BlockSelector::ALL {
            let base = self.bases.base(selector);
            let split = PageSplit::of(base);
            match self.memory.map_page(split.page_base) {
                Ok(window) => {
                    debug!(
                        "{selector}: {base:#x} mapped as page {:#x} + {:#x}",
                        split.page_base, split.page_offset
                    );
                    mapped.push(MappedBlock {
                        selector,
                        split,
                        window,
                    });
                }
                Err(e) => {
                    error!("{selector}: Can't map {base:#x} to user space: {e}");
                    first_error.get_or_insert(match e {
                        ZynqError::MapFailure(msg) => {
                            ZynqError::MapFailure(format!("{selector}: {msg}"))
                        }
                        other => ZynqError::MapFailure(format!("{selector}: {other}")),
                    });
                }
            }
        }

        if let Some(e) = first_error {
            self.release(mapped);
            return Err(e);
        }

        self.blocks = mapped;
        self.log_identity();
        Ok(())
    }

    /// Unmap all three blocks and close the physical memory device.
    ///
    /// Unmapping stops at the first failure; the remaining windows are released
    /// when dropped and the device handle is closed regardless.
    ///
    /// # Returns: `Result<(), ZynqError>`
    /// * `Ok(())` - Everything was released
    /// * `Err(ZynqError::NotOpen)` - Nothing was mapped
    /// * `Err(ZynqError::UnmapFailure)` - A block could not be unmapped
    pub fn close(&mut self) -> Result<(), ZynqError> {
        if !self.is_open() {
            return Err(ZynqError::NotOpen("Register blocks are not mapped".into()));
        }
        let mut blocks = std::mem::take(&mut self.blocks).into_iter();
        let unmapped = blocks.try_for_each(MappedBlock::unmap);
        if let Err(e) = &unmapped {
            error!("{e}");
        }
        drop(blocks);
        let closed = self.memory.close();
        unmapped?;
        closed
    }

    /// The mapping for `selector`.
    ///
    /// # Returns: `Result<&MappedBlock, ZynqError>`
    /// * `Ok(&MappedBlock)` - The block is mapped
    /// * `Err(ZynqError::NotOpen)` - Nothing is mapped
    pub(crate) fn block(&self, selector: BlockSelector) -> Result<&MappedBlock, ZynqError> {
        self.blocks
            .get(selector.index())
            .ok_or_else(|| ZynqError::NotOpen(format!("{selector}: Device not open")))
    }

    pub(crate) fn block_mut(
        &mut self,
        selector: BlockSelector,
    ) -> Result<&mut MappedBlock, ZynqError> {
        self.blocks
            .get_mut(selector.index())
            .ok_or_else(|| ZynqError::NotOpen(format!("{selector}: Device not open")))
    }

    fn check_bases(&self) -> Result<(), ZynqError> {
        for selector in BlockSelector::ALL {
            let base = self.bases.base(selector);
            if !PageSplit::of(base).fits_in_page() {
                error!("{selector}: Base {base:#x} leaves no room for the block in its page");
                return Err(ZynqError::MapFailure(format!(
                    "{selector}: Base {base:#x} must be word aligned with {BLOCK_LEN:#x} bytes left in its page"
                )));
            }
        }
        Ok(())
    }

    fn release(&mut self, mapped: Vec<MappedBlock>) {
        for block in mapped {
            let selector = block.selector;
            if let Err(e) = block.unmap() {
                warn!("{selector}: cleanup after failed open: {e}");
            }
        }
        if let Err(e) = self.memory.close() {
            warn!("Closing physical memory after failed open: {e}");
        }
    }

    fn log_identity(&self) {
        if let Ok(id_rev) = self.block(BlockSelector::IdRev) {
            match (id_rev.read(0, Field::Data), id_rev.read(1, Field::Data)) {
                (Ok(id), Ok(rev)) => debug!("FPGAID={id:x}, REV={rev:x}"),
                (Err(e), _) | (_, Err(e)) => warn!("Could not read FPGA identity: {e}"),
            }
        }
    }
}
