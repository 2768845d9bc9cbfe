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

//! Physical memory capability.
//!
//! The mapper never touches raw addresses itself. It asks a [`PhysicalMemory`]
//! implementation for page-sized [`RegisterWindow`]s and performs every register
//! access through `read_field`/`write_field` at byte offsets into those windows.
//!
//! Two implementations are provided:
//! - [`devmem::DevMem`] maps `/dev/mem` with `mmap(2)` and performs volatile accesses
//!   on real hardware
//! - [`simulated::SimulatedMemory`] keeps the pages in process memory and journals
//!   every access, for running without a board and for tests

pub mod devmem;
pub mod simulated;

use crate::error::ZynqError;

/// A mapped, page-sized window of physical memory.
pub trait RegisterWindow {
    /// Load the 32 bit word at byte `offset` into the window.
    ///
    /// # Returns: `Result<u32, ZynqError>`
    /// * `Ok(u32)` - The word currently held by the register
    /// * `Err(ZynqError::Internal)` - `offset` is misaligned or outside the window
    fn read_field(&self, offset: usize) -> Result<u32, ZynqError>;

    /// Store `value` into the 32 bit word at byte `offset` into the window.
    ///
    /// # Returns: `Result<(), ZynqError>`
    /// * `Ok(())` - The store was issued
    /// * `Err(ZynqError::Internal)` - `offset` is misaligned or outside the window
    fn write_field(&mut self, offset: usize, value: u32) -> Result<(), ZynqError>;

    /// Release the window.
    ///
    /// # Returns: `Result<(), ZynqError>`
    /// * `Ok(())` - The window is unmapped
    /// * `Err(ZynqError::UnmapFailure)` - The platform refused to unmap it
    fn unmap(self: Box<Self>) -> Result<(), ZynqError>;
}

/// A byte-addressable device representing physical memory.
pub trait PhysicalMemory {
    /// Open the device. Must be called before [`PhysicalMemory::map_page`].
    ///
    /// # Returns: `Result<(), ZynqError>`
    /// * `Ok(())` - The device is open
    /// * `Err(ZynqError::MapFailure)` - The device could not be opened
    fn open(&mut self) -> Result<(), ZynqError>;

    /// Map one read/write, shared page starting at the page-aligned physical
    /// address `page_base`.
    ///
    /// # Returns: `Result<Box<dyn RegisterWindow>, ZynqError>`
    /// * `Ok(Box<dyn RegisterWindow>)` - The live window
    /// * `Err(ZynqError::MapFailure)` - The device is not open or the mapping failed
    fn map_page(&mut self, page_base: u64) -> Result<Box<dyn RegisterWindow>, ZynqError>;

    /// Release the device handle. Windows already handed out stay valid until
    /// they are unmapped.
    fn close(&mut self) -> Result<(), ZynqError>;
}

/// Check that a 32 bit access at `offset` stays inside a window of `len` bytes.
pub(crate) fn check_access(offset: usize, len: usize) -> Result<(), ZynqError> {
    if offset % 4 != 0 || offset + 4 > len {
        return Err(ZynqError::Internal(format!(
            "Register access at offset {offset:#x} is outside the {len:#x} byte window"
        )));
    }
    Ok(())
}
