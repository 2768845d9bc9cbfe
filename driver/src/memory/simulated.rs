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

//! In-process stand-in for `/dev/mem`.
//!
//! [`SimulatedMemory`] hands out windows over pages kept in a shared backing store,
//! so the whole driver can be exercised on a machine without the programmable
//! logic. Every register access is appended to a journal, and the open, map and
//! unmap steps can be made to fail on demand.
//!
//! Cloning a `SimulatedMemory` yields another handle to the same backing store,
//! which lets a caller keep inspecting the registers after moving one handle into
//! a [`Driver`](crate::driver::Driver).
//!
//! ```rust
//! # use zynq_pl::memory::simulated::SimulatedMemory;
//! let memory = SimulatedMemory::new();
//! memory.poke(0x4120_0000, 0x0000_CAFE);
//! assert_eq!(memory.peek(0x4120_0000), 0x0000_CAFE);
//! ```

use crate::error::ZynqError;
use crate::memory::{PhysicalMemory, RegisterWindow, check_access};
use crate::registers::{PAGE_MASK, PAGE_SIZE};
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

const WORDS_PER_PAGE: usize = PAGE_SIZE / 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

/// One journaled register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    /// Physical address of the accessed word.
    pub address: u64,
    pub kind: AccessKind,
    /// Value loaded or stored.
    pub value: u32,
}

#[derive(Debug, Default)]
struct SimState {
    pages: HashMap<u64, Vec<u32>>,
    journal: Vec<Access>,
    device_open: bool,
    live_windows: usize,
    map_calls: usize,
    fail_open: bool,
    fail_map_call: Option<usize>,
    fail_unmap_of: Option<u64>,
    fail_write_to: Option<u64>,
}

impl SimState {
    fn page_mut(&mut self, page_base: u64) -> &mut Vec<u32> {
        self.pages
            .entry(page_base)
            .or_insert_with(|| vec![0; WORDS_PER_PAGE])
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedMemory {
    state: Rc<RefCell<SimState>>,
}

impl SimulatedMemory {
    pub fn new() -> SimulatedMemory {
        SimulatedMemory::default()
    }

    /// Make the next [`PhysicalMemory::open`] fail.
    pub fn fail_open(&self) {
        self.state.borrow_mut().fail_open = true;
    }

    /// Make the `call`th (zero based, counted over the lifetime of the store)
    /// [`PhysicalMemory::map_page`] fail.
    pub fn fail_map_call(&self, call: usize) {
        self.state.borrow_mut().fail_map_call = Some(call);
    }

    /// Make unmapping the window at `page_base` fail.
    pub fn fail_unmap_of(&self, page_base: u64) {
        self.state.borrow_mut().fail_unmap_of = Some(page_base);
    }

    /// Make every write to physical `address` fail without storing anything.
    pub fn fail_write_to(&self, address: u64) {
        self.state.borrow_mut().fail_write_to = Some(address);
    }

    /// Store `value` at physical `address` without journaling it, as the fabric would.
    pub fn poke(&self, address: u64, value: u32) {
        let mut state = self.state.borrow_mut();
        let word = (address & PAGE_MASK) as usize / 4;
        state.page_mut(address & !PAGE_MASK)[word] = value;
    }

    /// Load the word at physical `address` without journaling it.
    pub fn peek(&self, address: u64) -> u32 {
        let state = self.state.borrow();
        let word = (address & PAGE_MASK) as usize / 4;
        state
            .pages
            .get(&(address & !PAGE_MASK))
            .map_or(0, |page| page[word])
    }

    /// Every access issued through a window since the last [`SimulatedMemory::clear_journal`].
    pub fn journal(&self) -> Vec<Access> {
        self.state.borrow().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.state.borrow_mut().journal.clear();
    }

    /// Values stored at `address`, oldest first.
    pub fn writes_to(&self, address: u64) -> Vec<u32> {
        self.state
            .borrow()
            .journal
            .iter()
            .filter(|a| a.kind == AccessKind::Write && a.address == address)
            .map(|a| a.value)
            .collect()
    }

    pub fn is_device_open(&self) -> bool {
        self.state.borrow().device_open
    }

    /// Number of windows mapped and not yet unmapped or dropped.
    pub fn live_windows(&self) -> usize {
        self.state.borrow().live_windows
    }
}

impl PhysicalMemory for SimulatedMemory {
    fn open(&mut self) -> Result<(), ZynqError> {
        let mut state = self.state.borrow_mut();
        if state.device_open {
            return Err(ZynqError::AlreadyOpen);
        }
        if std::mem::take(&mut state.fail_open) {
            return Err(ZynqError::MapFailure(
                "Can't open simulated memory device".into(),
            ));
        }
        state.device_open = true;
        trace!("Simulated memory device opened");
        Ok(())
    }

    fn map_page(&mut self, page_base: u64) -> Result<Box<dyn RegisterWindow>, ZynqError> {
        let mut state = self.state.borrow_mut();
        if !state.device_open {
            return Err(ZynqError::MapFailure(format!(
                "Simulated memory device must be opened before mapping {page_base:#x}"
            )));
        }
        let call = state.map_calls;
        state.map_calls += 1;
        if state.fail_map_call == Some(call) {
            return Err(ZynqError::MapFailure(format!(
                "Can't map {page_base:#x} to user space"
            )));
        }
        state.page_mut(page_base);
        state.live_windows += 1;
        trace!("Simulated page {page_base:#x} mapped");
        Ok(Box::new(SimulatedWindow {
            state: Rc::clone(&self.state),
            page_base,
            mapped: true,
        }))
    }

    fn close(&mut self) -> Result<(), ZynqError> {
        let mut state = self.state.borrow_mut();
        if !state.device_open {
            return Err(ZynqError::NotOpen(
                "Simulated memory device is not open".into(),
            ));
        }
        state.device_open = false;
        trace!("Simulated memory device closed");
        Ok(())
    }
}

#[derive(Debug)]
struct SimulatedWindow {
    state: Rc<RefCell<SimState>>,
    page_base: u64,
    mapped: bool,
}

impl RegisterWindow for SimulatedWindow {
    fn read_field(&self, offset: usize) -> Result<u32, ZynqError> {
        check_access(offset, PAGE_SIZE)?;
        let mut state = self.state.borrow_mut();
        let value = state.page_mut(self.page_base)[offset / 4];
        state.journal.push(Access {
            address: self.page_base + offset as u64,
            kind: AccessKind::Read,
            value,
        });
        Ok(value)
    }

    fn write_field(&mut self, offset: usize, value: u32) -> Result<(), ZynqError> {
        check_access(offset, PAGE_SIZE)?;
        let address = self.page_base + offset as u64;
        let mut state = self.state.borrow_mut();
        if state.fail_write_to == Some(address) {
            return Err(ZynqError::Internal(format!(
                "Simulated bus error writing {address:#x}"
            )));
        }
        state.page_mut(self.page_base)[offset / 4] = value;
        state.journal.push(Access {
            address,
            kind: AccessKind::Write,
            value,
        });
        Ok(())
    }

    fn unmap(mut self: Box<Self>) -> Result<(), ZynqError> {
        if self.state.borrow().fail_unmap_of == Some(self.page_base) {
            return Err(ZynqError::UnmapFailure(format!(
                "Can't unmap {:#x} from user space",
                self.page_base
            )));
        }
        self.mapped = false;
        self.state.borrow_mut().live_windows -= 1;
        Ok(())
    }
}

impl Drop for SimulatedWindow {
    fn drop(&mut self) {
        if self.mapped {
            self.state.borrow_mut().live_windows -= 1;
        }
    }
}
