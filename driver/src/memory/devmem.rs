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

//! `/dev/mem` backed register windows.
//!
//! This is the only place in the crate that deals in raw pointers. Each window is
//! a single `PAGE_SIZE` shared mapping; stores and loads are volatile so the
//! compiler neither elides nor reorders them.

use crate::error::ZynqError;
use crate::memory::{PhysicalMemory, RegisterWindow, check_access};
use crate::registers::PAGE_SIZE;
use log::{debug, error, trace};
use rustix::fd::OwnedFd;
use rustix::fs::{Mode, OFlags};
use rustix::mm::{MapFlags, ProtFlags, mmap, munmap};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

/// The physical memory character device.
#[derive(Debug)]
pub struct DevMem {
    path: PathBuf,
    fd: Option<OwnedFd>,
}

impl DevMem {
    pub fn new(path: &Path) -> DevMem {
        DevMem {
            path: path.to_owned(),
            fd: None,
        }
    }
}

impl PhysicalMemory for DevMem {
    fn open(&mut self) -> Result<(), ZynqError> {
        if self.fd.is_some() {
            return Err(ZynqError::AlreadyOpen);
        }
        let fd = rustix::fs::open(
            self.path.as_path(),
            OFlags::RDWR | OFlags::SYNC | OFlags::CLOEXEC,
            Mode::empty(),
        )
        .map_err(|e| ZynqError::MapFailure(format!("Can't open {:?}: {e}", self.path)))?;
        debug!("{:?} opened", self.path);
        self.fd = Some(fd);
        Ok(())
    }

    fn map_page(&mut self, page_base: u64) -> Result<Box<dyn RegisterWindow>, ZynqError> {
        let Some(fd) = self.fd.as_ref() else {
            return Err(ZynqError::MapFailure(format!(
                "{:?} must be opened before mapping {page_base:#x}",
                self.path
            )));
        };

        // SAFETY: a fresh mapping at a kernel chosen address cannot alias any Rust
        // object. The length is one page and the offset is page aligned by the caller.
        let addr = unsafe {
            mmap(
                std::ptr::null_mut(),
                PAGE_SIZE,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                fd,
                page_base,
            )
        }
        .map_err(|e| {
            ZynqError::MapFailure(format!("Can't map {page_base:#x} to user space: {e}"))
        })?;

        let ptr = NonNull::new(addr.cast::<u8>()).ok_or_else(|| {
            ZynqError::MapFailure(format!("mmap of {page_base:#x} returned a null pointer"))
        })?;
        debug!("Memory at {page_base:#x} mapped at address {ptr:p}");
        Ok(Box::new(DevMemWindow {
            ptr: Some(ptr),
            page_base,
        }))
    }

    fn close(&mut self) -> Result<(), ZynqError> {
        match self.fd.take() {
            Some(fd) => {
                drop(fd);
                debug!("{:?} closed", self.path);
                Ok(())
            }
            None => Err(ZynqError::NotOpen(format!("{:?} is not open", self.path))),
        }
    }
}

/// One mapped page of `/dev/mem`.
#[derive(Debug)]
pub struct DevMemWindow {
    ptr: Option<NonNull<u8>>,
    page_base: u64,
}

impl DevMemWindow {
    fn base(&self) -> Result<NonNull<u8>, ZynqError> {
        self.ptr.ok_or_else(|| {
            ZynqError::Internal(format!("Window for {:#x} is already unmapped", self.page_base))
        })
    }
}

impl RegisterWindow for DevMemWindow {
    fn read_field(&self, offset: usize) -> Result<u32, ZynqError> {
        check_access(offset, PAGE_SIZE)?;
        let base = self.base()?;
        // SAFETY: the window is a live PAGE_SIZE mapping and check_access keeps the
        // 4 byte access aligned and in bounds.
        #[allow(clippy::cast_ptr_alignment)]
        let value = unsafe { base.as_ptr().add(offset).cast::<u32>().read_volatile() };
        trace!("Read {value:#010x} @ {:#x}", self.page_base + offset as u64);
        Ok(value)
    }

    fn write_field(&mut self, offset: usize, value: u32) -> Result<(), ZynqError> {
        check_access(offset, PAGE_SIZE)?;
        let base = self.base()?;
        trace!("Write {value:#010x} @ {:#x}", self.page_base + offset as u64);
        // SAFETY: as for read_field.
        #[allow(clippy::cast_ptr_alignment)]
        unsafe {
            base.as_ptr().add(offset).cast::<u32>().write_volatile(value);
        }
        Ok(())
    }

    fn unmap(mut self: Box<Self>) -> Result<(), ZynqError> {
        let Some(ptr) = self.ptr.take() else {
            return Ok(());
        };
        // SAFETY: ptr came from a PAGE_SIZE mmap and is no longer reachable.
        unsafe { munmap(ptr.as_ptr().cast(), PAGE_SIZE) }.map_err(|e| {
            ZynqError::UnmapFailure(format!(
                "Can't unmap {:#x} from user space: {e}",
                self.page_base
            ))
        })
    }
}

impl Drop for DevMemWindow {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: as for unmap.
            if let Err(e) = unsafe { munmap(ptr.as_ptr().cast(), PAGE_SIZE) } {
                error!("munmap of {:#x} failed during drop: {e}", self.page_base);
            }
        }
    }
}
