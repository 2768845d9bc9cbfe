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

//! Error Wrapping File System I/O Helpers
//!
//! Thin wrappers around the standard file operations the driver needs: reading a
//! config file, sampling the one-character configuration status file and pushing
//! raw bitstream bytes into a device node. Every helper logs at trace level and
//! converts failures into [`ZynqError::IORead`] or [`ZynqError::IOWrite`] with the
//! offending path attached.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use zynq_pl::system_io::{fs_read, fs_read_byte};
//! # use std::path::Path;
//! # fn example() -> Result<(), zynq_pl::error::ZynqError> {
//! let config = fs_read(Path::new("/etc/zynq-pl/config.toml"))?;
//! let done = fs_read_byte(Path::new("/sys/dev/char/249:0/device/prog_done"))?;
//! # Ok(())
//! # }
//! ```

use crate::error::ZynqError;
use log::trace;
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::Path;

/// Read the contents of a file to a String.
///
/// # Arguments
///
/// * `file_path` - Path to the file to read
///
/// # Returns: `Result<String, ZynqError>`
/// * `Ok(String)` - The complete contents of the file
/// * `Err(ZynqError::IORead)` - If the file cannot be read (doesn't exist, permissions, etc.)
pub fn fs_read(file_path: &Path) -> Result<String, ZynqError> {
    trace!("Attempting to read from {file_path:?}");
    let mut buf: String = String::new();
    let result = OpenOptions::new()
        .read(true)
        .open(file_path)
        .and_then(|mut f| f.read_to_string(&mut buf));

    match result {
        Ok(_) => {
            trace!("Reading done");
            Ok(buf)
        }
        Err(e) => Err(ZynqError::IORead {
            file: file_path.into(),
            e,
        }),
    }
}

/// Read the raw contents of a file.
///
/// # Returns: `Result<Vec<u8>, ZynqError>`
/// * `Ok(Vec<u8>)` - Every byte of the file
/// * `Err(ZynqError::IORead)` - If the file cannot be opened or read
pub fn fs_read_bytes(file_path: &Path) -> Result<Vec<u8>, ZynqError> {
    trace!("Attempting to read bytes from {file_path:?}");
    std::fs::read(file_path).map_err(|e| ZynqError::IORead {
        file: file_path.into(),
        e,
    })
}

/// Read at most one byte from the start of a file.
///
/// Used for sysfs flags such as `prog_done`, where only the first character is
/// meaningful. The file handle is dropped, and so closed, before this returns
/// whatever the outcome.
///
/// # Returns: `Result<Option<u8>, ZynqError>`
/// * `Ok(Some(u8))` - The first byte of the file
/// * `Ok(None)` - The file was empty
/// * `Err(ZynqError::IORead)` - If the file cannot be opened or read
pub fn fs_read_byte(file_path: &Path) -> Result<Option<u8>, ZynqError> {
    trace!("Attempting to read one byte from {file_path:?}");
    let mut buf = [0u8; 1];
    let result = OpenOptions::new()
        .read(true)
        .open(file_path)
        .and_then(|mut f| f.read(&mut buf));

    match result {
        Ok(0) => {
            trace!("{file_path:?} was empty");
            Ok(None)
        }
        Ok(_) => {
            trace!("Read {:?} from {file_path:?}", buf[0] as char);
            Ok(Some(buf[0]))
        }
        Err(e) => Err(ZynqError::IORead {
            file: file_path.into(),
            e,
        }),
    }
}

/// Write binary data to a file.
///
/// # Arguments
///
/// * `file_path` - Path to the file to write
/// * `create` - If `true`, create the file if it doesn't exist; if `false`, file must already exist
/// * `data` - The binary data to write as a byte slice
///
/// # Returns: `Result<(), ZynqError>`
/// * `Ok(())` - Write succeeded
/// * `Err(ZynqError::IOWrite)` - If the write fails
pub fn fs_write_bytes(file_path: &Path, create: bool, data: &[u8]) -> Result<(), ZynqError> {
    trace!("Attempting to write {} bytes to {file_path:?}", data.len());
    let result = OpenOptions::new()
        .create(create)
        .write(true)
        .truncate(create)
        .open(file_path)
        .and_then(|mut f| f.write_all(data));

    match result {
        Ok(_) => {
            trace!("Write done.");
            Ok(())
        }
        Err(e) => Err(ZynqError::IOWrite {
            file: file_path.into(),
            e,
        }),
    }
}
