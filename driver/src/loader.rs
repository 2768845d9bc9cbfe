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

//! Configuration loader.
//!
//! Programs the fabric by handing a bitstream file to a [`BitstreamSink`] and
//! confirms configuration by sampling the xdevcfg `prog_done` attribute.
//!
//! Two sinks are provided:
//! - [`CatSink`] runs `cat <bitstream>` with its output redirected into the
//!   configuration device, and trusts `cat`'s exit status
//! - [`DirectSink`] reads the bitstream and writes the bytes to the device itself
//!
//! # Examples
//!
//! ```rust,no_run
//! # use zynq_pl::loader::{CatSink, ConfigLoader};
//! # use std::path::Path;
//! # fn example() -> Result<(), zynq_pl::error::ZynqError> {
//! let mut loader = ConfigLoader::new(
//!     Box::new(CatSink::new(Path::new("/dev/xdevcfg"))),
//!     Path::new("/sys/dev/char/249:0/device/prog_done"),
//!     Path::new("/lib/firmware/design.bin"),
//! );
//! loader.program(None)?;
//! loader.check_ready()?;
//! # Ok(())
//! # }
//! ```

use crate::error::ZynqError;
use crate::system_io::{fs_read_byte, fs_read_bytes, fs_write_bytes};
use log::{debug, error, trace};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Something that can push a bitstream file into the configuration interface.
pub trait BitstreamSink {
    /// Deliver the bitstream at `bitstream`.
    ///
    /// # Returns: `Result<(), ZynqError>`
    /// * `Ok(())` - The whole bitstream was accepted
    /// * `Err(ZynqError::ConfigurationFailed)` - Delivery failed
    fn deliver(&mut self, bitstream: &Path) -> Result<(), ZynqError>;
}

/// Copies the bitstream into the configuration device with `cat`.
#[derive(Debug)]
pub struct CatSink {
    device: PathBuf,
}

impl CatSink {
    pub fn new(device: &Path) -> CatSink {
        CatSink {
            device: device.to_owned(),
        }
    }
}

impl BitstreamSink for CatSink {
    fn deliver(&mut self, bitstream: &Path) -> Result<(), ZynqError> {
        debug!("Executing - cat {bitstream:?} > {:?}...", self.device);
        let target = OpenOptions::new()
            .write(true)
            .open(&self.device)
            .map_err(|e| {
                ZynqError::ConfigurationFailed(format!("Can't open {:?}: {e}", self.device))
            })?;
        let output = Command::new("cat")
            .arg(bitstream)
            .stdout(target)
            .output()
            .map_err(|e| ZynqError::ConfigurationFailed(format!("Can't run cat: {e}")))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ZynqError::ConfigurationFailed(format!(
                "cat {bitstream:?} > {:?} exited with {}: {}",
                self.device,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

/// Writes the bitstream bytes into the configuration device directly.
#[derive(Debug)]
pub struct DirectSink {
    device: PathBuf,
}

impl DirectSink {
    pub fn new(device: &Path) -> DirectSink {
        DirectSink {
            device: device.to_owned(),
        }
    }
}

impl BitstreamSink for DirectSink {
    fn deliver(&mut self, bitstream: &Path) -> Result<(), ZynqError> {
        let data = fs_read_bytes(bitstream)
            .map_err(|e| ZynqError::ConfigurationFailed(e.to_string()))?;
        debug!(
            "Writing {} bytes from {bitstream:?} to {:?}",
            data.len(),
            self.device
        );
        fs_write_bytes(&self.device, false, &data)
            .map_err(|e| ZynqError::ConfigurationFailed(e.to_string()))
    }
}

/// Loads the fabric and tracks whether it is known to be configured.
pub struct ConfigLoader {
    sink: Box<dyn BitstreamSink>,
    prog_done: PathBuf,
    default_bitstream: PathBuf,
    programmed: bool,
}

impl ConfigLoader {
    pub fn new(
        sink: Box<dyn BitstreamSink>,
        prog_done: &Path,
        default_bitstream: &Path,
    ) -> ConfigLoader {
        ConfigLoader {
            sink,
            prog_done: prog_done.to_owned(),
            default_bitstream: default_bitstream.to_owned(),
            programmed: false,
        }
    }

    /// Whether the last program or readiness check succeeded.
    pub fn is_programmed(&self) -> bool {
        self.programmed
    }

    /// Program the fabric with `bitstream`, or with the default bitstream when `None`.
    ///
    /// # Returns: `Result<(), ZynqError>`
    /// * `Ok(())` - The sink accepted the bitstream
    /// * `Err(ZynqError::ConfigurationFailed)` - Delivery failed; the fabric is
    ///   no longer considered programmed
    pub fn program(&mut self, bitstream: Option<&Path>) -> Result<(), ZynqError> {
        let bitstream = match bitstream {
            Some(path) => path.to_owned(),
            None => {
                debug!("No bitstream given, using default={:?}", self.default_bitstream);
                self.default_bitstream.clone()
            }
        };
        self.programmed = false;
        self.sink.deliver(&bitstream).inspect_err(|e| {
            error!("ERROR programming the PL: {e}");
        })?;
        self.programmed = true;
        Ok(())
    }

    /// Confirm the fabric finished configuring.
    ///
    /// Reads the first byte of the status attribute, which must be `'1'`. The
    /// attribute is closed before this returns.
    ///
    /// # Returns: `Result<(), ZynqError>`
    /// * `Ok(())` - The fabric is configured
    /// * `Err(ZynqError::NotReady)` - The attribute could not be read or is not `'1'`
    pub fn check_ready(&mut self) -> Result<(), ZynqError> {
        trace!("Opening PL status {:?}...", self.prog_done);
        let outcome = match fs_read_byte(&self.prog_done) {
            Ok(Some(b'1')) => Ok(()),
            Ok(Some(other)) => Err(ZynqError::NotReady(format!(
                "PL not programmed, {:?} reads {:?}",
                self.prog_done, other as char
            ))),
            Ok(None) => Err(ZynqError::NotReady(format!(
                "PL not programmed, {:?} is empty",
                self.prog_done
            ))),
            Err(e) => Err(ZynqError::NotReady(format!(
                "Can't read PL status: {e}"
            ))),
        };
        match &outcome {
            Ok(()) => debug!("PL programmed..."),
            Err(e) => error!("{e}"),
        }
        self.programmed = outcome.is_ok();
        outcome
    }
}
