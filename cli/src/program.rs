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

//! Program command: load a bitstream without mapping the register blocks.

use log::debug;
use std::path::Path;
use zynq_pl::{Driver, ZynqError};

/// Load `bitstream`, or the configured default, then confirm the fabric reports
/// configured.
///
/// # Returns: `Result<String, ZynqError>`
/// * `Ok(String)` - Confirmation message
/// * `Err(ZynqError::ConfigurationFailed)` - The bitstream could not be delivered
/// * `Err(ZynqError::NotReady)` - The fabric did not report configured afterwards
pub fn program_handler(driver: &mut Driver, bitstream: Option<&Path>) -> Result<String, ZynqError> {
    debug!("Programming the PL with {bitstream:?}");
    driver.program(bitstream)?;
    driver.check_ready()?;
    Ok(match bitstream {
        Some(path) => format!("PL programmed with {}", path.display()),
        None => "PL programmed with the default bitstream".to_string(),
    })
}
