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

//! Status command: report which design is loaded.

use zynq_pl::{Driver, ZynqError};

/// Read the ID_REV block and return it as an ascii table.
pub fn status_handler(driver: &Driver) -> Result<String, ZynqError> {
    let (id, rev) = driver.identity()?;
    Ok(format!(
        "---- FPGA ----\n\
        | id | revision | mode |\n\
        | 0x{id:08x} | 0x{rev:08x} | {:?} |",
        driver.op_mode()
    ))
}
