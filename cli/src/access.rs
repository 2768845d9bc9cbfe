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

//! Read, write and direction commands.
//!
//! Each handler runs inside an initialised session and returns the line printed
//! on success. Only the channels selected by the mask are reported.

use clap::ValueEnum;
use std::fmt;
use zynq_pl::{BlockSelector, ChannelMask, Driver, ZynqError};

/// Register block named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    IdRev,
    Cr,
    Dr,
}

impl From<Target> for BlockSelector {
    fn from(target: Target) -> Self {
        match target {
            Target::IdRev => BlockSelector::IdRev,
            Target::Cr => BlockSelector::Cr,
            Target::Dr => BlockSelector::Dr,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BlockSelector::from(*self))
    }
}

/// Which part of each data word a read or write covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Half {
    Full,
    Lower,
    Upper,
}

/// Format the masked channel values as `CH1=0x... CH2=0x...`.
pub fn format_channels(values: &[u32], mask: ChannelMask) -> String {
    mask.indices()
        .filter_map(|i| values.get(i).map(|v| format!("CH{}=0x{v:08x}", i + 1)))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn read_handler(
    driver: &Driver,
    target: Target,
    mask: ChannelMask,
    half: Half,
) -> Result<String, ZynqError> {
    let selector = BlockSelector::from(target);
    let values = match half {
        Half::Full => driver.read(selector, mask)?,
        Half::Lower => driver.read_lower_word(selector, mask)?,
        Half::Upper => driver.read_upper_word(selector, mask)?,
    };
    Ok(format!("{target}: {}", format_channels(&values, mask)))
}

pub fn write_handler(
    driver: &mut Driver,
    target: Target,
    values: &[u32],
    mask: ChannelMask,
    half: Half,
) -> Result<String, ZynqError> {
    let selector = BlockSelector::from(target);
    match half {
        Half::Full => driver.write(selector, values, mask)?,
        Half::Lower => driver.write_lower_word(selector, values, mask)?,
        Half::Upper => driver.write_upper_word(selector, values, mask)?,
    }
    Ok(format!("{target}: wrote {}", format_channels(values, mask)))
}

pub fn get_direction_handler(
    driver: &Driver,
    target: Target,
    mask: ChannelMask,
) -> Result<String, ZynqError> {
    let values = driver.get_direction(BlockSelector::from(target), mask)?;
    Ok(format!("{target} direction: {}", format_channels(&values, mask)))
}

pub fn set_direction_handler(
    driver: &mut Driver,
    target: Target,
    values: &[u32],
    mask: ChannelMask,
) -> Result<String, ZynqError> {
    driver.set_direction(BlockSelector::from(target), values, mask)?;
    Ok(format!(
        "{target} direction: set {}",
        format_channels(values, mask)
    ))
}
