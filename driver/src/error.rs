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

use std::convert::Infallible;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ZynqError {
    #[error("ZynqError::InvalidOffset: register block offset {0} is out of range")]
    InvalidOffset(u32),
    #[error("ZynqError::NotOpen: {0}")]
    NotOpen(String),
    #[error("ZynqError::AlreadyOpen: the physical memory device is already open")]
    AlreadyOpen,
    #[error("ZynqError::MapFailure: {0}")]
    MapFailure(String),
    #[error("ZynqError::UnmapFailure: {0}")]
    UnmapFailure(String),
    #[error("ZynqError::ConfigurationFailed: {0}")]
    ConfigurationFailed(String),
    #[error("ZynqError::NotReady: {0}")]
    NotReady(String),
    #[error("ZynqError::NullData: {0}")]
    NullData(String),
    #[error("ZynqError::Argument: {0}")]
    Argument(String),
    #[error("ZynqError::IORead: An IO error occurred when reading from {file:?}: {e}")]
    IORead { file: PathBuf, e: std::io::Error },
    #[error("ZynqError::IOWrite: An IO error occurred when writing to {file:?}: {e}")]
    IOWrite { file: PathBuf, e: std::io::Error },
    #[error("ZynqError::TomlDe: Failed to parse config {toml_string:?}: {e}")]
    TomlDe {
        toml_string: String,
        e: toml::de::Error,
    },
    #[error("ZynqError::Internal: An Internal error occurred: {0}")]
    Internal(String),
}

/// Lets register operations accept an already validated
/// [`BlockSelector`](crate::registers::BlockSelector) through the same `TryInto`
/// bound as a raw offset.
impl From<Infallible> for ZynqError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
