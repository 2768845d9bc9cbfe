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

//! Driver configuration.
//!
//! Every path and base address the driver uses has a hardcoded default matching the
//! MicroZed reference design. The defaults can be overridden by TOML files:
//!
//! ```toml
//! [system_paths]
//! mem_device = "/dev/mem"
//! prog_done = "/sys/dev/char/249:0/device/prog_done"
//! config_device = "/dev/xdevcfg"
//! default_bitstream = "/store/mep/zynq_fpga_bin_files/ucm1_0.bin"
//!
//! [register_map]
//! id_rev_base = 0x41200000
//! cr_base = 0x41201000
//! dr_base = 0x41202000
//! ```
//!
//! User config (`/etc/zynq-pl/config.toml`) overrides vendor config
//! (`/usr/lib/zynq-pl/config.toml`), which overrides the hardcoded defaults. A
//! missing or unreadable file is logged and skipped.

use crate::error::ZynqError;
use crate::registers::BlockSelector;
use crate::system_io::fs_read;
use log::{trace, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The physical memory character device.
pub static MEM_DEVICE: &str = "/dev/mem";

/// The xdevcfg `prog_done` attribute. Reads `1` once the fabric is configured.
pub static PROG_DONE_PATH: &str = "/sys/dev/char/249:0/device/prog_done";

/// The xdevcfg character device that accepts a raw bitstream.
pub static CONFIG_DEVICE: &str = "/dev/xdevcfg";

/// Bitstream loaded when `program` is called without a path.
pub static DEFAULT_BITSTREAM: &str = "/store/mep/zynq_fpga_bin_files/ucm1_0.bin";

/// Physical base of the ID/revision GPIO core, from the Vivado address editor.
pub const ID_REV_BASE: u64 = 0x4120_0000;
/// Physical base of the control register GPIO core.
pub const CR_BASE: u64 = 0x4120_1000;
/// Physical base of the data register GPIO core.
pub const DR_BASE: u64 = 0x4120_2000;

pub static VENDOR_CONFIG_PATH: &str = "/usr/lib/zynq-pl/config.toml";
pub static USER_CONFIG_PATH: &str = "/etc/zynq-pl/config.toml";

/// Physical base addresses of the three register blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockBases {
    pub id_rev: u64,
    pub cr: u64,
    pub dr: u64,
}

impl BlockBases {
    pub fn base(&self, selector: BlockSelector) -> u64 {
        match selector {
            BlockSelector::IdRev => self.id_rev,
            BlockSelector::Cr => self.cr,
            BlockSelector::Dr => self.dr,
        }
    }
}

impl Default for BlockBases {
    fn default() -> Self {
        BlockBases {
            id_rev: ID_REV_BASE,
            cr: CR_BASE,
            dr: DR_BASE,
        }
    }
}

/// Resolved configuration handed to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    pub mem_device: PathBuf,
    pub prog_done: PathBuf,
    pub config_device: PathBuf,
    pub default_bitstream: PathBuf,
    pub block_bases: BlockBases,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            mem_device: PathBuf::from(MEM_DEVICE),
            prog_done: PathBuf::from(PROG_DONE_PATH),
            config_device: PathBuf::from(CONFIG_DEVICE),
            default_bitstream: PathBuf::from(DEFAULT_BITSTREAM),
            block_bases: BlockBases::default(),
        }
    }
}

/// This is the top level struct which holds all sections
#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    system_paths: Option<SystemPaths>,
    register_map: Option<RegisterMap>,
}

/// The `[system_paths]` section
#[derive(Debug, Default, Deserialize)]
struct SystemPaths {
    mem_device: Option<PathBuf>,
    prog_done: Option<PathBuf>,
    config_device: Option<PathBuf>,
    default_bitstream: Option<PathBuf>,
}

/// The `[register_map]` section
#[derive(Debug, Default, Deserialize)]
struct RegisterMap {
    id_rev_base: Option<u64>,
    cr_base: Option<u64>,
    dr_base: Option<u64>,
}

impl TomlConfig {
    fn merge(self, fallback: TomlConfig) -> TomlConfig {
        let paths = self.system_paths.unwrap_or_default();
        let fallback_paths = fallback.system_paths.unwrap_or_default();
        let map = self.register_map.unwrap_or_default();
        let fallback_map = fallback.register_map.unwrap_or_default();
        TomlConfig {
            system_paths: Some(SystemPaths {
                mem_device: paths.mem_device.or(fallback_paths.mem_device),
                prog_done: paths.prog_done.or(fallback_paths.prog_done),
                config_device: paths.config_device.or(fallback_paths.config_device),
                default_bitstream: paths
                    .default_bitstream
                    .or(fallback_paths.default_bitstream),
            }),
            register_map: Some(RegisterMap {
                id_rev_base: map.id_rev_base.or(fallback_map.id_rev_base),
                cr_base: map.cr_base.or(fallback_map.cr_base),
                dr_base: map.dr_base.or(fallback_map.dr_base),
            }),
        }
    }
}

impl From<TomlConfig> for DriverConfig {
    fn from(value: TomlConfig) -> Self {
        trace!("Creating DriverConfig from {value:?}");
        let defaults = DriverConfig::default();
        let paths = value.system_paths.unwrap_or_default();
        let map = value.register_map.unwrap_or_default();
        DriverConfig {
            mem_device: paths.mem_device.unwrap_or(defaults.mem_device),
            prog_done: paths.prog_done.unwrap_or(defaults.prog_done),
            config_device: paths.config_device.unwrap_or(defaults.config_device),
            default_bitstream: paths
                .default_bitstream
                .unwrap_or(defaults.default_bitstream),
            block_bases: BlockBases {
                id_rev: map.id_rev_base.unwrap_or(defaults.block_bases.id_rev),
                cr: map.cr_base.unwrap_or(defaults.block_bases.cr),
                dr: map.dr_base.unwrap_or(defaults.block_bases.dr),
            },
        }
    }
}

fn toml_str_to_config(toml_string: &str) -> Result<TomlConfig, ZynqError> {
    toml::from_str(toml_string).map_err(|e| ZynqError::TomlDe {
        toml_string: toml_string.into(),
        e,
    })
}

fn toml_config_from_file(file_path: &Path) -> Result<TomlConfig, ZynqError> {
    if !file_path.is_file() {
        return Err(ZynqError::Internal(format!(
            "Config file not found in {file_path:?}"
        )));
    }
    toml_str_to_config(&fs_read(file_path)?)
}

/// Parse a single TOML document into a [`DriverConfig`], filling gaps with defaults.
///
/// # Returns: `Result<DriverConfig, ZynqError>`
/// * `Ok(DriverConfig)` - The parsed configuration
/// * `Err(ZynqError::TomlDe)` - The document is not valid for this schema
pub fn config_from_str(toml_string: &str) -> Result<DriverConfig, ZynqError> {
    toml_str_to_config(toml_string).map(DriverConfig::from)
}

/// Load a single config file, filling gaps with defaults.
///
/// # Returns: `Result<DriverConfig, ZynqError>`
/// * `Ok(DriverConfig)` - The parsed configuration
/// * `Err(ZynqError::Internal)` - The file does not exist
/// * `Err(ZynqError::IORead)` - The file could not be read
/// * `Err(ZynqError::TomlDe)` - The file is not valid for this schema
pub fn config_from_file(file_path: &Path) -> Result<DriverConfig, ZynqError> {
    toml_config_from_file(file_path).map(DriverConfig::from)
}

/// Resolve the configuration from the user and vendor config files.
///
/// Never fails: each file that cannot be loaded is reported with `warn!` and
/// contributes nothing.
pub fn load_system_config() -> DriverConfig {
    load_layered_config(Path::new(USER_CONFIG_PATH), Path::new(VENDOR_CONFIG_PATH))
}

/// Resolve the configuration from `user` layered over `vendor` layered over the defaults.
pub fn load_layered_config(user: &Path, vendor: &Path) -> DriverConfig {
    let vendor_config = toml_config_from_file(vendor).unwrap_or_else(|e| {
        warn!("Using hardcoded values for vendor config because loading config failed: {e}");
        TomlConfig::default()
    });
    let user_config = toml_config_from_file(user).unwrap_or_else(|e| {
        warn!("Using hardcoded values for user config because loading config failed: {e}");
        TomlConfig::default()
    });
    trace!("Merging user_config: {user_config:?} with vendor_config {vendor_config:?}");
    let config = DriverConfig::from(user_config.merge(vendor_config));
    trace!("Resulting config: {config:?}");
    config
}
