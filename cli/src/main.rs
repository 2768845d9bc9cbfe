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

//! Command-line front end for the `zynq_pl` register driver.
//!
//! Every invocation is one complete session: the driver is initialised, the
//! requested operation runs, and the register blocks are unmapped again before
//! the process exits.
//!
//! # Examples
//!
//! ```bash
//! zynq_cli status
//! zynq_cli --test-mode write dr 0x00030003
//! zynq_cli read dr --half lower
//! zynq_cli direction set cr 0xffffffff 0xffffffff
//! zynq_cli --program /lib/firmware/design.bin status
//! ```

mod access;
mod program;
mod status;

use crate::access::{Half, Target};
use clap::{Parser, Subcommand, arg, command};
use log::{debug, error};
use std::error::Error;
use std::path::PathBuf;
use zynq_pl::config::{DriverConfig, config_from_file, load_system_config};
use zynq_pl::loader::DirectSink;
use zynq_pl::memory::simulated::SimulatedMemory;
use zynq_pl::{ChannelMask, DebugLevel, Driver, InitFlags, OpMode, ZynqError};

#[derive(Parser, Debug)]
#[command(name = "zynq_cli")]
#[command(bin_name = "zynq_cli")]
struct Cli {
    #[arg(
        long = "config",
        value_name = "FILE",
        help = r#"TOML config file to use instead of the system config.
By default /etc/zynq-pl/config.toml is layered over /usr/lib/zynq-pl/config.toml.
        "#
    )]
    config: Option<PathBuf>,
    #[arg(
        long = "simulate",
        help = r#"Use an in-memory register store instead of /dev/mem.
Bitstreams are copied byte for byte into the configured config_device, and
prog_done must point at a readable file, so pair this with --config.
        "#
    )]
    simulate: bool,
    #[arg(
        long = "test-mode",
        help = "Initialise in test mode: every data write is latched by a software clock pulse"
    )]
    test_mode: bool,
    #[arg(
        long = "program",
        value_name = "BITSTREAM",
        num_args = 0..=1,
        help = r#"Program the fabric before opening it.
Without a value the default_bitstream from the config is used.
        "#
    )]
    program: Option<Option<PathBuf>>,
    #[arg(
        long = "debug-level",
        value_name = "MASK",
        value_parser = parse_debug_level,
        help = "Diagnostic mask: 1 = errors, 2 = debug, 4 = register level trace"
    )]
    debug_level: Option<DebugLevel>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the FPGA identification and revision
    Status,
    /// Read the data words of a register block
    Read {
        target: Target,
        #[arg(long, value_parser = parse_mask, help = "Channel mask, 1, 2 or 3 [default: 3]")]
        channels: Option<ChannelMask>,
        #[arg(long, value_enum, default_value_t = Half::Full)]
        half: Half,
    },
    /// Write the data words of a register block
    Write {
        target: Target,
        /// Value for channel 1, then for channel 2
        #[arg(num_args = 1..=2, required = true, value_parser = parse_u32)]
        values: Vec<u32>,
        #[arg(long, value_parser = parse_mask, help = "Channel mask [default: one bit per value given]")]
        channels: Option<ChannelMask>,
        #[arg(long, value_enum, default_value_t = Half::Full)]
        half: Half,
    },
    /// Get or set the direction words of a register block
    Direction {
        #[command(subcommand)]
        command: DirectionSubcommand,
    },
    /// Program the fabric and check that it reports configured
    Program {
        /// Bitstream to load [default: default_bitstream from the config]
        bitstream: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum DirectionSubcommand {
    Get {
        target: Target,
        #[arg(long, value_parser = parse_mask)]
        channels: Option<ChannelMask>,
    },
    Set {
        target: Target,
        #[arg(num_args = 1..=2, required = true, value_parser = parse_u32)]
        values: Vec<u32>,
        #[arg(long, value_parser = parse_mask)]
        channels: Option<ChannelMask>,
    },
}

/// Parse a register value written in decimal or, with a `0x` prefix, in hex.
fn parse_u32(value: &str) -> Result<u32, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => value.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("{value:?} is not a 32 bit value: {e}"))
}

fn parse_mask(value: &str) -> Result<ChannelMask, String> {
    let mask = ChannelMask::from_raw(parse_u32(value)?).map_err(|e| e.to_string())?;
    if mask.is_empty() {
        return Err("channel mask selects no channel".into());
    }
    Ok(mask)
}

fn parse_debug_level(value: &str) -> Result<DebugLevel, String> {
    let raw = parse_u32(value)?;
    DebugLevel::from_bits(raw).ok_or_else(|| format!("debug level 0x{raw:X} has bits outside 0x7"))
}

/// The mask implied by how many channel values were given.
fn mask_for(values: &[u32]) -> ChannelMask {
    if values.len() > 1 {
        ChannelMask::all()
    } else {
        ChannelMask::CHANNEL1
    }
}

fn load_config(cli: &Cli) -> Result<DriverConfig, ZynqError> {
    match &cli.config {
        Some(path) => config_from_file(path),
        None => Ok(load_system_config()),
    }
}

fn build_driver(cli: &Cli, config: &DriverConfig) -> Driver {
    let mut driver = if cli.simulate {
        debug!("Using simulated register memory");
        Driver::new(
            config,
            Box::new(SimulatedMemory::new()),
            Box::new(DirectSink::new(&config.config_device)),
        )
    } else {
        Driver::with_hardware(config)
    };
    if let Some(level) = cli.debug_level {
        driver.set_debug_level(level);
    }
    driver
}

/// Initialise `driver`, run `op` against it and unmap everything again.
///
/// The first error wins: an `op` failure is reported in preference to a
/// failure to close afterwards.
fn run_session<T>(
    cli: &Cli,
    driver: &mut Driver,
    op: impl FnOnce(&mut Driver) -> Result<T, ZynqError>,
) -> Result<T, ZynqError> {
    let op_mode = if cli.test_mode {
        OpMode::Test
    } else {
        OpMode::Normal
    };
    let mut flags = InitFlags::REQUEST_OPEN;
    match &cli.program {
        Some(Some(bitstream)) => driver.program(Some(bitstream))?,
        Some(None) => flags |= InitFlags::REQUEST_PROGRAM,
        None => {}
    }

    if let Err(e) = driver.init(op_mode, flags) {
        if driver.is_open() {
            if let Err(close_error) = driver.close() {
                debug!("Releasing registers after failed init: {close_error}");
            }
        }
        return Err(e);
    }
    let result = op(driver);
    let closed = driver.close();
    let value = result?;
    closed?;
    Ok(value)
}

fn dispatch(cli: &Cli, driver: &mut Driver) -> Result<String, ZynqError> {
    match &cli.command {
        Commands::Status => run_session(cli, driver, |d| status::status_handler(d)),
        Commands::Read {
            target,
            channels,
            half,
        } => {
            let mask = channels.unwrap_or(ChannelMask::all());
            run_session(cli, driver, |d| access::read_handler(d, *target, mask, *half))
        }
        Commands::Write {
            target,
            values,
            channels,
            half,
        } => {
            let mask = channels.unwrap_or_else(|| mask_for(values));
            run_session(cli, driver, |d| {
                access::write_handler(d, *target, values, mask, *half)
            })
        }
        Commands::Direction { command } => match command {
            DirectionSubcommand::Get { target, channels } => {
                let mask = channels.unwrap_or(ChannelMask::all());
                run_session(cli, driver, |d| access::get_direction_handler(d, *target, mask))
            }
            DirectionSubcommand::Set {
                target,
                values,
                channels,
            } => {
                let mask = channels.unwrap_or_else(|| mask_for(values));
                run_session(cli, driver, |d| {
                    access::set_direction_handler(d, *target, values, mask)
                })
            }
        },
        Commands::Program { bitstream } => program::program_handler(driver, bitstream.as_deref()),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = cli.debug_level {
        logger.filter_level(level.level_filter());
    }
    logger.init();
    debug!("parsed cli command with {cli:?}");

    let config = load_config(&cli)?;
    let mut driver = build_driver(&cli, &config);
    match dispatch(&cli, &mut driver) {
        Ok(message) => {
            println!("{message}");
            Ok(())
        }
        Err(e) => {
            error!("{e}");
            Err(e.into())
        }
    }
}
