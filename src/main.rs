//! vkart - host-side simulator for the vkart flash cartridge
//!
//! Runs the cartridge firmware core against an emulated parallel NOR chip
//! so that images can be downloaded, uploaded and inspected without the
//! hardware.
//!
//! # Architecture
//!
//! - **vkart-core** is the firmware: chip identification, the AMD command
//!   protocol, the sector write coordinator and the DFU callbacks.
//! - **vkart-emu** stands in for the cartridge hardware: a pin-level bus
//!   with a command-decoding NOR chip behind it.
//!
//! This binary plays the USB host. Each command boots the firmware the way
//! the cartridge does at power-up and then drives it through DFU requests.

mod cli;
mod commands;
mod error;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Chips { vendor } => {
            commands::list_chips(vendor.as_deref());
            Ok(())
        }
        Commands::Probe { cartridge } => commands::run_probe(&cartridge),
        Commands::Geometry { chip, address } => commands::run_geometry(&chip, address),
        Commands::Download {
            cartridge,
            input,
            block_size,
        } => commands::run_download(&cartridge, &input, block_size),
        Commands::Upload {
            cartridge,
            output,
            block_size,
        } => commands::run_upload(&cartridge, &output, block_size),
    }
}
