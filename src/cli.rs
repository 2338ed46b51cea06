//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a DFU transfer size: even and non-zero
fn parse_block_size(s: &str) -> Result<usize, String> {
    let size = parse_hex_u32(s)? as usize;
    if size == 0 || size % 2 != 0 {
        return Err(format!("Block size must be even and non-zero, got {}", size));
    }
    Ok(size)
}

#[derive(Parser)]
#[command(name = "vkart")]
#[command(author, version, about = "Flash cartridge firmware simulator", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Emulated cartridge options shared across commands
#[derive(clap::Args, Debug, Clone)]
pub struct CartridgeArgs {
    /// Chip to emulate, by part name or device id (e.g. MX29LV640EB, 0x22CB)
    #[arg(short, long)]
    pub chip: String,

    /// Cartridge image file; loaded before and saved after the command
    #[arg(short, long)]
    pub backing: Option<PathBuf>,

    /// Keep the emulated chip busy forever after its first program or erase
    #[arg(long)]
    pub stuck: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List supported flash chips
    Chips {
        /// Filter by vendor name
        #[arg(long)]
        vendor: Option<String>,
    },

    /// Boot the firmware against the emulated chip and show what it detected
    Probe {
        #[command(flatten)]
        cartridge: CartridgeArgs,
    },

    /// Show the sector layout of a chip
    Geometry {
        /// Chip, by part name or device id
        #[arg(short, long)]
        chip: String,

        /// Only show the sector containing this byte address (hex, e.g., 0x10000)
        #[arg(short, long, value_parser = parse_hex_u32)]
        address: Option<u32>,
    },

    /// Write an image to the cartridge through DFU download and manifest
    Download {
        #[command(flatten)]
        cartridge: CartridgeArgs,

        /// Image file to download
        #[arg(short, long)]
        input: PathBuf,

        /// DFU transfer size in bytes
        #[arg(long, default_value = "4096", value_parser = parse_block_size)]
        block_size: usize,
    },

    /// Read the cartridge through DFU upload
    Upload {
        #[command(flatten)]
        cartridge: CartridgeArgs,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// DFU transfer size in bytes
        #[arg(long, default_value = "4096", value_parser = parse_block_size)]
        block_size: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x22CB"), Ok(0x22CB));
        assert_eq!(parse_hex_u32("4096"), Ok(4096));
        assert!(parse_hex_u32("0xZZ").is_err());
    }

    #[test]
    fn test_parse_block_size() {
        assert_eq!(parse_block_size("0x1000"), Ok(4096));
        assert!(parse_block_size("0").is_err());
        assert!(parse_block_size("4095").is_err());
    }

    #[test]
    fn test_cli_parses_download() {
        let cli = Cli::try_parse_from([
            "vkart", "-v", "download", "--chip", "0x22FD", "--input", "rom.bin",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Download {
                cartridge,
                block_size,
                ..
            } => {
                assert_eq!(cartridge.chip, "0x22FD");
                assert_eq!(block_size, 4096);
                assert!(!cartridge.stuck);
            }
            _ => panic!("expected download"),
        }
    }
}
