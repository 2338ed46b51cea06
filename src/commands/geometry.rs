//! Sector layout command

use vkart_core::chip;

use super::{format_size, resolve_chip};
use crate::error::CliError;

/// Print every sector of a chip, or only the one holding `address`
pub fn run_geometry(name: &str, address: Option<u32>) -> Result<(), Box<dyn std::error::Error>> {
    let profile = resolve_chip(name)?;

    if let Some(addr) = address {
        if addr >= profile.total_size {
            return Err(CliError::AddressOutOfRange {
                addr,
                size: profile.total_size,
            }
            .into());
        }
        let sector = chip::sector_at(profile, addr);
        println!(
            "0x{:06X} is in sector {} (0x{:06X} - 0x{:06X}, {})",
            addr,
            sector.index,
            sector.start,
            sector.end() - 1,
            format_size(sector.size)
        );
        return Ok(());
    }

    println!(
        "{} {}: {} sectors, {}",
        profile.vendor,
        profile.name,
        chip::sector_count(profile),
        profile.layout
    );
    println!();
    for sector in chip::sectors(profile) {
        println!(
            "  {:>3}  0x{:06X} - 0x{:06X}  {:>7}",
            sector.index,
            sector.start,
            sector.end() - 1,
            format_size(sector.size)
        );
    }
    Ok(())
}
