//! Probe command implementation

use vkart_core::chip;

use super::{boot_cartridge, format_size};
use crate::cli::CartridgeArgs;

/// Boot the firmware and report the chip it identified
pub fn run_probe(args: &CartridgeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut cartridge = match boot_cartridge(args) {
        Ok(cartridge) => cartridge,
        Err(e) => {
            eprintln!("Probe failed: {}", e);
            return Err(e);
        }
    };

    let profile = *cartridge.flash().profile();
    println!("Found flash chip:");
    println!("  Vendor: {}", profile.vendor);
    println!("  Name:   {}", profile.name);
    println!(
        "  Size:   {} bytes ({})",
        profile.total_size,
        format_size(profile.total_size)
    );
    println!(
        "  ID:     {:04X} {:04X}",
        profile.manufacturer, profile.device_id
    );
    println!(
        "  Layout: {} ({} sectors)",
        profile.layout,
        chip::sector_count(&profile)
    );
    println!(
        "  Double word program: {}",
        if profile.supports_dual_word() { "yes" } else { "no" }
    );
    if let Some(pattern) = cartridge.indicator().current() {
        println!("  LED:    {:?}", pattern);
    }
    Ok(())
}
