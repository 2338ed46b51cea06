//! Chip list command

use vkart_core::chip;

use super::format_size;

/// List all supported chips
pub fn list_chips(vendor_filter: Option<&str>) {
    println!("Supported flash chips:");
    println!();
    println!(
        "{:<12} {:<12} {:>8} {:>10} {:<20} {:<5}",
        "Vendor", "Name", "Size", "ID", "Layout", "Dual"
    );
    println!("{}", "-".repeat(72));

    for chip in chip::KNOWN_CHIPS {
        if let Some(vendor) = vendor_filter {
            if !chip.vendor.to_lowercase().contains(&vendor.to_lowercase()) {
                continue;
            }
        }

        println!(
            "{:<12} {:<12} {:>8} {:>10} {:<20} {:<5}",
            chip.vendor,
            chip.name,
            format_size(chip.total_size),
            format!("{:04X} {:04X}", chip.manufacturer, chip.device_id),
            chip.layout.name(),
            if chip.supports_dual_word() { "yes" } else { "no" }
        );
    }
}
