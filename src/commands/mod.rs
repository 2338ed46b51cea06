//! CLI command implementations
//!
//! Every command that touches a cartridge boots the firmware core against
//! an emulated chip, exactly as the device does at power-up, and then talks
//! to it only through the DFU callbacks a USB stack would call.
//!
//! ## Backing files
//!
//! With `--backing`, the emulated chip starts from the file contents (if
//! the file exists) and the final chip contents are written back, so a
//! sequence of commands behaves like one physical cartridge.

mod chips;
mod dfu;
mod geometry;
mod probe;

pub use chips::list_chips;
pub use dfu::{run_download, run_upload};
pub use geometry::run_geometry;
pub use probe::run_probe;

use std::error::Error;

use indicatif::{ProgressBar, ProgressStyle};
use vkart_core::chip::{self, ChipProfile};
use vkart_core::dfu::DfuBridge;
use vkart_emu::{EmuBus, EmuConfig, NorChip, RecordingIndicator};

use crate::cli::CartridgeArgs;
use crate::error::CliError;

/// The firmware as booted against the emulated cartridge
pub type Cartridge = DfuBridge<EmuBus, RecordingIndicator>;

/// Find a known chip by part name (case-insensitive) or device id
pub fn resolve_chip(name: &str) -> Result<&'static ChipProfile, CliError> {
    if let Some(profile) = chip::KNOWN_CHIPS
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
    {
        return Ok(profile);
    }

    let hex = name
        .strip_prefix("0x")
        .or_else(|| name.strip_prefix("0X"))
        .unwrap_or(name);
    u16::from_str_radix(hex, 16)
        .ok()
        .and_then(chip::find_by_device_id)
        .ok_or_else(|| CliError::UnknownChip(name.to_string()))
}

/// Build the emulated chip described by `args`
fn open_bus(args: &CartridgeArgs) -> Result<EmuBus, Box<dyn Error>> {
    let profile = resolve_chip(&args.chip)?;
    let mut config = EmuConfig::for_chip(profile.device_id)?;
    if args.stuck {
        config = config.stuck();
    }

    let chip = match &args.backing {
        Some(path) if path.exists() => {
            log::info!("Loading cartridge image from {:?}", path);
            NorChip::from_file(config, path)?
        }
        _ => NorChip::new(config),
    };
    Ok(EmuBus::new(chip))
}

/// Boot the firmware against the cartridge described by `args`
pub fn boot_cartridge(args: &CartridgeArgs) -> Result<Cartridge, Box<dyn Error>> {
    let bus = open_bus(args)?;
    Ok(vkart_core::boot(bus, RecordingIndicator::new())?)
}

/// Write the chip contents back to the backing file, if one was given
pub fn save_backing(args: &CartridgeArgs, cartridge: &mut Cartridge) -> Result<(), Box<dyn Error>> {
    if let Some(path) = &args.backing {
        cartridge.flash().bus_mut().chip().save(path)?;
        log::info!("Saved cartridge image to {:?}", path);
    }
    Ok(())
}

/// Create a progress bar with custom phase message
fn create_progress_bar(total: u64, phase: &str) -> Result<ProgressBar, Box<dyn Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                phase
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn format_size(bytes: u32) -> String {
    if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_chip() {
        assert_eq!(resolve_chip("mx29lv640eb").unwrap().device_id, 0x22CB);
        assert_eq!(resolve_chip("0x22ED").unwrap().name, "M29W640FT");
        assert_eq!(resolve_chip("227e").unwrap().name, "S29GL064");
        assert!(matches!(
            resolve_chip("0x22C9"),
            Err(CliError::UnknownChip(_))
        ));
        assert!(resolve_chip("W25Q64").is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(8 * 1024 * 1024), "8 MiB");
        assert_eq!(format_size(0x2000), "8 KiB");
        assert_eq!(format_size(512), "512 B");
    }
}
