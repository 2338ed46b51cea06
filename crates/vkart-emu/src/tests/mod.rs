//! End-to-end tests of the flash core against the emulated chip

mod dfu;

use vkart_core::chip::{find_by_device_id, ChipProfile, FlashLayout};
use vkart_core::config::STANDARD_SECTOR_SIZE;
use vkart_core::flash::FlashDevice;

use crate::{EmuBus, EmuConfig, NorChip};

/// Macro-regions in the cut-down test chip
const SMALL_MACROS: u32 = 4;

/// Size of the cut-down test chip in bytes
pub(crate) const SMALL_SIZE: u32 = SMALL_MACROS * STANDARD_SECTOR_SIZE;

/// A table chip shrunk to a few macro-regions so whole-chip transfers stay fast
pub(crate) fn small_profile(device_id: u16) -> ChipProfile {
    let mut profile = *find_by_device_id(device_id).unwrap();
    profile.total_size = SMALL_SIZE;
    if profile.layout == FlashLayout::BootSectorAtTop {
        profile.boot_macro = Some(SMALL_MACROS - 1);
    }
    profile
}

pub(crate) fn small_config(device_id: u16) -> EmuConfig {
    let profile = small_profile(device_id);
    EmuConfig {
        size: profile.total_size as usize,
        profile: Some(profile),
        ..EmuConfig::for_chip(device_id).unwrap()
    }
}

pub(crate) fn small_flash(device_id: u16) -> FlashDevice<EmuBus> {
    small_flash_with(small_config(device_id), &[])
}

pub(crate) fn small_flash_with(config: EmuConfig, image: &[u8]) -> FlashDevice<EmuBus> {
    let profile = config.profile.unwrap();
    let chip = NorChip::with_image(config, image).unwrap();
    FlashDevice::with_profile(EmuBus::new(chip), profile)
}

/// Deterministic non-blank test data
pub(crate) fn pattern(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

pub(crate) fn chip_image(flash: &mut FlashDevice<EmuBus>) -> Vec<u8> {
    flash.bus_mut().chip().image()
}
