//! Table of known flash chips
//!
//! Layout and capabilities are a pure function of the device identifier
//! read in autoselect mode. The manufacturer word is recorded for display
//! only; some boards return it unreliably, so lookups never depend on it.

use super::{Capabilities, ChipProfile, FlashLayout};
use crate::config::{CHIP_SIZE, MACRO_REGIONS};

/// JEDEC manufacturer word for Macronix
pub const MANUFACTURER_MACRONIX: u16 = 0x00C2;
/// JEDEC manufacturer word for ST/Numonyx
pub const MANUFACTURER_ST: u16 = 0x0020;
/// JEDEC manufacturer word for AMD/Spansion
pub const MANUFACTURER_SPANSION: u16 = 0x0001;

const BOTTOM_MACRO: Option<u32> = Some(0);
const TOP_MACRO: Option<u32> = Some(MACRO_REGIONS - 1);

/// All chips the cartridge knows how to drive
pub static KNOWN_CHIPS: &[ChipProfile] = &[
    ChipProfile {
        vendor: "Macronix",
        name: "MX29LV640EB",
        manufacturer: MANUFACTURER_MACRONIX,
        device_id: 0x22CB,
        total_size: CHIP_SIZE,
        layout: FlashLayout::BootSectorAtBottom,
        boot_macro: BOTTOM_MACRO,
        capabilities: Capabilities::empty(),
    },
    ChipProfile {
        vendor: "Macronix",
        name: "MX29LV640ET",
        manufacturer: MANUFACTURER_MACRONIX,
        device_id: 0x22E9,
        total_size: CHIP_SIZE,
        layout: FlashLayout::BootSectorAtTop,
        boot_macro: TOP_MACRO,
        capabilities: Capabilities::empty(),
    },
    ChipProfile {
        vendor: "ST/Numonyx",
        name: "M29W640FB",
        manufacturer: MANUFACTURER_ST,
        device_id: 0x22FD,
        total_size: CHIP_SIZE,
        layout: FlashLayout::BootSectorAtBottom,
        boot_macro: BOTTOM_MACRO,
        capabilities: Capabilities::DUAL_WORD_PROGRAM,
    },
    ChipProfile {
        vendor: "ST/Numonyx",
        name: "M29W640FT",
        manufacturer: MANUFACTURER_ST,
        device_id: 0x22ED,
        total_size: CHIP_SIZE,
        layout: FlashLayout::BootSectorAtTop,
        boot_macro: TOP_MACRO,
        capabilities: Capabilities::DUAL_WORD_PROGRAM,
    },
    ChipProfile {
        vendor: "Spansion",
        name: "S29GL064",
        manufacturer: MANUFACTURER_SPANSION,
        device_id: 0x227E,
        total_size: CHIP_SIZE,
        layout: FlashLayout::Regular,
        boot_macro: None,
        capabilities: Capabilities::empty(),
    },
];

/// Find a chip profile by its device identifier
pub fn find_by_device_id(device_id: u16) -> Option<&'static ChipProfile> {
    KNOWN_CHIPS.iter().find(|c| c.device_id == device_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_layouts() {
        let cases = [
            (0x22CB, FlashLayout::BootSectorAtBottom, Some(0), false),
            (0x22E9, FlashLayout::BootSectorAtTop, Some(127), false),
            (0x22FD, FlashLayout::BootSectorAtBottom, Some(0), true),
            (0x22ED, FlashLayout::BootSectorAtTop, Some(127), true),
            (0x227E, FlashLayout::Regular, None, false),
        ];

        for (id, layout, boot_macro, dual) in cases {
            let chip = find_by_device_id(id).unwrap();
            assert_eq!(chip.layout, layout, "layout of {:04X}", id);
            assert_eq!(chip.boot_macro, boot_macro, "boot macro of {:04X}", id);
            assert_eq!(chip.supports_dual_word(), dual, "dual of {:04X}", id);
            assert_eq!(chip.total_size, 8 * 1024 * 1024);
        }
    }

    #[test]
    fn test_unknown_device_id() {
        assert!(find_by_device_id(0x0000).is_none());
        assert!(find_by_device_id(0xFFFF).is_none());
        assert!(find_by_device_id(0x22C9).is_none());
    }

    #[test]
    fn test_device_ids_unique() {
        for (i, a) in KNOWN_CHIPS.iter().enumerate() {
            for b in &KNOWN_CHIPS[i + 1..] {
                assert_ne!(a.device_id, b.device_id);
            }
        }
    }

    #[test]
    fn test_valid_range() {
        let chip = find_by_device_id(0x22CB).unwrap();
        assert!(chip.is_valid_range(0, CHIP_SIZE));
        assert!(!chip.is_valid_range(CHIP_SIZE - 2, 4));
        assert!(!chip.is_valid_range(u32::MAX, 2));
        assert_eq!(chip.total_words(), 4 * 1024 * 1024);
    }
}
