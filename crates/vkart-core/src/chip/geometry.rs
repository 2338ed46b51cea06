//! Sector geometry
//!
//! The supported parts are built from 128 macro-regions of 64 KiB. On boot
//! sector parts one macro-region is split into eight 8 KiB boot sectors,
//! which shifts the index of every sector above it by seven:
//!
//! ```text
//! bottom boot: [0..=7 boot] [8 = macro 1] ... [134 = macro 127]
//! top boot:    [0 = macro 0] ... [126 = macro 126] [127..=134 boot]
//! ```

use super::{ChipProfile, Sector};
use crate::config::{BOOT_SECTORS_PER_REGION, BOOT_SECTOR_SIZE, STANDARD_SECTOR_SIZE};

/// Return the sector containing byte address `addr`
///
/// The caller is responsible for `addr` being inside the chip.
pub fn sector_at(profile: &ChipProfile, addr: u32) -> Sector {
    let macro_index = addr / STANDARD_SECTOR_SIZE;

    match profile.boot_macro {
        Some(boot) if macro_index == boot => {
            let n = (addr % STANDARD_SECTOR_SIZE) / BOOT_SECTOR_SIZE;
            Sector {
                index: boot + n,
                start: macro_index * STANDARD_SECTOR_SIZE + n * BOOT_SECTOR_SIZE,
                size: BOOT_SECTOR_SIZE,
            }
        }
        Some(boot) if macro_index > boot => Sector {
            index: macro_index + BOOT_SECTORS_PER_REGION - 1,
            start: macro_index * STANDARD_SECTOR_SIZE,
            size: STANDARD_SECTOR_SIZE,
        },
        _ => Sector {
            index: macro_index,
            start: macro_index * STANDARD_SECTOR_SIZE,
            size: STANDARD_SECTOR_SIZE,
        },
    }
}

/// Total number of erase sectors on the chip
pub fn sector_count(profile: &ChipProfile) -> u32 {
    let macros = profile.total_size / STANDARD_SECTOR_SIZE;
    match profile.boot_macro {
        Some(_) => macros + BOOT_SECTORS_PER_REGION - 1,
        None => macros,
    }
}

/// Iterate over every sector of the chip in address order
pub fn sectors(profile: &ChipProfile) -> impl Iterator<Item = Sector> + '_ {
    let mut addr = 0u32;
    core::iter::from_fn(move || {
        if addr >= profile.total_size {
            return None;
        }
        let sector = sector_at(profile, addr);
        addr = sector.end();
        Some(sector)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::find_by_device_id;

    fn chip(id: u16) -> &'static ChipProfile {
        find_by_device_id(id).unwrap()
    }

    #[test]
    fn test_bottom_boot_sectors() {
        let mx = chip(0x22CB);

        assert_eq!(
            sector_at(mx, 0),
            Sector { index: 0, start: 0, size: 8 * 1024 }
        );
        assert_eq!(
            sector_at(mx, 0x3FFE),
            Sector { index: 1, start: 0x2000, size: 8 * 1024 }
        );
        assert_eq!(sector_at(mx, 0xE000).index, 7);
        assert_eq!(
            sector_at(mx, 0x10000),
            Sector { index: 8, start: 0x10000, size: 64 * 1024 }
        );
        assert_eq!(sector_at(mx, 0x7FFFFE).index, 134);
    }

    #[test]
    fn test_top_boot_sectors() {
        let mx = chip(0x22E9);

        assert_eq!(
            sector_at(mx, 0),
            Sector { index: 0, start: 0, size: 64 * 1024 }
        );
        assert_eq!(sector_at(mx, 0x7EFFFE).index, 126);
        assert_eq!(
            sector_at(mx, 0x7F0000),
            Sector { index: 127, start: 0x7F0000, size: 8 * 1024 }
        );
        assert_eq!(
            sector_at(mx, 0x7FFFFE),
            Sector { index: 134, start: 0x7FE000, size: 8 * 1024 }
        );
    }

    #[test]
    fn test_regular_layout() {
        let uniform = chip(0x227E);
        for addr in [0u32, 0x2000, 0x10000, 0x7F0000, 0x7FFFFE] {
            let s = sector_at(uniform, addr);
            assert_eq!(s.size, 64 * 1024);
            assert_eq!(s.index, addr / 0x10000);
            assert!(s.contains(addr));
        }
    }

    #[test]
    fn test_sector_count_and_coverage() {
        for id in [0x22CB, 0x22E9, 0x22FD, 0x22ED, 0x227E] {
            let profile = chip(id);
            let all: std::vec::Vec<Sector> = sectors(profile).collect();

            assert_eq!(all.len() as u32, sector_count(profile));
            assert_eq!(all.first().map(|s| s.start), Some(0));
            assert_eq!(all.last().map(|s| s.end()), Some(profile.total_size));
            for (i, pair) in all.windows(2).enumerate() {
                assert_eq!(pair[0].end(), pair[1].start);
                assert_eq!(pair[0].index as usize, i);
            }
        }
        assert_eq!(sector_count(chip(0x22CB)), 135);
        assert_eq!(sector_count(chip(0x227E)), 128);
    }
}
