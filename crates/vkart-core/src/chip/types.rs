//! Flash chip type definitions

use super::Capabilities;

/// Placement of the small boot sectors within the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLayout {
    /// Uniform 64 KiB sectors across the whole chip
    Regular,
    /// The first macro-region is split into boot sectors
    BootSectorAtBottom,
    /// The last macro-region is split into boot sectors
    BootSectorAtTop,
}

impl FlashLayout {
    /// Short human-readable name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Regular => "uniform",
            Self::BootSectorAtBottom => "bottom boot",
            Self::BootSectorAtTop => "top boot",
        }
    }
}

impl core::fmt::Display for FlashLayout {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Description of an identified flash chip
///
/// Built once from the known chip table when the chip is identified and
/// never modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipProfile {
    /// Vendor name
    pub vendor: &'static str,
    /// Part name
    pub name: &'static str,
    /// JEDEC manufacturer word
    pub manufacturer: u16,
    /// Device identifier word
    pub device_id: u16,
    /// Total size in bytes
    pub total_size: u32,
    /// Boot sector placement
    pub layout: FlashLayout,
    /// Index of the macro-region split into boot sectors (None for Regular)
    pub boot_macro: Option<u32>,
    /// Optional command-set capabilities
    pub capabilities: Capabilities,
}

impl ChipProfile {
    /// Total size in 16-bit words
    pub const fn total_words(&self) -> u32 {
        self.total_size / crate::config::WORD_SIZE
    }

    /// Whether the double word program command may be used
    pub fn supports_dual_word(&self) -> bool {
        self.capabilities.contains(Capabilities::DUAL_WORD_PROGRAM)
    }

    /// Check if an address range lies inside the chip
    pub fn is_valid_range(&self, addr: u32, len: u32) -> bool {
        addr.checked_add(len)
            .map(|end| end <= self.total_size)
            .unwrap_or(false)
    }
}

/// One erase unit of the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sector {
    /// Sector index in the chip's numbering
    pub index: u32,
    /// Start byte address
    pub start: u32,
    /// Size in bytes
    pub size: u32,
}

impl Sector {
    /// End byte address (exclusive)
    pub const fn end(&self) -> u32 {
        self.start + self.size
    }

    /// Whether `addr` falls inside this sector
    pub const fn contains(&self, addr: u32) -> bool {
        addr >= self.start && addr < self.end()
    }
}
