//! Cartridge geometry, timing and transfer constants.

// =============================================================================
// Flash geometry
// =============================================================================

/// Flash data bus width in bytes. All image offsets and lengths are multiples of this.
pub const WORD_SIZE: u32 = 2;

/// Standard (large) erase sector size in bytes.
pub const STANDARD_SECTOR_SIZE: u32 = 64 * 1024;

/// Boot sector size in bytes.
pub const BOOT_SECTOR_SIZE: u32 = 8 * 1024;

/// Number of boot sectors the boot macro-region is split into.
pub const BOOT_SECTORS_PER_REGION: u32 = STANDARD_SECTOR_SIZE / BOOT_SECTOR_SIZE;

/// Number of standard-sized macro-regions on the supported 64 Mbit parts.
pub const MACRO_REGIONS: u32 = 128;

/// Total size of the supported 64 Mbit parts in bytes.
pub const CHIP_SIZE: u32 = MACRO_REGIONS * STANDARD_SECTOR_SIZE;

/// Value of an erased flash word.
pub const ERASED_WORD: u16 = 0xFFFF;

// =============================================================================
// Write coordinator
// =============================================================================

/// Same-data check side buffer, in words (16 KiB).
///
/// Sectors larger than this are erased up front instead of being compared.
pub const SIDE_BUFFER_WORDS: usize = 8 * 1024;

/// Read window used for blank scans and read-back comparisons, in words.
pub const SCAN_WINDOW_WORDS: usize = 256;

// =============================================================================
// Chip timing
// =============================================================================

/// Settle time after reset/autoselect during identification.
pub const IDENTIFY_SETTLE_MS: u32 = 10;

/// Fixed wait after a sector erase command before checking completion.
pub const ERASE_SETTLE_MS: u32 = 900;

/// Toggle-bit poll interval while confirming a sector erase.
pub const ERASE_POLL_INTERVAL_US: u32 = 1_000;

/// Upper bound for a sector erase to finish after the settle time.
pub const ERASE_TIMEOUT_US: u32 = 15_000_000;

/// Upper bound on toggle-bit status reads for a single word program.
///
/// Polling runs back to back; each status read takes at least a microsecond
/// on the bit-banged bus, so this bounds a word program to a few milliseconds.
pub const PROGRAM_TIMEOUT_POLLS: u32 = 5_000;

/// Fixed settle after a dual-word program (typical 10 us).
pub const PROGRAM_PAIR_SETTLE_US: u32 = 20;

// =============================================================================
// DFU transfer
// =============================================================================

/// Window size for the manifest read-back checksum, in bytes.
pub const VERIFY_WINDOW_SIZE: usize = 4096;

/// Time budget for programming one DFU block (dual write: 20us * 16k words).
pub const PROGRAM_BUDGET_MS: u32 = 350;

/// Time budget for blank scans and same-data read-back of one DFU block.
pub const SCAN_BUDGET_MS: u32 = 1_000;

/// Time budget for the manifest read-back checksum.
pub const VERIFY_BUDGET_MS: u32 = 1_000;
