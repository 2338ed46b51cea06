//! Error types for the emulator

use thiserror::Error;

/// Emulator errors
#[derive(Debug, Error)]
pub enum EmuError {
    /// The device id is not in the known chip table
    #[error("No known chip with device id 0x{0:04X}")]
    UnknownChip(u16),

    /// Initial image does not fit the emulated chip
    #[error("Image of {len} bytes does not fit a {size} byte chip")]
    ImageTooLarge { len: usize, size: usize },

    /// Image length is not a whole number of words
    #[error("Image length {0} is not a multiple of 2")]
    OddImageLength(usize),

    /// I/O error reading or writing a backing file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, EmuError>;
