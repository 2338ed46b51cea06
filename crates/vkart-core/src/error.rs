//! Error types for vkart-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate. Host-facing DFU status codes live in
//! [`crate::dfu::DfuStatus`]; this type covers driver and coordinator
//! failures only.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Chip errors
    /// The chip reported a device identifier outside the known table
    ChipNotSupported {
        /// Manufacturer word read in autoselect mode
        manufacturer: u16,
        /// Device word read in autoselect mode
        device: u16,
    },
    /// Dual-word programming requested on a chip without that capability
    DualWordUnsupported,

    // Bus errors
    /// Toggle-bit polling did not converge within its bound
    BusTimeout {
        /// Word address of the operation that did not complete
        addr: u32,
    },

    // Address/size errors
    /// Address is beyond the flash chip size
    AddressOutOfBounds,
    /// Operation requires word-aligned address or length
    InvalidAlignment,

    // Transfer errors
    /// A write transfer is already in progress
    TransferActive,
    /// No write transfer has been started
    NotStarted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChipNotSupported {
                manufacturer,
                device,
            } => write!(
                f,
                "flash chip not supported (manufacturer 0x{:04X}, device 0x{:04X})",
                manufacturer, device
            ),
            Self::DualWordUnsupported => {
                write!(f, "dual-word program not supported by this chip")
            }
            Self::BusTimeout { addr } => {
                write!(f, "flash operation at word 0x{:06X} timed out", addr)
            }
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::InvalidAlignment => write!(f, "invalid alignment"),
            Self::TransferActive => write!(f, "a write transfer is already active"),
            Self::NotStarted => write!(f, "no write transfer in progress"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
