//! Errors reported by the command line tool

use thiserror::Error;
use vkart_core::dfu::DfuStatus;

/// Failures not already covered by the firmware or emulator errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Neither a part name nor a device id from the known chip table
    #[error("Unknown chip '{0}' (see `vkart chips`)")]
    UnknownChip(String),

    /// Byte address outside the chip
    #[error("Address 0x{addr:06X} is beyond the {size} byte chip")]
    AddressOutOfRange { addr: u32, size: u32 },

    /// The firmware answered a DFU request with an error status
    #[error("DFU {request} failed at block {block}: {status} (bStatus 0x{:02X})", .status.code())]
    Dfu {
        request: &'static str,
        block: usize,
        status: DfuStatus,
    },
}
