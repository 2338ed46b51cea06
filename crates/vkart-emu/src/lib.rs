//! vkart-emu - Emulated parallel NOR flash for vkart
//!
//! This crate provides a pin-level emulation of the cartridge's flash bus:
//! [`EmuBus`] implements [`vkart_core::bus::ParallelBus`] and forwards whole
//! bus cycles to a [`NorChip`], which decodes AMD command sequences the way
//! a real part does. Programming can only clear bits, erases work on the
//! chip's real sector geometry, and embedded operations report busy through
//! the DQ6 toggle bit. It is useful for testing and for the host simulator.
//!
//! # Example
//!
//! ```ignore
//! use vkart_emu::{EmuBus, EmuConfig, NorChip};
//!
//! let chip = NorChip::new(EmuConfig::for_chip(0x22FD)?);
//! let flash = vkart_core::flash::FlashDevice::open(EmuBus::new(chip))?;
//! ```

mod bus;
mod chip;
mod error;
mod indicator;

pub use bus::EmuBus;
pub use chip::{EmuConfig, EmuOp, NorChip};
pub use error::{EmuError, Result};
pub use indicator::RecordingIndicator;

/// Build a bus with an erased chip from the known chip table attached
pub fn erased_bus(device_id: u16) -> Result<EmuBus> {
    Ok(EmuBus::new(NorChip::new(EmuConfig::for_chip(device_id)?)))
}

#[cfg(test)]
mod tests;
