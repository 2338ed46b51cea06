//! vkart-core - Flash management core for the vkart cartridge
//!
//! This crate drives a parallel NOR flash chip over a bit-banged
//! address/data bus and turns a streamed USB DFU transfer into the minimal
//! set of erase and program operations. It is `no_std` and owns no global
//! state: every component is a value owned by the caller.
//!
//! # Layers
//!
//! - [`bus`] - the `ParallelBus` pin trait and critical-section bus cycles
//! - [`protocol`] - AMD/JEDEC command sequences and toggle-bit polling
//! - [`chip`] - chip profiles, the known chip table and sector geometry
//! - [`flash`] - `FlashDevice` and the streaming `SectorWriteCoordinator`
//! - [`dfu`] - the DFU class callback bridge and its transfer session
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable heap allocation (currently only used by `std` users)
//!
//! # Example
//!
//! ```ignore
//! use vkart_core::{boot, dfu::DfuStatus};
//!
//! let mut bridge = boot(bus, led)?;
//! assert_eq!(bridge.download(0, &image[..4096]), DfuStatus::Ok);
//! assert_eq!(bridge.manifest(), DfuStatus::Ok);
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod bus;
pub mod chip;
pub mod config;
pub mod crc;
pub mod dfu;
pub mod error;
pub mod flash;
pub mod indicator;
pub mod protocol;

pub use error::{Error, Result};

use bus::ParallelBus;
use dfu::DfuBridge;
use flash::FlashDevice;
use indicator::{LedPattern, StatusIndicator};

/// Bring the cartridge up: identify the flash chip and build the DFU bridge
///
/// The indicator is switched to the steady "error" pattern before the chip
/// is probed and only moves to the idle blink once identification succeeds.
/// On failure the indicator stays in the error pattern and the caller is
/// expected to halt rather than operate on an unknown geometry.
pub fn boot<B: ParallelBus, I: StatusIndicator>(
    bus: B,
    mut indicator: I,
) -> Result<DfuBridge<B, I>> {
    indicator.set_pattern(LedPattern::Error);

    let flash = match FlashDevice::open(bus) {
        Ok(flash) => flash,
        Err(e) => {
            log::error!("flash detection failed: {}", e);
            return Err(e);
        }
    };

    indicator.set_pattern(LedPattern::Waiting);
    Ok(DfuBridge::new(flash, indicator))
}
