//! High-level flash operations
//!
//! [`FlashDevice`] owns the bus and the identified chip profile and exposes
//! word-level read, program and erase. [`SectorWriteCoordinator`] sits on top
//! of it and turns a streamed image into per-sector erase/program decisions.

mod device;
mod writer;

pub use device::FlashDevice;
pub use writer::{SectorAction, SectorWriteCoordinator, WriteStats};
