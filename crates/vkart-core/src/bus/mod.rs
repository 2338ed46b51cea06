//! Parallel flash bus abstraction
//!
//! This module defines the pin-level trait that board support code must
//! implement, and the bus cycles built on top of it.

pub mod cycle;
mod traits;

pub use traits::*;
