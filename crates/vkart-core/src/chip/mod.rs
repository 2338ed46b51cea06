//! Flash chip types and database
//!
//! This module provides types for describing the supported parallel NOR
//! parts, the table of known chips, and the sector geometry that every
//! other component uses to slice the address space.

mod capabilities;
mod database;
mod geometry;
mod types;

pub use capabilities::Capabilities;
pub use database::*;
pub use geometry::*;
pub use types::*;
