//! Flash command protocols
//!
//! Only the AMD/JEDEC command set is needed by the supported parts.

pub mod amd;
