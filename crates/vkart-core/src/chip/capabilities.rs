//! Flash chip capability flags

use bitflags::bitflags;

bitflags! {
    /// Optional command-set capabilities of a flash chip
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Supports the double word program command (`555/50`)
        const DUAL_WORD_PROGRAM = 1 << 0;
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::empty()
    }
}
