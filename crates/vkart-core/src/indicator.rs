//! Status LED interface
//!
//! The blink timer is board code; the core only selects a pattern.

/// Status LED patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedPattern {
    /// Idle, waiting for a host transfer
    Waiting,
    /// Upload in progress
    Reading,
    /// Download in progress
    Writing,
    /// Steady on: no usable flash chip
    Error,
}

impl LedPattern {
    /// Blink half-period in milliseconds, `None` for steady on
    pub const fn interval_ms(self) -> Option<u32> {
        match self {
            Self::Waiting => Some(2000),
            Self::Reading => Some(1000),
            Self::Writing => Some(500),
            Self::Error => None,
        }
    }
}

/// Something that can display a [`LedPattern`]
pub trait StatusIndicator {
    /// Switch to a new pattern
    fn set_pattern(&mut self, pattern: LedPattern);
}

impl<T: StatusIndicator + ?Sized> StatusIndicator for &mut T {
    fn set_pattern(&mut self, pattern: LedPattern) {
        (**self).set_pattern(pattern)
    }
}

/// Indicator for boards without a status LED
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIndicator;

impl StatusIndicator for NoIndicator {
    fn set_pattern(&mut self, _pattern: LedPattern) {}
}
