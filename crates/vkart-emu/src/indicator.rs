//! Status indicator that remembers every pattern it was given

use vkart_core::indicator::{LedPattern, StatusIndicator};

/// Records pattern changes instead of blinking an LED
#[derive(Debug, Default, Clone)]
pub struct RecordingIndicator {
    history: Vec<LedPattern>,
}

impl RecordingIndicator {
    /// Create an indicator with no history
    pub fn new() -> Self {
        Self::default()
    }

    /// Pattern currently shown, if any was set
    pub fn current(&self) -> Option<LedPattern> {
        self.history.last().copied()
    }

    /// Every pattern set so far, oldest first
    pub fn history(&self) -> &[LedPattern] {
        &self.history
    }
}

impl StatusIndicator for RecordingIndicator {
    fn set_pattern(&mut self, pattern: LedPattern) {
        log::debug!(
            "led: {:?} ({})",
            pattern,
            match pattern.interval_ms() {
                Some(ms) => format!("{} ms", ms),
                None => "steady".to_string(),
            }
        );
        self.history.push(pattern);
    }
}
