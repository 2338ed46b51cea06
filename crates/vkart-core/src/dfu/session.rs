//! Per-transfer bookkeeping

use crate::crc::Crc32;

/// Direction of the transfer in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// No transfer
    #[default]
    None,
    /// Device to host
    Upload,
    /// Host to device
    Download,
}

/// State of the current DFU transfer
///
/// Reset at the start of every transfer. The offset never exceeds the
/// maximum length, and once `stopped` is latched the session accepts no
/// more data until it is reset.
#[derive(Debug, Clone, Copy)]
pub struct TransferSession {
    direction: Direction,
    offset: u32,
    max_len: u32,
    crc: Crc32,
    stopped: bool,
}

impl Default for TransferSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferSession {
    /// An empty session with no transfer
    pub const fn new() -> Self {
        Self {
            direction: Direction::None,
            offset: 0,
            max_len: 0,
            crc: Crc32::new(),
            stopped: false,
        }
    }

    /// Start a fresh transfer
    pub fn begin(&mut self, direction: Direction, max_len: u32) {
        *self = Self {
            direction,
            max_len,
            ..Self::new()
        };
    }

    /// Forget the transfer
    pub fn end(&mut self) {
        self.direction = Direction::None;
    }

    /// Direction of the transfer in progress
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Bytes transferred so far
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Maximum transfer length in bytes
    pub fn max_len(&self) -> u32 {
        self.max_len
    }

    /// Bytes left before the maximum length
    pub fn remaining(&self) -> u32 {
        self.max_len - self.offset
    }

    /// Running checksum of the transferred bytes
    pub fn crc(&self) -> u32 {
        self.crc.finalize()
    }

    /// Whether the transfer has hit the maximum length
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Clip a requested length to the remaining room
    pub fn clip(&self, len: usize) -> usize {
        core::cmp::min(len, self.remaining() as usize)
    }

    /// Account for `bytes` having been transferred
    pub(crate) fn record(&mut self, bytes: &[u8]) {
        self.crc.update(bytes);
        self.offset += bytes.len() as u32;
    }

    /// Latch the stop flag
    pub(crate) fn stop(&mut self) {
        self.stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_resets_everything() {
        let mut session = TransferSession::new();
        session.begin(Direction::Download, 16);
        session.record(&[1, 2, 3, 4]);
        session.stop();

        session.begin(Direction::Upload, 32);
        assert_eq!(session.direction(), Direction::Upload);
        assert_eq!(session.offset(), 0);
        assert_eq!(session.max_len(), 32);
        assert_eq!(session.crc(), 0);
        assert!(!session.is_stopped());
    }

    #[test]
    fn test_clip() {
        let mut session = TransferSession::new();
        session.begin(Direction::Download, 10);
        session.record(&[0; 6]);
        assert_eq!(session.remaining(), 4);
        assert_eq!(session.clip(2), 2);
        assert_eq!(session.clip(4096), 4);
    }
}
