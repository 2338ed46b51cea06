//! DFU callbacks mapped onto flash operations

use super::session::{Direction, TransferSession};
use super::status::{self, DfuPhase, DfuStatus};
use crate::bus::ParallelBus;
use crate::config::{SIDE_BUFFER_WORDS, VERIFY_WINDOW_SIZE, WORD_SIZE};
use crate::crc::Crc32;
use crate::flash::{FlashDevice, SectorWriteCoordinator, WriteStats};
use crate::indicator::{LedPattern, StatusIndicator};

/// What the bridge is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// No transfer in progress
    Idle,
    /// Serving an upload (device to host)
    Uploading,
    /// Accepting a download (host to device)
    Downloading,
}

/// Connects the USB stack's DFU callbacks to the flash
///
/// Errors are reported as [`DfuStatus`] values and never change the bridge
/// state; the host is expected to abort after an error. State only changes
/// through the start of a transfer, manifestation, the end of an upload or
/// an abort.
pub struct DfuBridge<B, I, const N: usize = SIDE_BUFFER_WORDS> {
    flash: FlashDevice<B>,
    writer: SectorWriteCoordinator<N>,
    indicator: I,
    session: TransferSession,
}

impl<B: ParallelBus, I: StatusIndicator, const N: usize> DfuBridge<B, I, N> {
    /// Create an idle bridge for an identified flash
    pub fn new(flash: FlashDevice<B>, indicator: I) -> Self {
        Self {
            flash,
            writer: SectorWriteCoordinator::new(),
            indicator,
            session: TransferSession::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> BridgeState {
        match self.session.direction() {
            Direction::None => BridgeState::Idle,
            Direction::Upload => BridgeState::Uploading,
            Direction::Download => BridgeState::Downloading,
        }
    }

    /// The current (or last) transfer session
    pub fn session(&self) -> &TransferSession {
        &self.session
    }

    /// The flash device
    pub fn flash(&mut self) -> &mut FlashDevice<B> {
        &mut self.flash
    }

    /// Write statistics of the current (or last) download
    pub fn stats(&self) -> &WriteStats {
        self.writer.stats()
    }

    /// The status indicator
    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// Start an upload of the whole chip
    pub fn begin_upload(&mut self) -> DfuStatus {
        if self.state() != BridgeState::Idle {
            log::warn!("upload requested while {:?}", self.state());
            return DfuStatus::ErrUnknown;
        }

        self.session
            .begin(Direction::Upload, self.flash.profile().total_size);
        self.indicator.set_pattern(LedPattern::Reading);
        log::info!("upload started");
        DfuStatus::Ok
    }

    /// Start a download of a new image
    pub fn begin_download(&mut self) -> DfuStatus {
        if self.state() != BridgeState::Idle {
            log::warn!("download requested while {:?}", self.state());
            return DfuStatus::ErrUnknown;
        }

        if let Err(e) = self.writer.start(self.flash.profile()) {
            log::error!("can't start download: {}", e);
            return DfuStatus::ErrFile;
        }
        self.session
            .begin(Direction::Download, self.flash.profile().total_size);
        self.indicator.set_pattern(LedPattern::Writing);
        log::info!("download started");
        DfuStatus::Ok
    }

    /// Handle one `DFU_DNLOAD` block
    ///
    /// Block 0 starts a download if none is active. Data beyond the chip
    /// capacity is accepted and dropped.
    pub fn download(&mut self, block: u16, data: &[u8]) -> DfuStatus {
        if data.len() % WORD_SIZE as usize != 0 {
            log::warn!("download block {}: odd length {}", block, data.len());
            return DfuStatus::ErrAddress;
        }

        if self.state() != BridgeState::Downloading {
            if block != 0 {
                log::warn!("download block {} without a transfer", block);
                return DfuStatus::ErrUnknown;
            }
            let status = self.begin_download();
            if !status.is_ok() {
                return status;
            }
        }

        if self.session.is_stopped() {
            return DfuStatus::Ok;
        }

        let chunk = &data[..self.session.clip(data.len())];
        match self.writer.next(&mut self.flash, chunk) {
            Ok(reached) => {
                self.session.record(chunk);
                if reached {
                    log::info!("download reached chip capacity, ignoring further data");
                    self.session.stop();
                }
                DfuStatus::Ok
            }
            Err(e) => {
                log::error!(
                    "download block {} at 0x{:06X} failed: {}",
                    block,
                    self.session.offset(),
                    e
                );
                DfuStatus::ErrUnknown
            }
        }
    }

    /// Handle manifestation: close the write and verify the checksum
    ///
    /// The written range is read back and checksummed again; the session
    /// ends whatever the outcome.
    pub fn manifest(&mut self) -> DfuStatus {
        if self.state() != BridgeState::Downloading {
            log::warn!("manifest while {:?}", self.state());
            return DfuStatus::ErrUnknown;
        }

        self.writer.finish();

        let total = self.session.offset();
        let expected = self.session.crc();
        let actual = self.readback_crc(total);

        log::info!(
            "manifest: {} bytes, CRC 0x{:08X} (written) vs 0x{:08X} (read back)",
            total,
            expected,
            actual.unwrap_or(0)
        );
        let stats = self.writer.stats();
        log::info!(
            "{} sectors erased, {} blank, {} unchanged, {} recovered",
            stats.sectors_erased,
            stats.sectors_blank,
            stats.sectors_kept,
            stats.recoveries
        );

        self.end_session();

        if actual == Some(expected) {
            DfuStatus::Ok
        } else {
            DfuStatus::ErrVerify
        }
    }

    /// Handle one `DFU_UPLOAD` block
    ///
    /// Returns the number of bytes placed in `buf`. The block that reaches
    /// the end of the chip also ends the upload.
    pub fn upload(&mut self, block: u16, buf: &mut [u8]) -> Result<usize, DfuStatus> {
        if buf.len() % WORD_SIZE as usize != 0 {
            log::warn!("upload block {}: odd length {}", block, buf.len());
            return Err(DfuStatus::ErrAddress);
        }

        if self.state() != BridgeState::Uploading {
            if block != 0 {
                log::warn!("upload block {} without a transfer", block);
                return Err(DfuStatus::ErrUnknown);
            }
            let status = self.begin_upload();
            if !status.is_ok() {
                return Err(status);
            }
        }

        let len = self.session.clip(buf.len());
        let out = &mut buf[..len];
        if let Err(e) = self.flash.read_bytes(self.session.offset() / WORD_SIZE, out) {
            log::error!("upload block {} failed: {}", block, e);
            return Err(DfuStatus::ErrUnknown);
        }
        self.session.record(out);

        if self.session.remaining() == 0 {
            log::info!("upload finished at 0x{:06X}", self.session.offset());
            self.end_session();
        }
        Ok(len)
    }

    /// Handle `DFU_ABORT`: drop whatever transfer is in progress
    pub fn abort(&mut self) {
        match self.state() {
            BridgeState::Idle => {}
            state => {
                log::info!("{:?} aborted at 0x{:06X}", state, self.session.offset());
                self.end_session();
            }
        }
    }

    /// `bwPollTimeout` for the USB stack to advertise before `phase`
    pub fn poll_timeout_ms(&self, phase: DfuPhase) -> u32 {
        status::poll_timeout_ms(phase)
    }

    fn end_session(&mut self) {
        if self.state() == BridgeState::Downloading {
            self.writer.finish();
        }
        self.session.end();
        self.indicator.set_pattern(LedPattern::Waiting);
    }

    fn readback_crc(&mut self, total: u32) -> Option<u32> {
        let mut crc = Crc32::new();
        let mut window = [0u8; VERIFY_WINDOW_SIZE];
        let mut addr = 0u32;

        while addr < total {
            let len = core::cmp::min(total - addr, VERIFY_WINDOW_SIZE as u32) as usize;
            let buf = &mut window[..len];
            self.flash.read_bytes(addr / WORD_SIZE, buf).ok()?;
            crc.update(buf);
            addr += len as u32;
        }
        Some(crc.finalize())
    }
}
