//! Streaming sector-sliced image writer
//!
//! The coordinator accepts an image as a sequence of arbitrarily sized,
//! even-length chunks and decides per sector how to get the data into flash
//! with as few erase cycles as possible:
//!
//! - a sector that already reads blank is programmed directly
//! - a sector small enough for the side buffer is assumed to already hold
//!   the incoming data; each chunk is buffered and compared against flash,
//!   and on the first difference the sector is erased and the buffered
//!   prefix is programmed back
//! - any other sector is erased up front and programmed as data arrives
//!
//! Decisions are made lazily on the first chunk written into a sector.

use zerocopy::byteorder::little_endian::U16;
use zerocopy::FromBytes;

use super::FlashDevice;
use crate::bus::ParallelBus;
use crate::chip::{sector_at, ChipProfile, Sector};
use crate::config::{SIDE_BUFFER_WORDS, WORD_SIZE};
use crate::error::{Error, Result};

/// How the current sector is being written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorAction {
    /// The sector read blank; program without erasing
    AlreadyErased,
    /// The sector has been erased; program as data arrives
    EraseAndRewrite,
    /// Assume the sector already holds the data; verify chunk by chunk
    OptimisticSameCheck,
}

/// Statistics from a write transfer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Number of sectors erased
    pub sectors_erased: u32,
    /// Number of sectors found already blank
    pub sectors_blank: u32,
    /// Number of sectors whose contents already matched
    pub sectors_kept: u32,
    /// Number of same-check sectors that had to be erased after a mismatch
    pub recoveries: u32,
    /// Number of bytes handed to the program path
    pub bytes_programmed: u32,
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    sector: Sector,
    /// Bytes written into `sector`
    written: u32,
    action: Option<SectorAction>,
    image_offset: u32,
}

/// Turns a streamed image into sector erase/program operations
///
/// `N` is the side buffer capacity in words. Sectors of up to `N` words are
/// eligible for the same-data check; larger ones are always erased.
pub struct SectorWriteCoordinator<const N: usize = SIDE_BUFFER_WORDS> {
    cursor: Option<Cursor>,
    side: [U16; N],
    stats: WriteStats,
}

impl<const N: usize> Default for SectorWriteCoordinator<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SectorWriteCoordinator<N> {
    /// Create an idle coordinator
    pub const fn new() -> Self {
        Self {
            cursor: None,
            side: [U16::ZERO; N],
            stats: WriteStats {
                sectors_erased: 0,
                sectors_blank: 0,
                sectors_kept: 0,
                recoveries: 0,
                bytes_programmed: 0,
            },
        }
    }

    /// Whether a transfer is in progress
    pub fn is_active(&self) -> bool {
        self.cursor.is_some()
    }

    /// Statistics of the current (or last) transfer
    pub fn stats(&self) -> &WriteStats {
        &self.stats
    }

    /// Image bytes accepted so far in the current transfer
    pub fn position(&self) -> Option<u32> {
        self.cursor.map(|c| c.image_offset)
    }

    /// Begin a new transfer at image offset 0
    pub fn start(&mut self, profile: &ChipProfile) -> Result<()> {
        if self.cursor.is_some() {
            return Err(Error::TransferActive);
        }

        self.stats = WriteStats::default();
        self.cursor = Some(Cursor {
            sector: sector_at(profile, 0),
            written: 0,
            action: None,
            image_offset: 0,
        });
        log::debug!("write transfer started");
        Ok(())
    }

    /// Feed the next chunk of the image
    ///
    /// Data past the end of the chip is dropped. Returns `true` once the
    /// image has reached the chip capacity; no further data will be
    /// accepted after that.
    pub fn next<B: ParallelBus>(&mut self, flash: &mut FlashDevice<B>, bytes: &[u8]) -> Result<bool> {
        if bytes.len() % WORD_SIZE as usize != 0 {
            return Err(Error::InvalidAlignment);
        }

        let profile = *flash.profile();
        let capacity = profile.total_size;
        let Self {
            cursor,
            side,
            stats,
        } = self;
        let cursor = cursor.as_mut().ok_or(Error::NotStarted)?;

        let mut data = bytes;
        loop {
            let room_image = capacity - cursor.image_offset;
            if room_image == 0 {
                return Ok(true);
            }
            if data.is_empty() {
                return Ok(false);
            }

            let room_sector = cursor.sector.size - cursor.written;
            let mut len = core::cmp::min(data.len() as u32, room_sector);
            let reached = len >= room_image;
            if reached {
                len = room_image;
            }

            let (chunk, rest) = data.split_at(len as usize);
            let words = <[U16]>::ref_from_bytes(chunk).map_err(|_| Error::InvalidAlignment)?;

            let action = match cursor.action {
                Some(action) => action,
                None => {
                    let action = classify::<B, N>(flash, &cursor.sector, stats)?;
                    cursor.action = Some(action);
                    action
                }
            };

            let addr = (cursor.sector.start + cursor.written) / WORD_SIZE;
            match action {
                SectorAction::AlreadyErased | SectorAction::EraseAndRewrite => {
                    flash.program_words(addr, words)?;
                    stats.bytes_programmed += len;
                }
                SectorAction::OptimisticSameCheck => {
                    let offset = (cursor.written / WORD_SIZE) as usize;
                    let end = offset + words.len();
                    side[offset..end].copy_from_slice(words);

                    if let Some(i) = flash.first_mismatch(addr, words) {
                        log::warn!(
                            "sector {} differs at byte 0x{:06X}, erasing",
                            cursor.sector.index,
                            cursor.sector.start + cursor.written + i as u32 * WORD_SIZE
                        );
                        let start = cursor.sector.start / WORD_SIZE;
                        flash.erase_sector(start)?;
                        stats.sectors_erased += 1;
                        stats.recoveries += 1;
                        cursor.action = Some(SectorAction::EraseAndRewrite);

                        flash.program_words(start, &side[..end])?;
                        stats.bytes_programmed += end as u32 * WORD_SIZE;
                    }
                }
            }

            cursor.written += len;
            cursor.image_offset += len;

            if cursor.written == cursor.sector.size {
                if cursor.action == Some(SectorAction::OptimisticSameCheck) {
                    stats.sectors_kept += 1;
                }
                if !reached {
                    cursor.sector = sector_at(&profile, cursor.sector.end());
                    cursor.written = 0;
                    cursor.action = None;
                }
            }

            if reached {
                log::debug!("image reached chip capacity");
                return Ok(true);
            }
            data = rest;
        }
    }

    /// End the transfer; calling it with no transfer in progress is a no-op
    pub fn finish(&mut self) {
        if let Some(cursor) = self.cursor.take() {
            let partial = cursor.written > 0 && cursor.written < cursor.sector.size;
            if partial && cursor.action == Some(SectorAction::OptimisticSameCheck) {
                self.stats.sectors_kept += 1;
            }
            log::debug!(
                "write transfer finished at 0x{:06X}: {:?}",
                cursor.image_offset,
                self.stats
            );
        }
    }
}

/// Decide how to write a sector the first time data lands in it
fn classify<B: ParallelBus, const N: usize>(
    flash: &mut FlashDevice<B>,
    sector: &Sector,
    stats: &mut WriteStats,
) -> Result<SectorAction> {
    let start = sector.start / WORD_SIZE;
    let words = sector.size / WORD_SIZE;

    let action = if flash.is_blank(start, words) {
        stats.sectors_blank += 1;
        SectorAction::AlreadyErased
    } else if words as usize <= N {
        SectorAction::OptimisticSameCheck
    } else {
        flash.erase_sector(start)?;
        stats.sectors_erased += 1;
        SectorAction::EraseAndRewrite
    };

    log::debug!(
        "sector {} @ 0x{:06X} ({} KiB): {:?}",
        sector.index,
        sector.start,
        sector.size / 1024,
        action
    );
    Ok(action)
}
