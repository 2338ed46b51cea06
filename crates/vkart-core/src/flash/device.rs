//! Identified flash device
//!
//! All addresses in this module are word addresses.

use zerocopy::byteorder::little_endian::U16;
use zerocopy::FromBytes;

use crate::bus::cycle;
use crate::bus::ParallelBus;
use crate::chip::{self, ChipProfile};
use crate::config::{ERASED_WORD, IDENTIFY_SETTLE_MS, SCAN_WINDOW_WORDS};
use crate::error::{Error, Result};
use crate::protocol::amd;

/// A parallel NOR flash chip whose identity is known
///
/// Normally built with [`FlashDevice::open`], which probes the chip and
/// picks its profile from the known chip table. The profile never changes
/// afterwards.
pub struct FlashDevice<B> {
    bus: B,
    profile: ChipProfile,
}

impl<B: ParallelBus> FlashDevice<B> {
    /// Read the chip identifiers and look them up in the known chip table
    pub fn identify(bus: &mut B) -> Result<ChipProfile> {
        let (manufacturer, device) = amd::read_id(bus);
        bus.delay_ms(IDENTIFY_SETTLE_MS);

        log::info!(
            "flash id: manufacturer 0x{:04X}, device 0x{:04X}",
            manufacturer,
            device
        );

        let profile = chip::find_by_device_id(device).ok_or(Error::ChipNotSupported {
            manufacturer,
            device,
        })?;

        log::info!(
            "found {} {} ({}, {} KiB{})",
            profile.vendor,
            profile.name,
            profile.layout,
            profile.total_size / 1024,
            if profile.supports_dual_word() {
                ", dual-word program"
            } else {
                ""
            }
        );
        Ok(*profile)
    }

    /// Identify the chip and take ownership of the bus
    pub fn open(mut bus: B) -> Result<Self> {
        let profile = Self::identify(&mut bus)?;
        Ok(Self { bus, profile })
    }

    /// Wrap a bus whose chip is already known, skipping identification
    ///
    /// For parts whose autoselect codes cannot be read reliably, or for a
    /// chip model that differs from the table (such as a smaller emulated
    /// part).
    pub fn with_profile(bus: B, profile: ChipProfile) -> Self {
        Self { bus, profile }
    }

    /// Profile of the identified chip
    pub fn profile(&self) -> &ChipProfile {
        &self.profile
    }

    /// Get mutable access to the underlying bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Give the bus back
    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Read consecutive words starting at `addr`
    pub fn read_words(&mut self, addr: u32, buf: &mut [u16]) {
        cycle::read_words(&mut self.bus, addr, buf);
    }

    /// Read into a byte buffer, storing words little-endian
    ///
    /// `buf` must have an even length.
    pub fn read_bytes(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        let words = <[U16]>::mut_from_bytes(buf).map_err(|_| Error::InvalidAlignment)?;
        for (i, word) in words.iter_mut().enumerate() {
            *word = U16::new(cycle::read_word(&mut self.bus, addr + i as u32));
        }
        Ok(())
    }

    /// Program a single word
    pub fn program_word(&mut self, addr: u32, word: u16) -> Result<()> {
        amd::program_word(&mut self.bus, addr, word)
    }

    /// Program two consecutive words with the double word program command
    pub fn program_word_pair(&mut self, addr: u32, w0: u16, w1: u16) -> Result<()> {
        if !self.profile.supports_dual_word() {
            return Err(Error::DualWordUnsupported);
        }
        if addr % 2 != 0 {
            return Err(Error::InvalidAlignment);
        }
        amd::program_word_pair(&mut self.bus, addr, w0, w1);
        Ok(())
    }

    /// Program a run of words starting at `addr`
    ///
    /// Uses double word programming when the chip supports it, falling back
    /// to single words at an odd start or end. Words (or pairs) equal to
    /// the erased value are skipped.
    pub fn program_words(&mut self, addr: u32, words: &[U16]) -> Result<()> {
        if !self.profile.supports_dual_word() {
            for (i, word) in words.iter().enumerate() {
                let word = word.get();
                if word != ERASED_WORD {
                    self.program_word(addr + i as u32, word)?;
                }
            }
            return Ok(());
        }

        let mut i = 0usize;
        if addr % 2 != 0 {
            if let Some(word) = words.first() {
                if word.get() != ERASED_WORD {
                    self.program_word(addr, word.get())?;
                }
                i = 1;
            }
        }

        while i + 1 < words.len() {
            let (w0, w1) = (words[i].get(), words[i + 1].get());
            if w0 != ERASED_WORD || w1 != ERASED_WORD {
                self.program_word_pair(addr + i as u32, w0, w1)?;
            }
            i += 2;
        }

        if let Some(word) = words.get(i) {
            if word.get() != ERASED_WORD {
                self.program_word(addr + i as u32, word.get())?;
            }
        }
        Ok(())
    }

    /// Erase the sector containing `addr`
    pub fn erase_sector(&mut self, addr: u32) -> Result<()> {
        log::debug!("erasing sector at word 0x{:06X}", addr);
        amd::erase_sector(&mut self.bus, addr)
    }

    /// Check whether `len` words starting at `addr` all read as erased
    pub fn is_blank(&mut self, addr: u32, len: u32) -> bool {
        let mut window = [0u16; SCAN_WINDOW_WORDS];
        let mut offset = 0u32;

        while offset < len {
            let chunk = core::cmp::min(len - offset, SCAN_WINDOW_WORDS as u32);
            let buf = &mut window[..chunk as usize];
            self.read_words(addr + offset, buf);
            if buf.iter().any(|&w| w != ERASED_WORD) {
                return false;
            }
            offset += chunk;
        }
        true
    }

    /// Compare flash contents at `addr` against `expected`
    ///
    /// Returns the index of the first differing word, if any.
    pub fn first_mismatch(&mut self, addr: u32, expected: &[U16]) -> Option<usize> {
        let mut window = [0u16; SCAN_WINDOW_WORDS];

        for (n, chunk) in expected.chunks(SCAN_WINDOW_WORDS).enumerate() {
            let base = n * SCAN_WINDOW_WORDS;
            let buf = &mut window[..chunk.len()];
            self.read_words(addr + base as u32, buf);
            if let Some(i) = buf.iter().zip(chunk).position(|(a, b)| *a != b.get()) {
                return Some(base + i);
            }
        }
        None
    }
}
