//! Command-level model of an AMD-style parallel NOR chip

use std::path::Path;

use vkart_core::chip::{self, ChipProfile, Sector};
use vkart_core::config::{CHIP_SIZE, ERASED_WORD, STANDARD_SECTOR_SIZE};
use vkart_core::protocol::amd::cmd;

use crate::error::{EmuError, Result};

/// Configuration for the emulated chip
#[derive(Debug, Clone)]
pub struct EmuConfig {
    /// Manufacturer word returned in autoselect mode
    pub manufacturer: u16,
    /// Device word returned in autoselect mode
    pub device_id: u16,
    /// Chip size in bytes
    pub size: usize,
    /// Geometry and capabilities; `None` models an unknown part with
    /// uniform 64 KiB sectors and no double word program
    pub profile: Option<ChipProfile>,
    /// Status reads a word program stays busy for
    pub program_busy_reads: u32,
    /// Status reads a sector erase stays busy for
    pub erase_busy_reads: u32,
    /// Never leave the busy state once an operation started
    pub stuck_busy: bool,
}

impl EmuConfig {
    /// Configuration for a chip from the known chip table
    pub fn for_chip(device_id: u16) -> Result<Self> {
        let profile = *chip::find_by_device_id(device_id).ok_or(EmuError::UnknownChip(device_id))?;
        Ok(Self {
            manufacturer: profile.manufacturer,
            device_id,
            size: profile.total_size as usize,
            profile: Some(profile),
            ..Self::unknown(profile.manufacturer, device_id)
        })
    }

    /// Configuration for a part that is not in the known chip table
    pub fn unknown(manufacturer: u16, device_id: u16) -> Self {
        Self {
            manufacturer,
            device_id,
            size: CHIP_SIZE as usize,
            profile: None,
            program_busy_reads: 2,
            erase_busy_reads: 4,
            stuck_busy: false,
        }
    }

    /// Make the chip stay busy forever after the first program or erase
    pub fn stuck(mut self) -> Self {
        self.stuck_busy = true;
        self
    }

    fn supports_dual_word(&self) -> bool {
        self.profile.map(|p| p.supports_dual_word()).unwrap_or(false)
    }

    fn sector_at(&self, byte_addr: u32) -> Sector {
        match &self.profile {
            Some(profile) => chip::sector_at(profile, byte_addr),
            None => Sector {
                index: byte_addr / STANDARD_SECTOR_SIZE,
                start: byte_addr - byte_addr % STANDARD_SECTOR_SIZE,
                size: STANDARD_SECTOR_SIZE,
            },
        }
    }
}

/// An operation the chip carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmuOp {
    /// Sector erase
    Erase {
        /// Sector index
        index: u32,
        /// Sector start, in bytes
        start: u32,
        /// Sector size, in bytes
        size: u32,
    },
    /// Single word program
    Program {
        /// Word address
        addr: u32,
        /// Programmed word
        word: u16,
    },
    /// Double word program
    ProgramPair {
        /// Word address of the first word
        addr: u32,
        /// First word
        w0: u16,
        /// Second word
        w1: u16,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmdState {
    Read,
    Unlock1,
    Unlock2,
    Autoselect,
    Program,
    EraseSetup,
    EraseUnlock1,
    EraseUnlock2,
    PairSetup,
    PairFirst { addr: u32, word: u16 },
}

/// Emulated flash chip
///
/// Decodes command sequences from individual write cycles and answers read
/// cycles with array data, autoselect codes or toggle-bit status.
pub struct NorChip {
    config: EmuConfig,
    data: Vec<u16>,
    state: CmdState,
    busy_reads: Option<u32>,
    toggle: bool,
    ops: Vec<EmuOp>,
    faults: Vec<String>,
}

impl NorChip {
    /// Create an erased chip
    pub fn new(config: EmuConfig) -> Self {
        let data = vec![ERASED_WORD; config.size / 2];
        Self {
            config,
            data,
            state: CmdState::Read,
            busy_reads: None,
            toggle: false,
            ops: Vec::new(),
            faults: Vec::new(),
        }
    }

    /// Create a chip holding `image` at offset 0; the rest reads erased
    pub fn with_image(config: EmuConfig, image: &[u8]) -> Result<Self> {
        let mut chip = Self::new(config);
        chip.load(image)?;
        Ok(chip)
    }

    /// Create a chip from an image file
    pub fn from_file(config: EmuConfig, path: impl AsRef<Path>) -> Result<Self> {
        let image = std::fs::read(path)?;
        Self::with_image(config, &image)
    }

    /// Overwrite the array contents, bypassing the command interface
    pub fn load(&mut self, image: &[u8]) -> Result<()> {
        if image.len() > self.config.size {
            return Err(EmuError::ImageTooLarge {
                len: image.len(),
                size: self.config.size,
            });
        }
        if image.len() % 2 != 0 {
            return Err(EmuError::OddImageLength(image.len()));
        }
        for (word, bytes) in self.data.iter_mut().zip(image.chunks_exact(2)) {
            *word = u16::from_le_bytes([bytes[0], bytes[1]]);
        }
        Ok(())
    }

    /// Array contents as little-endian bytes
    pub fn image(&self) -> Vec<u8> {
        self.data.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    /// Write the array contents to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.image())?;
        Ok(())
    }

    /// Array contents as words
    pub fn words(&self) -> &[u16] {
        &self.data
    }

    /// Mutable array contents, bypassing the command interface
    pub fn words_mut(&mut self) -> &mut [u16] {
        &mut self.data
    }

    /// The configuration
    pub fn config(&self) -> &EmuConfig {
        &self.config
    }

    /// Every program and erase carried out so far
    pub fn ops(&self) -> &[EmuOp] {
        &self.ops
    }

    /// Forget recorded operations
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Number of sector erases carried out
    pub fn erase_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, EmuOp::Erase { .. }))
            .count()
    }

    /// Command sequences the chip could not make sense of
    pub fn faults(&self) -> &[String] {
        &self.faults
    }

    /// Whether an embedded algorithm is running
    pub fn is_busy(&self) -> bool {
        self.busy_reads.is_some()
    }

    /// Handle a write cycle latched at word address `addr`
    pub fn write(&mut self, addr: u32, word: u16) {
        if self.is_busy() {
            log::trace!("write 0x{:06X}/{:04X} ignored while busy", addr, word);
            return;
        }

        let addr = addr & self.addr_mask();
        let low = addr & 0x7FF;

        let state = self.state;
        self.state = match state {
            CmdState::Program => {
                self.program(addr, word);
                self.ops.push(EmuOp::Program { addr, word });
                self.start_busy(self.config.program_busy_reads);
                CmdState::Read
            }
            CmdState::PairSetup => CmdState::PairFirst { addr, word },
            CmdState::PairFirst { addr: first, word: w0 } => {
                if first % 2 != 0 || addr != first + 1 {
                    self.fault(format!(
                        "double program at 0x{:06X}/0x{:06X} is not an aligned pair",
                        first, addr
                    ));
                } else {
                    self.program(first, w0);
                    self.program(addr, word);
                    self.ops.push(EmuOp::ProgramPair {
                        addr: first,
                        w0,
                        w1: word,
                    });
                }
                CmdState::Read
            }
            _ if word == cmd::RESET => CmdState::Read,
            CmdState::Read | CmdState::Autoselect => {
                if low == cmd::UNLOCK1_ADDR && word == cmd::UNLOCK1 {
                    CmdState::Unlock1
                } else if low == cmd::UNLOCK1_ADDR && word == cmd::DOUBLE_PROGRAM {
                    if self.config.supports_dual_word() {
                        CmdState::PairSetup
                    } else {
                        self.fault("double program on a chip without it".into());
                        state
                    }
                } else {
                    state
                }
            }
            CmdState::Unlock1 if low == cmd::UNLOCK2_ADDR && word == cmd::UNLOCK2 => {
                CmdState::Unlock2
            }
            CmdState::Unlock2 if low == cmd::UNLOCK1_ADDR => match word {
                cmd::AUTOSELECT => CmdState::Autoselect,
                cmd::PROGRAM => CmdState::Program,
                cmd::ERASE_SETUP => CmdState::EraseSetup,
                _ => self.unexpected(addr, word),
            },
            CmdState::EraseSetup if low == cmd::UNLOCK1_ADDR && word == cmd::UNLOCK1 => {
                CmdState::EraseUnlock1
            }
            CmdState::EraseUnlock1 if low == cmd::UNLOCK2_ADDR && word == cmd::UNLOCK2 => {
                CmdState::EraseUnlock2
            }
            CmdState::EraseUnlock2 if word == cmd::SECTOR_ERASE => {
                self.erase(addr);
                self.start_busy(self.config.erase_busy_reads);
                CmdState::Read
            }
            _ => self.unexpected(addr, word),
        };
    }

    /// Handle a read cycle at word address `addr`
    pub fn read(&mut self, addr: u32) -> u16 {
        if let Some(remaining) = self.busy_reads {
            self.toggle = !self.toggle;
            if !self.config.stuck_busy {
                self.busy_reads = remaining.checked_sub(1).filter(|&n| n > 0);
            }
            return if self.toggle { cmd::DQ6_TOGGLE } else { 0 };
        }

        let addr = addr & self.addr_mask();
        match self.state {
            CmdState::Autoselect => match addr & 0xFF {
                cmd::ID_MANUFACTURER_ADDR => self.config.manufacturer,
                cmd::ID_DEVICE_ADDR => self.config.device_id,
                _ => 0,
            },
            _ => self.data[addr as usize],
        }
    }

    fn addr_mask(&self) -> u32 {
        (self.data.len() as u32).next_power_of_two() - 1
    }

    fn program(&mut self, addr: u32, word: u16) {
        // programming can only clear bits
        self.data[addr as usize] &= word;
    }

    fn erase(&mut self, word_addr: u32) {
        let sector = self.config.sector_at(word_addr * 2);
        let start = (sector.start / 2) as usize;
        let end = start + (sector.size / 2) as usize;
        self.data[start..end].fill(ERASED_WORD);
        self.ops.push(EmuOp::Erase {
            index: sector.index,
            start: sector.start,
            size: sector.size,
        });
        log::debug!(
            "emu: erased sector {} at 0x{:06X} ({} KiB)",
            sector.index,
            sector.start,
            sector.size / 1024
        );
    }

    fn start_busy(&mut self, reads: u32) {
        if reads > 0 || self.config.stuck_busy {
            self.busy_reads = Some(reads.max(1));
        }
    }

    fn unexpected(&mut self, addr: u32, word: u16) -> CmdState {
        self.fault(format!(
            "unexpected write 0x{:06X}/{:04X} in state {:?}",
            addr, word, self.state
        ));
        CmdState::Read
    }

    fn fault(&mut self, msg: String) {
        log::warn!("emu: {}", msg);
        self.faults.push(msg);
    }
}
