//! Pin-level bus model
//!
//! Tracks the control, address and data lines driven by the MCU and hands
//! complete cycles to the [`NorChip`]: a write is latched on the CE rising
//! edge, a read is sampled when CE is asserted with the strobe in read mode.

use vkart_core::bus::{DataDirection, ParallelBus};

use crate::chip::NorChip;

/// Parallel bus with an emulated flash chip attached
pub struct EmuBus {
    chip: NorChip,
    ce: bool,
    read: bool,
    direction: DataDirection,
    address: u32,
    data_out: u16,
    data_in: u16,
    elapsed_us: u64,
    cycles: u64,
}

impl EmuBus {
    /// Attach a chip to a fresh bus
    pub fn new(chip: NorChip) -> Self {
        Self {
            chip,
            ce: false,
            read: true,
            direction: DataDirection::Input,
            address: 0,
            data_out: 0,
            data_in: 0xFFFF,
            elapsed_us: 0,
            cycles: 0,
        }
    }

    /// The attached chip
    pub fn chip(&self) -> &NorChip {
        &self.chip
    }

    /// The attached chip, mutably
    pub fn chip_mut(&mut self) -> &mut NorChip {
        &mut self.chip
    }

    /// Detach the chip
    pub fn into_chip(self) -> NorChip {
        self.chip
    }

    /// Total time spent in `delay_us`/`delay_ms`
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    /// Number of complete bus cycles seen
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

impl ParallelBus for EmuBus {
    fn set_chip_enable(&mut self, active: bool) {
        if active == self.ce {
            return;
        }
        self.ce = active;

        if active {
            if self.read {
                self.data_in = self.chip.read(self.address);
                self.cycles += 1;
            }
        } else if !self.read {
            if self.direction == DataDirection::Output {
                self.chip.write(self.address, self.data_out);
                self.cycles += 1;
            } else {
                log::warn!("emu: write strobe with data bus not driven");
            }
        }
    }

    fn set_read(&mut self, read: bool) {
        self.read = read;
    }

    fn set_data_direction(&mut self, direction: DataDirection) {
        self.direction = direction;
    }

    fn set_address(&mut self, addr: u32) {
        self.address = addr;
    }

    fn set_data(&mut self, word: u16) {
        self.data_out = word;
    }

    fn get_data(&self) -> u16 {
        match self.direction {
            DataDirection::Input => self.data_in,
            // bus contention: the MCU reads back its own drive
            DataDirection::Output => self.data_out,
        }
    }

    fn settle_delay(&self) {}

    fn delay_us(&mut self, us: u32) {
        self.elapsed_us += us as u64;
    }
}
