//! AMD/JEDEC parallel NOR command sequences
//!
//! All addresses are word addresses. Commands are issued as plain bus write
//! cycles; completion of embedded program/erase algorithms is detected with
//! the DQ6 toggle bit, read from word address 0.

use crate::bus::cycle::{read_word, write_word};
use crate::bus::ParallelBus;
use crate::config::{
    ERASE_POLL_INTERVAL_US, ERASE_SETTLE_MS, ERASE_TIMEOUT_US, PROGRAM_PAIR_SETTLE_US,
    PROGRAM_TIMEOUT_POLLS,
};
use crate::error::{Error, Result};

/// Command words and unlock addresses
pub mod cmd {
    /// First unlock cycle address
    pub const UNLOCK1_ADDR: u32 = 0x555;
    /// Second unlock cycle address
    pub const UNLOCK2_ADDR: u32 = 0x2AA;
    /// First unlock cycle data
    pub const UNLOCK1: u16 = 0xAA;
    /// Second unlock cycle data
    pub const UNLOCK2: u16 = 0x55;

    /// Return to read array mode
    pub const RESET: u16 = 0xF0;
    /// Enter autoselect (manufacturer/device id) mode
    pub const AUTOSELECT: u16 = 0x90;
    /// Word program setup
    pub const PROGRAM: u16 = 0xA0;
    /// Double word program (no unlock cycles)
    pub const DOUBLE_PROGRAM: u16 = 0x50;
    /// Erase setup
    pub const ERASE_SETUP: u16 = 0x80;
    /// Sector erase confirm
    pub const SECTOR_ERASE: u16 = 0x30;

    /// Toggle bit, alternates on every read while an algorithm runs
    pub const DQ6_TOGGLE: u16 = 0x40;
    /// Set when an embedded algorithm exceeded its internal time limit
    pub const DQ5_TIME_LIMIT: u16 = 0x20;

    /// Autoselect word address of the manufacturer code
    pub const ID_MANUFACTURER_ADDR: u32 = 0x000;
    /// Autoselect word address of the device code
    pub const ID_DEVICE_ADDR: u32 = 0x001;
}

/// Word address whose reads carry the status bits during an operation
const STATUS_ADDR: u32 = 0;

/// Result of one toggle-bit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleStatus {
    /// DQ6 stopped toggling; the chip is back in read array mode
    Ready,
    /// DQ6 still toggling, DQ5 clear
    Busy,
    /// DQ5 set and DQ6 still toggling; the operation failed
    Failed,
}

/// Return the chip to read array mode
pub fn reset<B: ParallelBus + ?Sized>(bus: &mut B) {
    write_word(bus, 0, cmd::RESET);
}

fn unlock<B: ParallelBus + ?Sized>(bus: &mut B) {
    write_word(bus, cmd::UNLOCK1_ADDR, cmd::UNLOCK1);
    write_word(bus, cmd::UNLOCK2_ADDR, cmd::UNLOCK2);
}

/// Read the manufacturer and device words in autoselect mode
///
/// Leaves the chip in read array mode.
pub fn read_id<B: ParallelBus + ?Sized>(bus: &mut B) -> (u16, u16) {
    reset(bus);
    unlock(bus);
    write_word(bus, cmd::UNLOCK1_ADDR, cmd::AUTOSELECT);
    let manufacturer = read_word(bus, cmd::ID_MANUFACTURER_ADDR);
    let device = read_word(bus, cmd::ID_DEVICE_ADDR);
    reset(bus);
    (manufacturer, device)
}

/// Check the toggle bit once
///
/// Follows the AMD toggle-bit algorithm: two status reads that agree on DQ6
/// mean the operation is done. If they differ and DQ5 is set, the status is
/// read twice more, since DQ6 may have stopped toggling at the same time DQ5
/// went high.
pub fn toggle_status<B: ParallelBus + ?Sized>(bus: &mut B) -> ToggleStatus {
    let first = read_word(bus, STATUS_ADDR);
    let second = read_word(bus, STATUS_ADDR);
    if (first ^ second) & cmd::DQ6_TOGGLE == 0 {
        return ToggleStatus::Ready;
    }
    if second & cmd::DQ5_TIME_LIMIT == 0 {
        return ToggleStatus::Busy;
    }

    let first = read_word(bus, STATUS_ADDR);
    let second = read_word(bus, STATUS_ADDR);
    if (first ^ second) & cmd::DQ6_TOGGLE == 0 {
        ToggleStatus::Ready
    } else {
        ToggleStatus::Failed
    }
}

/// Wait for an embedded algorithm to finish
///
/// Polls the toggle bit every `poll_delay_us` microseconds until the chip is
/// ready or `timeout_us` is exceeded. With a zero poll delay the status is
/// polled back to back and `timeout_us` is used as the poll count.
/// `addr` only identifies the operation in the returned error.
pub fn wait_toggle_ready<B: ParallelBus + ?Sized>(
    bus: &mut B,
    addr: u32,
    poll_delay_us: u32,
    timeout_us: u32,
) -> Result<()> {
    let max_polls = if poll_delay_us > 0 {
        timeout_us / poll_delay_us
    } else {
        timeout_us
    };

    for _ in 0..max_polls {
        match toggle_status(bus) {
            ToggleStatus::Ready => return Ok(()),
            ToggleStatus::Failed => {
                log::warn!("flash reported DQ5 failure at word 0x{:06X}", addr);
                return Err(Error::BusTimeout { addr });
            }
            ToggleStatus::Busy => {}
        }
        if poll_delay_us > 0 {
            bus.delay_us(poll_delay_us);
        }
    }

    log::warn!("flash busy timeout at word 0x{:06X}", addr);
    Err(Error::BusTimeout { addr })
}

/// Program one word and wait for completion
pub fn program_word<B: ParallelBus + ?Sized>(bus: &mut B, addr: u32, word: u16) -> Result<()> {
    unlock(bus);
    write_word(bus, cmd::UNLOCK1_ADDR, cmd::PROGRAM);
    write_word(bus, addr, word);

    wait_toggle_ready(bus, addr, 0, PROGRAM_TIMEOUT_POLLS).inspect_err(|_| reset(bus))
}

/// Program two consecutive words with the double word program command
///
/// `addr` must be even. There is no status polling; the chip is given a
/// fixed settle time instead.
pub fn program_word_pair<B: ParallelBus + ?Sized>(bus: &mut B, addr: u32, w0: u16, w1: u16) {
    write_word(bus, cmd::UNLOCK1_ADDR, cmd::DOUBLE_PROGRAM);
    write_word(bus, addr, w0);
    write_word(bus, addr + 1, w1);
    bus.delay_us(PROGRAM_PAIR_SETTLE_US);
}

/// Erase the sector containing word address `addr`
///
/// The chip gets a fixed settle time before the toggle bit is checked, and
/// is returned to read array mode whether or not the erase completed.
pub fn erase_sector<B: ParallelBus + ?Sized>(bus: &mut B, addr: u32) -> Result<()> {
    reset(bus);
    unlock(bus);
    write_word(bus, cmd::UNLOCK1_ADDR, cmd::ERASE_SETUP);
    unlock(bus);
    write_word(bus, addr, cmd::SECTOR_ERASE);

    bus.delay_ms(ERASE_SETTLE_MS);
    let result = wait_toggle_ready(bus, addr, ERASE_POLL_INTERVAL_US, ERASE_TIMEOUT_US);
    reset(bus);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::cycle::tests::RecordingBus;

    #[test]
    fn test_read_id_sequence() {
        let mut bus = RecordingBus {
            read_value: 0x22CB,
            ..Default::default()
        };
        let (manufacturer, device) = read_id(&mut bus);

        assert_eq!((manufacturer, device), (0x22CB, 0x22CB));
        assert_eq!(
            bus.writes(),
            [(0x000, 0xF0), (0x555, 0xAA), (0x2AA, 0x55), (0x555, 0x90), (0x000, 0xF0)]
        );
    }

    #[test]
    fn test_program_word_sequence() {
        let mut bus = RecordingBus::default();
        program_word(&mut bus, 0x1234, 0xBEEF).unwrap();

        assert_eq!(
            bus.writes(),
            [(0x555, 0xAA), (0x2AA, 0x55), (0x555, 0xA0), (0x1234, 0xBEEF)]
        );
        // one toggle check: two status reads
        assert_eq!(bus.reads.get(), 2);
    }

    #[test]
    fn test_program_word_pair_sequence() {
        let mut bus = RecordingBus::default();
        program_word_pair(&mut bus, 0x100, 0x1111, 0x2222);

        assert_eq!(bus.writes(), [(0x555, 0x50), (0x100, 0x1111), (0x101, 0x2222)]);
        assert_eq!(bus.reads.get(), 0);
        assert_eq!(bus.delay_us_total, PROGRAM_PAIR_SETTLE_US as u64);
    }

    #[test]
    fn test_erase_sector_sequence() {
        let mut bus = RecordingBus::default();
        erase_sector(&mut bus, 0x8000).unwrap();

        assert_eq!(
            bus.writes(),
            [
                (0x000, 0xF0),
                (0x555, 0xAA),
                (0x2AA, 0x55),
                (0x555, 0x80),
                (0x555, 0xAA),
                (0x2AA, 0x55),
                (0x8000, 0x30),
                (0x000, 0xF0),
            ]
        );
        assert_eq!(bus.delay_us_total, ERASE_SETTLE_MS as u64 * 1_000);
    }

    #[test]
    fn test_stuck_toggle_times_out() {
        let mut bus = RecordingBus {
            toggle: true,
            ..Default::default()
        };
        assert_eq!(
            program_word(&mut bus, 0x42, 0x0000),
            Err(Error::BusTimeout { addr: 0x42 })
        );
        assert_eq!(bus.reads.get(), 2 * PROGRAM_TIMEOUT_POLLS);
        // chip is reset after the failure
        assert_eq!(bus.writes().last(), Some(&(0x000, 0xF0)));
    }

    #[test]
    fn test_dq5_failure() {
        let mut bus = RecordingBus {
            toggle: true,
            read_value: cmd::DQ5_TIME_LIMIT,
            ..Default::default()
        };
        assert_eq!(toggle_status(&mut bus), ToggleStatus::Failed);
        assert_eq!(bus.reads.get(), 4);
    }

    #[test]
    fn test_erase_poll_bound() {
        let mut bus = RecordingBus {
            toggle: true,
            ..Default::default()
        };
        assert_eq!(
            erase_sector(&mut bus, 0x10),
            Err(Error::BusTimeout { addr: 0x10 })
        );
        let polls = (ERASE_TIMEOUT_US / ERASE_POLL_INTERVAL_US) as u64;
        assert_eq!(
            bus.delay_us_total,
            ERASE_SETTLE_MS as u64 * 1_000 + polls * ERASE_POLL_INTERVAL_US as u64
        );
    }
}
