//! Single-word bus cycles
//!
//! Each helper drives one complete transaction on the parallel bus. The pin
//! sequence is timing sensitive, so the whole cycle runs inside a critical
//! section; the section is scoped to the closure and released on return.

use super::{DataDirection, ParallelBus};

/// Write one word to the chip at word address `addr`
///
/// The chip latches address and data on the rising edge of CE.
pub fn write_word<B: ParallelBus + ?Sized>(bus: &mut B, addr: u32, word: u16) {
    critical_section::with(|_| {
        bus.set_chip_enable(false);
        bus.set_read(false);
        bus.set_data_direction(DataDirection::Output);
        bus.set_address(addr);
        bus.settle_delay();
        bus.set_chip_enable(true);
        bus.set_data(word);
        bus.settle_delay();
        bus.set_chip_enable(false);
    })
}

/// Read one word from the chip at word address `addr`
pub fn read_word<B: ParallelBus + ?Sized>(bus: &mut B, addr: u32) -> u16 {
    critical_section::with(|_| {
        bus.set_chip_enable(false);
        bus.set_read(true);
        bus.set_data_direction(DataDirection::Input);
        bus.set_address(addr);
        bus.settle_delay();
        bus.set_chip_enable(true);
        bus.settle_delay();
        let word = bus.get_data();
        bus.set_chip_enable(false);
        word
    })
}

/// Read consecutive words starting at word address `addr`
pub fn read_words<B: ParallelBus + ?Sized>(bus: &mut B, addr: u32, buf: &mut [u16]) {
    for (i, word) in buf.iter_mut().enumerate() {
        *word = read_word(bus, addr + i as u32);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use core::cell::Cell;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) enum Pin {
        Ce(bool),
        Read(bool),
        Dir(DataDirection),
        Addr(u32),
        Data(u16),
    }

    /// Bus that records pin activity and returns a fixed read value
    ///
    /// With `toggle` set, every other read flips DQ6 to model a chip that
    /// never leaves its busy state.
    #[derive(Default)]
    pub(crate) struct RecordingBus {
        pub log: Vec<Pin>,
        pub read_value: u16,
        pub toggle: bool,
        pub reads: Cell<u32>,
        pub delay_us_total: u64,
    }

    impl RecordingBus {
        /// (address, data) pairs of every write cycle, in order
        pub fn writes(&self) -> Vec<(u32, u16)> {
            let mut addr = 0;
            let mut out = Vec::new();
            for pin in &self.log {
                match *pin {
                    Pin::Addr(a) => addr = a,
                    Pin::Data(d) => out.push((addr, d)),
                    _ => {}
                }
            }
            out
        }
    }

    impl ParallelBus for RecordingBus {
        fn set_chip_enable(&mut self, active: bool) {
            self.log.push(Pin::Ce(active));
        }

        fn set_read(&mut self, read: bool) {
            self.log.push(Pin::Read(read));
        }

        fn set_data_direction(&mut self, direction: DataDirection) {
            self.log.push(Pin::Dir(direction));
        }

        fn set_address(&mut self, addr: u32) {
            self.log.push(Pin::Addr(addr));
        }

        fn set_data(&mut self, word: u16) {
            self.log.push(Pin::Data(word));
        }

        fn get_data(&self) -> u16 {
            let n = self.reads.get();
            self.reads.set(n + 1);
            if self.toggle && n % 2 == 1 {
                self.read_value ^ 0x40
            } else {
                self.read_value
            }
        }

        fn settle_delay(&self) {}

        fn delay_us(&mut self, us: u32) {
            self.delay_us_total += us as u64;
        }
    }

    #[test]
    fn test_write_cycle_order() {
        let mut bus = RecordingBus::default();
        write_word(&mut bus, 0x555, 0xAA);

        assert_eq!(
            bus.log,
            [
                Pin::Ce(false),
                Pin::Read(false),
                Pin::Dir(DataDirection::Output),
                Pin::Addr(0x555),
                Pin::Ce(true),
                Pin::Data(0xAA),
                Pin::Ce(false),
            ]
        );
    }

    #[test]
    fn test_read_cycle_returns_bus_data() {
        let mut bus = RecordingBus {
            read_value: 0x00C2,
            ..Default::default()
        };
        assert_eq!(read_word(&mut bus, 0), 0x00C2);
        assert_eq!(bus.log[2], Pin::Dir(DataDirection::Input));
        assert_eq!(bus.log.last(), Some(&Pin::Ce(false)));
    }

    #[test]
    fn test_read_words_walks_addresses() {
        let mut bus = RecordingBus::default();
        let mut buf = [0u16; 3];
        read_words(&mut bus, 0x10, &mut buf);

        let addrs: Vec<u32> = bus
            .log
            .iter()
            .filter_map(|p| match p {
                Pin::Addr(a) => Some(*a),
                _ => None,
            })
            .collect();
        assert_eq!(addrs, [0x10, 0x11, 0x12]);
    }

    #[test]
    fn test_default_delay_ms() {
        let mut bus = RecordingBus::default();
        bus.delay_ms(3);
        assert_eq!(bus.delay_us_total, 3_000);
    }
}
