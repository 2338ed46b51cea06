//! Bus trait definitions

/// Direction of the bidirectional data bus, seen from the MCU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataDirection {
    /// MCU drives the data lines (command and program cycles)
    Output,
    /// Flash drives the data lines (read cycles)
    #[default]
    Input,
}

/// Trait for low-level parallel flash bus operations
///
/// This trait provides the minimal set of pin operations needed to bit-bang
/// a 16-bit parallel NOR flash. Implementations bind these to the MCU's GPIO
/// registers; they are expected to be plain register writes with no
/// sequencing of their own. Bus cycles are assembled by the helpers in
/// [`crate::bus::cycle`], which also take care of interrupt masking.
///
/// Addresses are word addresses (A0 of the chip is bit 0 of `addr`).
pub trait ParallelBus {
    /// Set chip enable (CE is active low, so `active=true` means CE=0)
    ///
    /// Write cycles are latched by the chip on the CE rising edge.
    fn set_chip_enable(&mut self, active: bool);

    /// Set the read/write strobe (`read=true` selects a read cycle)
    fn set_read(&mut self, read: bool);

    /// Switch the data bus between driven and high-impedance
    fn set_data_direction(&mut self, direction: DataDirection);

    /// Drive the address lines (also switches them to outputs)
    fn set_address(&mut self, addr: u32);

    /// Drive the data lines (only meaningful in `DataDirection::Output`)
    fn set_data(&mut self, word: u16);

    /// Sample the data lines (only meaningful in `DataDirection::Input`)
    fn get_data(&self) -> u16;

    /// Short fixed delay letting address/data lines settle between strobes
    fn settle_delay(&self);

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);

    /// Delay for the specified number of milliseconds
    ///
    /// Default implementation calls `delay_us` once per millisecond.
    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1_000);
        }
    }
}

impl<B: ParallelBus + ?Sized> ParallelBus for &mut B {
    fn set_chip_enable(&mut self, active: bool) {
        (**self).set_chip_enable(active)
    }

    fn set_read(&mut self, read: bool) {
        (**self).set_read(read)
    }

    fn set_data_direction(&mut self, direction: DataDirection) {
        (**self).set_data_direction(direction)
    }

    fn set_address(&mut self, addr: u32) {
        (**self).set_address(addr)
    }

    fn set_data(&mut self, word: u16) {
        (**self).set_data(word)
    }

    fn get_data(&self) -> u16 {
        (**self).get_data()
    }

    fn settle_delay(&self) {
        (**self).settle_delay()
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}
