//! Serial link to the DAC.
//!
//! The DAC takes one 16-bit word per chip-select frame, most significant byte
//! first. The bus itself moves 8 bits at a time, so a sample goes out as two
//! back-to-back byte transfers. Framing (chip-select) is the caller's job;
//! see `scheduler`.

/// Clock level while the bus is idle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Polarity {
    IdleLow,
    IdleHigh,
}

/// Which clock edge the receiver samples data on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    CaptureOnFirstTransition,
    CaptureOnSecondTransition,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BitOrder {
    MsbFirst,
    LsbFirst,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BusMode {
    pub polarity: Polarity,
    pub phase: Phase,
    pub bit_order: BitOrder,
}

/// SPI mode 0, MSB first, which is what the DAC expects.
pub const DAC_BUS_MODE: BusMode = BusMode {
    polarity: Polarity::IdleLow,
    phase: Phase::CaptureOnFirstTransition,
    bit_order: BitOrder::MsbFirst,
};

/// A synchronous serial bus we are the controller of.
pub trait Transmit {
    /// Shifts `byte` out and returns once it has completely left the bus.
    ///
    /// Implementations may busy-wait for the bus to become ready. That wait
    /// must be bounded by a handful of bus clocks, since this is called from
    /// the tick handler.
    fn transmit_byte(&mut self, byte: u8);
}

/// Sends a 16-bit sample as its high byte followed by its low byte.
pub fn transmit_sample<T: Transmit + ?Sized>(bus: &mut T, sample: u16) {
    let [high, low] = sample.to_be_bytes();
    bus.transmit_byte(high);
    bus.transmit_byte(low);
}
