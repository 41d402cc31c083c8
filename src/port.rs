//! Named pin fields over the GPIO data, latch and direction registers.
//!
//! Each [`Field`] is a contiguous run of pins in one bank. Reads come from the
//! data (input) register, so they reflect the live pin level. Writes only ever
//! touch the bits of the field being written: the backing [`PortRegisters`]
//! implementation is handed a set mask and a clear mask instead of a whole
//! register value, so a write to chip-select can never disturb the debug pin
//! or the LED bus even if they share a register.

use core::ops::Range;

use crate::waveform::Selection;

/// A GPIO port.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Bank {
    A,
    B,
}

impl Bank {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// What a pin is used for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Direction {
    Input,
    /// Output driven from the latch register.
    Output,
    /// Output driven by an on-chip peripheral, routed through the given
    /// alternate function number.
    Alternate(u8),
}

/// A contiguous group of pins within one bank.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct Field {
    pub bank: Bank,
    pub lsb: u8,
    pub width: u8,
}

impl Field {
    /// Experiment selection code, PA0..PA3.
    pub const SELECTION: Field = Field::new(Bank::A, 0, 4);
    /// DAC chip-select, active low, PA4.
    pub const CHIP_SELECT: Field = Field::new(Bank::A, 4, 1);
    /// SPI1 SCK, PA5.
    pub const SCK: Field = Field::new(Bank::A, 5, 1);
    /// Reference clock output (TIM3_CH1), PA6.
    pub const CLOCK_OUTPUT: Field = Field::new(Bank::A, 6, 1);
    /// SPI1 MOSI, PA7.
    pub const SDO: Field = Field::new(Bank::A, 7, 1);
    /// DAC LDAC, PA8. Held low so the DAC latches on chip-select release.
    pub const LDAC: Field = Field::new(Bank::A, 8, 1);
    /// High for the duration of every tick handler, PB1.
    pub const DEBUG: Field = Field::new(Bank::B, 1, 1);
    /// Six LEDs, PB10..PB15.
    pub const LED_BUS: Field = Field::new(Bank::B, 10, 6);

    const fn new(bank: Bank, lsb: u8, width: u8) -> Self {
        Self { bank, lsb, width }
    }

    /// Bits this field occupies in its bank's registers.
    pub const fn mask(self) -> u16 {
        (((1u32 << self.width) - 1) << self.lsb) as u16
    }

    pub fn pins(self) -> Range<u8> {
        self.lsb..self.lsb + self.width
    }
}

/// Every field and how its pins are configured at boot.
pub const LAYOUT: [(Field, Direction); 8] = [
    (Field::SELECTION, Direction::Input),
    (Field::CHIP_SELECT, Direction::Output),
    (Field::SCK, Direction::Alternate(0)),
    (Field::CLOCK_OUTPUT, Direction::Alternate(1)),
    (Field::SDO, Direction::Alternate(0)),
    (Field::LDAC, Direction::Output),
    (Field::DEBUG, Direction::Output),
    (Field::LED_BUS, Direction::Output),
];

// Fields must fit their 16-pin bank and never share a pin.
const _: () = {
    let mut i = 0;
    while i < LAYOUT.len() {
        let a = LAYOUT[i].0;
        assert!(a.width > 0 && a.lsb as u32 + a.width as u32 <= 16);
        let mut j = i + 1;
        while j < LAYOUT.len() {
            let b = LAYOUT[j].0;
            assert!(
                a.bank as u8 != b.bank as u8 || a.mask() & b.mask() == 0,
                "port fields overlap"
            );
            j += 1;
        }
        i += 1;
    }
};

/// Raw access to the port registers.
pub trait PortRegisters {
    /// Current pin levels of `bank`.
    fn data(&self, bank: Bank) -> u16;

    /// Current output latch contents of `bank`.
    fn latch(&self, bank: Bank) -> u16;

    /// Sets the latch bits in `set` and clears the bits in `clear`. All other
    /// bits keep their value. `set` and `clear` never overlap.
    fn set_reset(&mut self, bank: Bank, set: u16, clear: u16);

    fn set_direction(&mut self, bank: Bank, pin: u8, direction: Direction);
}

/// Field-level view over a set of port registers.
pub struct PortView<R> {
    regs: R,
}

impl<R> PortView<R> {
    pub const fn new(regs: R) -> Self {
        Self { regs }
    }
}

impl<R: PortRegisters> PortView<R> {
    /// Applies [`LAYOUT`]. Outputs are not driven to any particular level
    /// here; the caller sets them up before or after as it needs.
    pub fn configure_directions(&mut self) {
        for (field, direction) in LAYOUT {
            for pin in field.pins() {
                self.regs.set_direction(field.bank, pin, direction);
            }
        }
    }

    /// Reads the live level of `field`, right-aligned.
    pub fn get(&self, field: Field) -> u16 {
        (self.regs.data(field.bank) & field.mask()) >> field.lsb
    }

    /// Reads back what was last written to `field`, right-aligned.
    pub fn latched(&self, field: Field) -> u16 {
        (self.regs.latch(field.bank) & field.mask()) >> field.lsb
    }

    /// Drives `field` to `value`. Bits of `value` beyond the field's width are
    /// ignored.
    pub fn set(&mut self, field: Field, value: u16) {
        let mask = field.mask();
        let set = (value << field.lsb) & mask;
        self.regs.set_reset(field.bank, set, mask & !set);
    }

    pub fn read_selection(&self) -> Selection {
        Selection::new(self.get(Field::SELECTION) as u8)
    }
}
