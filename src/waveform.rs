//! Precomputed waveform tables and the selection codes that pick them.
//!
//! The tables are generated by `build.rs`; nothing here synthesizes samples
//! at runtime.

mod generated {
    include!(concat!(env!("OUT_DIR"), "/waveforms.rs"));
}
pub use generated::{MIDSCALE, TABLE_LEN};

/// Largest code the DAC accepts.
pub const DAC_MAX: u16 = 0x1fff;

/// A 4-bit experiment selection code, as read from the selection pins.
///
/// Any 4-bit value is a valid input; only three of them name a waveform.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct Selection(u8);

impl Selection {
    /// Wraps a raw pin reading. Bits above the low four are discarded.
    pub const fn new(raw: u8) -> Self {
        Self(raw & 0xf)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// The waveform this code selects, or `None` for the codes that produce
    /// a silent frame.
    pub const fn waveform(self) -> Option<Waveform> {
        match self.0 {
            0b0000 => Some(Waveform::Sine1k),
            0b0001 => Some(Waveform::Sine2k),
            0b0010 => Some(Waveform::Sine1k2k),
            _ => None,
        }
    }
}

/// The selectable output signals.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Waveform {
    /// One cycle per table, 1 kHz at the reference tick rate.
    Sine1k,
    /// Two cycles per table, 2 kHz.
    Sine2k,
    /// Sum of the two above, scaled back into the same code range.
    Sine1k2k,
}

impl Waveform {
    pub const ALL: [Waveform; 3] =
        [Waveform::Sine1k, Waveform::Sine2k, Waveform::Sine1k2k];

    pub fn table(self) -> &'static [u16; TABLE_LEN] {
        match self {
            Waveform::Sine1k => &generated::SINE_1KHZ,
            Waveform::Sine2k => &generated::SINE_2KHZ,
            Waveform::Sine1k2k => &generated::SINE_1KHZ_2KHZ,
        }
    }

    /// The code this waveform is selected by.
    pub const fn selection(self) -> Selection {
        match self {
            Waveform::Sine1k => Selection(0b0000),
            Waveform::Sine2k => Selection(0b0001),
            Waveform::Sine1k2k => Selection(0b0010),
        }
    }

    /// Sample at `index`. The index type only holds in-range values, so this
    /// never fails.
    pub fn sample(self, index: PlaybackIndex) -> u16 {
        self.table()[index.get()]
    }
}

/// Position within a waveform period, always in `0..TABLE_LEN`.
///
/// There is exactly one of these in the running firmware, and it is shared by
/// all tables: switching waveform mid-period continues at the same position
/// in the new table rather than restarting it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct PlaybackIndex(u8);

impl PlaybackIndex {
    pub const fn new() -> Self {
        Self(0)
    }

    pub const fn get(self) -> usize {
        self.0 as usize
    }

    /// Steps to the next sample, wrapping after the last one.
    pub fn advance(&mut self) {
        self.0 = ((self.get() + 1) % TABLE_LEN) as u8;
    }
}

// `PlaybackIndex` stores the position in a byte.
const _: () = assert!(TABLE_LEN > 0 && TABLE_LEN <= 256);
