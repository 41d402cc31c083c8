//! Clock and tick-rate configuration.
//!
//! Everything derived here is computed at compile time, so a change that
//! breaks one of the timing relationships fails the build instead of
//! producing a subtly wrong output frequency.

use crate::waveform::TABLE_LEN;

/// CPU frequency in Hz. If you change this, you must update the clock tree
/// setup in the firmware to match, or every rate below will be off.
pub const CPU_FREQ: u32 = 48_000_000;

/// Rate at which samples are sent to the DAC.
pub const TICK_FREQ: u32 = 32_000;

/// Frequency of one full pass through a table.
pub const FUNDAMENTAL_FREQ: u32 = TICK_FREQ / TABLE_LEN as u32;

/// CPU cycles between ticks. The tick timer runs off the CPU clock without
/// prescaling.
pub const CYCLES_PER_TICK: u32 = CPU_FREQ / TICK_FREQ;

/// Value for the timer auto-reload register. The timer wants the period N
/// set as ARR=N-1.
pub const TICK_RELOAD: u16 = (CYCLES_PER_TICK - 1) as u16;

/// Divider from the peripheral clock to the serial bus clock.
pub const SPI_CLOCK_DIVIDER: u32 = 4;

/// Bits clocked out per DAC frame: one 16-bit sample.
pub const BITS_PER_FRAME: u32 = 16;

/// Upper bound on everything in the tick handler other than shifting bits:
/// interrupt entry and exit, pin toggles, the table lookup, and the gaps
/// between bytes.
pub const HANDLER_OVERHEAD_CYCLES: u32 = 400;

/// Worst-case CPU cycles spent in one tick handler.
pub const HANDLER_CYCLES: u32 =
    BITS_PER_FRAME * SPI_CLOCK_DIVIDER + HANDLER_OVERHEAD_CYCLES;

/// High time of the reference clock output, in parts per thousand of a tick
/// period (30.25 us of 31.25 us).
pub const REFERENCE_DUTY_PERMILLE: u32 = 968;

/// Compare value producing `REFERENCE_DUTY_PERMILLE` on the tick timer.
pub const REFERENCE_COMPARE: u16 =
    (CYCLES_PER_TICK * REFERENCE_DUTY_PERMILLE / 1000) as u16;

const _: () = {
    assert!(CPU_FREQ % TICK_FREQ == 0, "tick rate must divide the CPU clock");
    assert!(CYCLES_PER_TICK - 1 <= u16::MAX as u32, "tick period overflows timer");
    assert!(TICK_FREQ % TABLE_LEN as u32 == 0);
    assert!(
        HANDLER_CYCLES < CYCLES_PER_TICK,
        "a DAC frame does not fit in one tick"
    );
    assert!(REFERENCE_DUTY_PERMILLE < 1000);
};
