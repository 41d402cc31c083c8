//! SPI1 as the DAC bus.

use core::{ptr, sync::atomic::Ordering};

use stm32_metapac::{
    self as pac,
    spi::vals::{Br, Cpha, Cpol, Ds, Frxth, Lsbfirst, Mstr},
};

use lutdac::{
    timing::SPI_CLOCK_DIVIDER,
    transmit::{BitOrder, BusMode, Phase, Polarity, Transmit},
};

// `configure` hardcodes the baud divider the timing budget was checked with.
const _: () = assert!(SPI_CLOCK_DIVIDER == 4);

pub struct Spi1(());

impl Spi1 {
    /// # Safety
    ///
    /// At most one `Spi1` may be in use at any moment, and `configure` must
    /// have run before it is used.
    pub const unsafe fn steal() -> Self {
        Self(())
    }
}

pub fn configure(mode: BusMode) {
    pac::RCC.apb2enr().modify(|w| w.set_spi1en(true));
    core::sync::atomic::compiler_fence(Ordering::SeqCst);

    let spi = pac::SPI1;

    spi.cr2().write(|w| {
        w.set_ds(Ds::BITS8);
        // Raise RXNE after a single byte rather than waiting for two.
        w.set_frxth(Frxth::QUARTER);
    });
    spi.cr1().write(|w| {
        w.set_mstr(Mstr::MASTER);
        w.set_br(Br::DIV4);
        w.set_cpol(match mode.polarity {
            Polarity::IdleLow => Cpol::IDLE_LOW,
            Polarity::IdleHigh => Cpol::IDLE_HIGH,
        });
        w.set_cpha(match mode.phase {
            Phase::CaptureOnFirstTransition => Cpha::FIRST_EDGE,
            Phase::CaptureOnSecondTransition => Cpha::SECOND_EDGE,
        });
        w.set_lsbfirst(match mode.bit_order {
            BitOrder::MsbFirst => Lsbfirst::MSBFIRST,
            BitOrder::LsbFirst => Lsbfirst::LSBFIRST,
        });
        // Chip-select is a plain GPIO driven by the scheduler, so keep the
        // peripheral's own NSS logic permanently happy.
        w.set_ssm(true);
        w.set_ssi(true);
    });
    spi.cr1().modify(|w| w.set_spe(true));
}

impl Transmit for Spi1 {
    fn transmit_byte(&mut self, byte: u8) {
        let spi = pac::SPI1;
        let dr = spi.dr8().as_ptr();

        // Both waits are bounded by one byte time (8 bus clocks, 32 CPU
        // cycles) as long as the bus is configured.
        while !spi.sr().read().txe() {
            // spin
        }
        // DR must be accessed as a byte, or the FIFO takes the store as two
        // data frames.
        //
        // Safety: `dr` is SPI1's data register, valid for byte access.
        unsafe { ptr::write_volatile(dr as *mut u8, byte) };

        // Waiting for the byte we clock in at the same time is how we know
        // the outgoing one has fully left, so chip-select can't be released
        // early. It also keeps the RX FIFO from overflowing.
        while !spi.sr().read().rxne() {
            // spin
        }
        // Safety: as above.
        let _ = unsafe { ptr::read_volatile(dr as *const u8) };
    }
}
