//! GPIOA/GPIOB as [`PortRegisters`].
//!
//! Data is IDR, the latch is ODR, and the direction is MODER (plus AFR for
//! peripheral pins). Latch writes go through BSRR, which sets and clears
//! individual bits in a single store, so no read-modify-write of ODR ever
//! happens and a write can't race with or clobber another field.

use core::sync::atomic::Ordering;

use stm32_metapac::{
    self as pac,
    gpio::{
        Gpio,
        regs::Bsrr,
        vals::{Moder, Ospeedr, Pupdr},
    },
};

use lutdac::port::{Bank, Direction, Field, PortRegisters};

/// Handle on the port registers. There is no runtime state; holding one is a
/// promise that nobody else is writing the latches.
pub struct GpioPorts(());

impl GpioPorts {
    /// # Safety
    ///
    /// At most one `GpioPorts` may be in use at any moment.
    pub const unsafe fn steal() -> Self {
        Self(())
    }
}

fn regs(bank: Bank) -> Gpio {
    match bank {
        Bank::A => pac::GPIOA,
        Bank::B => pac::GPIOB,
    }
}

impl PortRegisters for GpioPorts {
    fn data(&self, bank: Bank) -> u16 {
        regs(bank).idr().read().0 as u16
    }

    fn latch(&self, bank: Bank) -> u16 {
        regs(bank).odr().read().0 as u16
    }

    fn set_reset(&mut self, bank: Bank, set: u16, clear: u16) {
        // Low half of BSRR sets, high half resets.
        regs(bank)
            .bsrr()
            .write_value(Bsrr(u32::from(set) | u32::from(clear) << 16));
    }

    fn set_direction(&mut self, bank: Bank, pin: u8, direction: Direction) {
        let gpio = regs(bank);
        let pin = usize::from(pin);
        let mode = match direction {
            Direction::Input => Moder::INPUT,
            Direction::Output => Moder::OUTPUT,
            Direction::Alternate(af) => {
                // Route the function before handing the pin over to it.
                gpio.afr(pin / 8).modify(|w| w.set_afr(pin % 8, af));
                Moder::ALTERNATE
            }
        };
        gpio.moder().modify(|w| w.set_moder(pin, mode));
    }
}

pub fn enable_clocks() {
    pac::RCC.ahbenr().modify(|w| {
        w.set_gpioaen(true);
        w.set_gpioben(true);
    });
    core::sync::atomic::compiler_fence(Ordering::SeqCst);
}

/// Pull-ups and output speeds; the parts of pin setup that aren't direction.
pub fn configure_electrical() {
    // Selection switches pull to ground, so idle reads as 0b1111 (silent)
    // when nothing is fitted.
    let sel = Field::SELECTION;
    regs(sel.bank).pupdr().modify(|w| {
        for pin in sel.pins() {
            w.set_pupdr(usize::from(pin), Pupdr::PULL_UP);
        }
    });

    // The bus and its framing signals need clean edges at 12 MHz.
    for field in [Field::CHIP_SELECT, Field::SCK, Field::SDO, Field::DEBUG] {
        regs(field.bank).ospeedr().modify(|w| {
            for pin in field.pins() {
                w.set_ospeedr(usize::from(pin), Ospeedr::VERY_HIGH_SPEED);
            }
        });
    }
}
