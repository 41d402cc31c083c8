//! Bootstrap and the tick interrupt.
//!
//! Pin map (STM32F051C6, no external oscillator):
//!
//! - PA0..PA3: experiment selection input, pulled up.
//! - PA4: DAC chip-select, active low.
//! - PA5, PA7: SPI1 SCK and MOSI to the DAC.
//! - PA6: TIM3_CH1, a free-running 32 kHz reference clock for the rig.
//! - PA8: DAC LDAC, held low.
//! - PB1: debug strobe, high while the tick handler runs.
//! - PB10..PB15: LED bus, cleared at boot and otherwise left to the rig.
//!
//! TIM3 does double duty: its update event is the sample tick, and its
//! channel 1 compare generates the reference clock. Both therefore run at
//! exactly the same rate.

use core::sync::atomic::Ordering;

use defmt_rtt as _;
use panic_halt as _;
use stm32_metapac::{
    self as pac, flash::vals::Latency, interrupt, iwdg::vals::Key,
    rcc::vals::{Hpre, Pllmul, Pllsrc, Ppre, Sw}, timer::vals::Ocm,
};

use lutdac::{
    port::{Field, PortView},
    scheduler::Scheduler,
    timing::{CPU_FREQ, FUNDAMENTAL_FREQ, REFERENCE_COMPARE, TICK_FREQ, TICK_RELOAD},
    transmit::DAC_BUS_MODE,
};

mod gpio;
mod spi;

use gpio::GpioPorts;
use spi::Spi1;

#[cortex_m_rt::entry]
fn main() -> ! {
    let mut cp = cortex_m::Peripherals::take().unwrap();

    configure_clock_tree();
    defmt::info!("clock tree up at {} Hz", CPU_FREQ);

    {
        gpio::enable_clocks();

        // Safety: the tick interrupt is still masked, so this is the only
        // user of the port latches until the end of this block.
        let mut port = PortView::new(unsafe { GpioPorts::steal() });

        // Set the idle levels before the pins turn into outputs, so the DAC
        // never sees a spurious chip-select edge.
        port.set(Field::CHIP_SELECT, 1);
        port.set(Field::DEBUG, 0);
        port.set(Field::LDAC, 0);
        port.set(Field::LED_BUS, 0);

        port.configure_directions();
        gpio::configure_electrical();

        defmt::info!("pins configured, selection input reads {}", port.read_selection());
        // `port` is dropped here; from now on the port latches belong to the
        // tick handler.
    }

    spi::configure(DAC_BUS_MODE);
    configure_reference_clock();
    configure_tick_timer();
    defmt::info!(
        "tick timer running at {} Hz, {} Hz fundamental",
        TICK_FREQ,
        FUNDAMENTAL_FREQ
    );

    if !cfg!(feature = "disable-iwdg") {
        // From here, if ticks stop arriving (or a tick wedges on the bus), we
        // reset. The watchdog is fed from the tick handler.
        configure_iwdg();
    }

    // Enable the update interrupt at the timer, then let it through the NVIC.
    pac::TIM3.dier().modify(|w| w.set_uie(true));

    // Safety: this is unsafe if it might break a critical section by allowing
    // preemption by the ISR, but we don't share any data with the ISR, so it
    // can preempt us -- go right ahead.
    unsafe {
        cp.NVIC.set_priority(pac::Interrupt::TIM3, 0);
        cortex_m::peripheral::NVIC::unmask(pac::Interrupt::TIM3);
    }

    loop {
        // All the work happens in the tick handler.
        cortex_m::asm::wfi();
    }
}

/// Sample tick.
///
/// The NVIC never nests an interrupt inside itself, so the state below is
/// only ever reached through one `&mut` at a time.
#[interrupt]
fn TIM3() {
    static mut SCHEDULER: Scheduler = Scheduler::new();
    // Safety: bootstrap gave up its handle on these before unmasking us, and
    // nothing else touches them.
    static mut PORT: PortView<GpioPorts> = PortView::new(unsafe { GpioPorts::steal() });
    static mut BUS: Spi1 = unsafe { Spi1::steal() };

    pac::TIM3.sr().modify(|w| w.set_uif(false));

    SCHEDULER.tick(PORT, BUS);

    if !cfg!(feature = "disable-iwdg") {
        feed_iwdg();
    }
}

fn configure_clock_tree() {
    // There is no external oscillator installed, so we need to use HSI through
    // a PLL to get 48 MHz.
    //
    // We come out of reset on HSI at 8 MHz. The PLL src on the F051 has two
    // options: HSI/2, and HSE/PREDIV. So we'll use HSI/2 then, for a 4 MHz
    // input clock, and multiply by 12.
    let rcc = pac::RCC;
    let flash = pac::FLASH;

    // First, configure the flash controller to use appropriate wait states for
    // 48 MHz.
    flash.acr().write(|w| {
        w.set_latency(Latency::WS1);
        // Turn on the prefetch buffer to make that a bit less painful.
        w.set_prftbe(true);
    });

    rcc.cfgr().write(|w| {
        w.set_pllmul(Pllmul::MUL12);
        w.set_pllsrc(Pllsrc::HSI_DIV2);

        // TIM3 and SPI1 both assume their kernel clock is the CPU clock.
        w.set_ppre(Ppre::DIV1);
        w.set_hpre(Hpre::DIV1);
    });

    rcc.cr().modify(|w| w.set_pllon(true));
    while !rcc.cr().read().pllrdy() {
        // spin
    }

    rcc.cfgr().modify(|w| w.set_sw(Sw::PLL1_P));
    while rcc.cfgr().read().sws() != Sw::PLL1_P {
        // spin
    }
}

fn configure_reference_clock() {
    // TIM3_CH1 in PWM mode 1: high from the update event until the counter
    // reaches `REFERENCE_COMPARE`, then low for the rest of the tick.
    pac::RCC.apb1enr().modify(|w| w.set_tim3en(true));
    core::sync::atomic::compiler_fence(Ordering::SeqCst);

    let tim = pac::TIM3;
    tim.ccmr_output(0).modify(|w| {
        w.set_ocm(0, Ocm::PWM_MODE1);
        w.set_ocpe(0, true);
    });
    tim.ccr(0).write(|w| w.set_ccr(REFERENCE_COMPARE));
    tim.ccer().modify(|w| w.set_cce(0, true));
}

fn configure_tick_timer() {
    // TIM3's input clock is `CPU_FREQ`; `TICK_RELOAD` is computed from it at
    // compile time, so no prescaler.
    let tim = pac::TIM3;
    tim.psc().write_value(0);
    tim.arr().write(|w| w.set_arr(TICK_RELOAD));
    // Force double-buffered registers (ARR, PSC, CCR1) to be applied.
    tim.egr().write(|w| w.set_ug(true));
    // That forced update raised UIF. Drop it so the first tick is a real one.
    tim.sr().modify(|w| w.set_uif(false));

    tim.cr1().write(|w| {
        w.set_arpe(true);
        w.set_cen(true);
    });
}

fn configure_iwdg() {
    // The IWDG is one of the only peripherals (along with RCC and FLASH) that
    // can be used _without_ having to enable its clock in RCC.
    let iwdg = pac::IWDG;

    // LSI runs at about 40 kHz. Prescaler 4 and reload 625 give a timeout of
    // 62.5 ms, against a feed every 31.25 us.
    iwdg.kr().write(|w| w.set_key(Key::ENABLE));
    iwdg.pr().write(|w| w.set_pr(pac::iwdg::vals::Pr::DIVIDE_BY4));
    iwdg.rlr().write(|w| w.set_rl(625));
    // Initialize the counter. Failing to do this here causes the watchdog to
    // start the first countdown from 0xFFF.
    iwdg.kr().write(|w| w.set_key(Key::RESET));
    // This operation cannot be reversed (without a reset).
    iwdg.kr().write(|w| w.set_key(Key::START));
}

fn feed_iwdg() {
    pac::IWDG.kr().write(|w| w.set_key(Key::RESET));
}
