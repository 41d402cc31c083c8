//! Lookup-table waveform generator firmware for an STM32F051 driving an
//! external SPI DAC.
//!
//! The operator picks a waveform on PA0..PA3; a 32 kHz timer interrupt streams
//! it to the DAC one 16-bit sample at a time. See `firmware` for the pin map
//! and peripheral setup, and the `lutdac` library for the playback logic.
//!
//! This only builds into something useful for `thumbv6m-none-eabi`. On any
//! other target the binary is a stub so that the library can be tested on the
//! host with a plain `cargo test`.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod firmware;

#[cfg(not(target_os = "none"))]
fn main() {
    eprintln!("lutdac is firmware; build it with --target thumbv6m-none-eabi");
    std::process::exit(1);
}
