//! Lookup-table waveform playback for an external SPI DAC.
//!
//! A fixed-rate timer interrupt drives [`scheduler::Scheduler::tick`], which
//! reads a 4-bit selection code from the input pins, looks up the current
//! sample of the selected [`waveform::Waveform`], and clocks it out to the DAC
//! as two bytes inside a single chip-select frame.
//!
//! Everything in this crate is hardware-independent: the port registers and
//! the serial bus are reached through the [`port::PortRegisters`] and
//! [`transmit::Transmit`] traits, which the firmware binary implements on top
//! of the STM32F051 peripherals.

#![cfg_attr(not(test), no_std)]

pub mod port;
pub mod scheduler;
pub mod timing;
pub mod transmit;
pub mod waveform;

#[cfg(test)]
mod testing;
