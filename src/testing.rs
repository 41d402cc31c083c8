//! In-memory stand-ins for the port registers and the DAC bus.
//!
//! Both halves share one [`Rig`], which journals every latch write and every
//! byte in the order they happen so tests can check framing.

use std::{cell::RefCell, rc::Rc};

use crate::{
    port::{Bank, Direction, Field, PortRegisters, PortView},
    transmit::Transmit,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Latch { bank: Bank, set: u16, clear: u16 },
    Byte(u8),
}

#[derive(Default)]
pub struct Rig {
    inputs: [u16; 2],
    latch: [u16; 2],
    directions: [[Option<Direction>; 16]; 2],
    events: Vec<Event>,
}

pub type SharedRig = Rc<RefCell<Rig>>;

pub struct FakePorts(SharedRig);

pub struct RecordingBus(SharedRig);

impl Rig {
    pub fn setup() -> (SharedRig, PortView<FakePorts>, RecordingBus) {
        let rig = Rc::new(RefCell::new(Rig::default()));
        let port = PortView::new(FakePorts(rig.clone()));
        let bus = RecordingBus(rig.clone());
        (rig, port, bus)
    }

    /// Drives the selection pins from outside.
    pub fn set_selection(&mut self, code: u8) {
        let f = Field::SELECTION;
        let bank = &mut self.inputs[f.bank.index()];
        *bank = (*bank & !f.mask()) | ((u16::from(code) << f.lsb) & f.mask());
    }

    pub fn direction(&self, bank: Bank, pin: u8) -> Option<Direction> {
        self.directions[bank.index()][usize::from(pin)]
    }

    pub fn latch(&self, bank: Bank) -> u16 {
        self.latch[bank.index()]
    }

    /// Level of a single output pin.
    pub fn level(&self, field: Field) -> u16 {
        (self.latch(field.bank) & field.mask()) >> field.lsb
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Bytes sent since the last `take_events`, without draining the journal.
    pub fn bytes(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Byte(b) => Some(*b),
                _ => None,
            })
            .collect()
    }
}

impl PortRegisters for FakePorts {
    fn data(&self, bank: Bank) -> u16 {
        // Unconfigured pins and inputs read the outside world; everything
        // else reads back its latch.
        let rig = self.0.borrow();
        let b = bank.index();
        let mut value = 0;
        for pin in 0..16 {
            let bit = 1 << pin;
            let source = match rig.directions[b][pin] {
                None | Some(Direction::Input) => rig.inputs[b],
                Some(_) => rig.latch[b],
            };
            value |= source & bit;
        }
        value
    }

    fn latch(&self, bank: Bank) -> u16 {
        self.0.borrow().latch[bank.index()]
    }

    fn set_reset(&mut self, bank: Bank, set: u16, clear: u16) {
        assert_eq!(set & clear, 0, "set and clear overlap");
        let mut rig = self.0.borrow_mut();
        let latch = &mut rig.latch[bank.index()];
        *latch = (*latch | set) & !clear;
        rig.events.push(Event::Latch { bank, set, clear });
    }

    fn set_direction(&mut self, bank: Bank, pin: u8, direction: Direction) {
        self.0.borrow_mut().directions[bank.index()][usize::from(pin)] =
            Some(direction);
    }
}

impl Transmit for RecordingBus {
    fn transmit_byte(&mut self, byte: u8) {
        self.0.borrow_mut().events.push(Event::Byte(byte));
    }
}
