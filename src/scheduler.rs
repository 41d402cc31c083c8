//! The per-tick sample scheduler.
//!
//! [`Scheduler::tick`] is the body of the timer interrupt. Every call produces
//! exactly one chip-select frame on the DAC bus and advances the playback
//! position by one sample, whatever the selection input says.
//!
//! The handler has no loops and no waits other than those inside
//! [`Transmit::transmit_byte`], so its run time is fixed up to the bus. It
//! must not be entered again before it returns; on the Cortex-M this holds
//! because an interrupt never preempts itself.

use crate::{
    port::{Field, PortRegisters, PortView},
    transmit::{Transmit, transmit_sample},
    waveform::{PlaybackIndex, Selection, Waveform},
};

/// Chip-select level that opens a DAC frame.
const CS_ACTIVE: u16 = 0;
const CS_IDLE: u16 = 1;

/// What a tick put on the bus.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Frame {
    /// `value`, sample `index` of `waveform`, was sent.
    Sample {
        waveform: Waveform,
        index: PlaybackIndex,
        value: u16,
    },
    /// The selection code names no waveform. Chip-select still pulsed, but
    /// no data was clocked out.
    Silent(Selection),
}

/// Owns the playback position. Nothing outside the tick handler can move it.
#[derive(Debug, Default)]
pub struct Scheduler {
    index: PlaybackIndex,
}

impl Scheduler {
    pub const fn new() -> Self {
        Self {
            index: PlaybackIndex::new(),
        }
    }

    /// Position of the sample the next tick will send.
    pub fn index(&self) -> PlaybackIndex {
        self.index
    }

    /// Services one tick.
    pub fn tick<R, T>(&mut self, port: &mut PortView<R>, bus: &mut T) -> Frame
    where
        R: PortRegisters,
        T: Transmit + ?Sized,
    {
        port.set(Field::DEBUG, 1);
        port.set(Field::CHIP_SELECT, CS_ACTIVE);

        let selection = port.read_selection();
        let frame = match selection.waveform() {
            Some(waveform) => {
                let value = waveform.sample(self.index);
                transmit_sample(bus, value);
                Frame::Sample {
                    waveform,
                    index: self.index,
                    value,
                }
            }
            // The frame still opens and closes around nothing. Whether the
            // DAC depends on that pulse is unknown, so it is kept.
            None => Frame::Silent(selection),
        };

        self.index.advance();

        port.set(Field::CHIP_SELECT, CS_IDLE);
        port.set(Field::DEBUG, 0);

        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        port::Bank,
        testing::{Event, Rig},
        waveform::TABLE_LEN,
    };

    const DEBUG_HIGH: Event = Event::Latch { bank: Bank::B, set: 0x0002, clear: 0 };
    const DEBUG_LOW: Event = Event::Latch { bank: Bank::B, set: 0, clear: 0x0002 };
    const CS_LOW: Event = Event::Latch { bank: Bank::A, set: 0, clear: 0x0010 };
    const CS_HIGH: Event = Event::Latch { bank: Bank::A, set: 0x0010, clear: 0 };

    #[test]
    fn first_ticks_of_1khz() {
        let (rig, mut port, mut bus) = Rig::setup();
        port.configure_directions();
        let mut sched = Scheduler::new();
        rig.borrow_mut().set_selection(0b0000);

        let frame = sched.tick(&mut port, &mut bus);
        assert_eq!(frame, Frame::Sample {
            waveform: Waveform::Sine1k,
            index: PlaybackIndex::new(),
            value: 0x17ff,
        });
        assert_eq!(rig.borrow_mut().take_events(), [
            DEBUG_HIGH,
            CS_LOW,
            Event::Byte(0x17),
            Event::Byte(0xff),
            CS_HIGH,
            DEBUG_LOW,
        ]);

        sched.tick(&mut port, &mut bus);
        assert_eq!(rig.borrow().bytes(), [0x19, 0x72]);
    }

    #[test]
    fn each_waveform_plays_its_table_in_order() {
        for waveform in Waveform::ALL {
            let (rig, mut port, mut bus) = Rig::setup();
            port.configure_directions();
            let mut sched = Scheduler::new();
            rig.borrow_mut().set_selection(waveform.selection().bits());

            for _ in 0..TABLE_LEN {
                sched.tick(&mut port, &mut bus);
            }
            let expected: Vec<u8> = waveform
                .table()
                .iter()
                .flat_map(|&v| [(v >> 8) as u8, (v & 0xff) as u8])
                .collect();
            assert_eq!(rig.borrow_mut().bytes(), expected, "{waveform:?}");
        }
    }

    #[test]
    fn sequence_repeats_after_a_full_period() {
        let (rig, mut port, mut bus) = Rig::setup();
        port.configure_directions();
        let mut sched = Scheduler::new();
        rig.borrow_mut().set_selection(0b0000);

        for _ in 0..TABLE_LEN {
            sched.tick(&mut port, &mut bus);
        }
        let first = rig.borrow_mut().take_events();
        for _ in 0..TABLE_LEN {
            sched.tick(&mut port, &mut bus);
        }
        let second = rig.borrow_mut().take_events();
        assert_eq!(first, second);
        assert_eq!(sched.index().get(), 0);
    }

    #[test]
    fn undefined_codes_send_an_empty_frame() {
        for code in 0b0011..=0b1111 {
            let (rig, mut port, mut bus) = Rig::setup();
            port.configure_directions();
            let mut sched = Scheduler::new();
            rig.borrow_mut().set_selection(code);

            let frame = sched.tick(&mut port, &mut bus);
            assert_eq!(frame, Frame::Silent(Selection::new(code)));
            assert_eq!(rig.borrow_mut().take_events(), [
                DEBUG_HIGH, CS_LOW, CS_HIGH, DEBUG_LOW,
            ]);
            assert_eq!(sched.index().get(), 1);
        }
    }

    #[test]
    fn chip_select_spans_both_bytes() {
        let (rig, mut port, mut bus) = Rig::setup();
        port.configure_directions();
        let mut sched = Scheduler::new();

        for tick in 0..3 * TABLE_LEN {
            rig.borrow_mut().set_selection((tick % 5) as u8);
            sched.tick(&mut port, &mut bus);
        }

        // Replay the journal, tracking chip-select, and check every byte
        // lands inside a frame and every frame holds zero or two bytes.
        let events = rig.borrow_mut().take_events();
        let mut cs = CS_IDLE;
        let mut in_frame = 0;
        let mut frames = 0;
        for e in events {
            match e {
                CS_LOW => {
                    assert_eq!(cs, CS_IDLE);
                    cs = CS_ACTIVE;
                    in_frame = 0;
                }
                CS_HIGH => {
                    assert_eq!(cs, CS_ACTIVE);
                    assert!(in_frame == 0 || in_frame == 2, "partial frame");
                    cs = CS_IDLE;
                    frames += 1;
                }
                Event::Byte(_) => {
                    assert_eq!(cs, CS_ACTIVE, "byte outside a frame");
                    in_frame += 1;
                }
                _ => {}
            }
        }
        assert_eq!(cs, CS_IDLE);
        assert_eq!(frames, 3 * TABLE_LEN);
    }

    #[test]
    fn debug_strobe_brackets_the_handler() {
        let (rig, mut port, mut bus) = Rig::setup();
        port.configure_directions();
        let mut sched = Scheduler::new();

        sched.tick(&mut port, &mut bus);
        let events = rig.borrow_mut().take_events();
        assert_eq!(events.first(), Some(&DEBUG_HIGH));
        assert_eq!(events.last(), Some(&DEBUG_LOW));
        assert_eq!(rig.borrow().level(Field::DEBUG), 0);
        assert_eq!(rig.borrow().level(Field::CHIP_SELECT), CS_IDLE);
    }

    #[test]
    fn index_counts_ticks_whatever_the_selection() {
        let (rig, mut port, mut bus) = Rig::setup();
        port.configure_directions();
        let mut sched = Scheduler::new();

        // Some arbitrary selection churn, valid and not.
        let codes = [0, 0, 3, 1, 1, 2, 15, 0, 7, 2, 1];
        for n in 0..200 {
            rig.borrow_mut().set_selection(codes[n % codes.len()]);
            sched.tick(&mut port, &mut bus);
            assert_eq!(sched.index().get(), (n + 1) % TABLE_LEN);
        }
    }

    #[test]
    fn switching_keeps_phase() {
        let (rig, mut port, mut bus) = Rig::setup();
        port.configure_directions();
        let mut sched = Scheduler::new();

        rig.borrow_mut().set_selection(Waveform::Sine1k.selection().bits());
        for _ in 0..11 {
            sched.tick(&mut port, &mut bus);
        }
        rig.borrow_mut().set_selection(Waveform::Sine1k2k.selection().bits());
        let frame = sched.tick(&mut port, &mut bus);

        let k = 11;
        assert_eq!(frame, Frame::Sample {
            waveform: Waveform::Sine1k2k,
            index: sched_index(k),
            value: Waveform::Sine1k2k.table()[k],
        });
    }

    #[test]
    fn silence_keeps_phase() {
        let (rig, mut port, mut bus) = Rig::setup();
        port.configure_directions();
        let mut sched = Scheduler::new();

        rig.borrow_mut().set_selection(0b0011);
        for _ in 0..5 {
            sched.tick(&mut port, &mut bus);
        }
        assert!(rig.borrow().bytes().is_empty());

        rig.borrow_mut().set_selection(0b0001);
        sched.tick(&mut port, &mut bus);
        let v = Waveform::Sine2k.table()[5];
        assert_eq!(rig.borrow().bytes(), [(v >> 8) as u8, v as u8]);
    }

    fn sched_index(k: usize) -> PlaybackIndex {
        let mut i = PlaybackIndex::new();
        for _ in 0..k {
            i.advance();
        }
        i
    }
}
