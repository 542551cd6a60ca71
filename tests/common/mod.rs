//! Shared test fixtures
//!
//! A scripted Si4703 behind a mock `embedded_hal` I2C bus. Writes land in
//! the chip's register image starting at 0x02; reads are served from the
//! image starting at 0x0A and wrapping, the way the real part does.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};
use fm_clock::alarm::AlarmBank;
use fm_clock::event::{Event, EventQueue};
use fm_clock::radio::{FavoriteList, Radio};
use fm_clock::task::{Outbox, TimerRequests};
use fm_clock::tuner::Si4703;
use fm_clock::types::{Channel, ClockTime, Frequency};
use fm_clock::ui::Context;

const STC: u16 = 1 << 14;
const RDSR: u16 = 1 << 15;
const SFBL: u16 = 1 << 13;
const STEREO: u16 = 1 << 8;

/// One bus transaction as the chip saw it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transfer {
    /// Bytes written
    Write(u8, Vec<u8>),
    /// Number of bytes read
    Read(u8, usize),
}

/// Register image plus a log of every transfer
#[derive(Debug, Default)]
pub struct Chip {
    pub regs: [u16; 16],
    pub log: Vec<Transfer>,
    pub fail: bool,
}

impl Chip {
    /// Writes only, in order
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.log
            .iter()
            .filter_map(|t| match t {
                Transfer::Write(_, bytes) => Some(bytes.clone()),
                Transfer::Read(..) => None,
            })
            .collect()
    }

    /// Last written bytes
    pub fn last_write(&self) -> Vec<u8> {
        self.writes().pop().unwrap_or_default()
    }

    /// Flag a finished tune/seek on `channel`
    pub fn complete(&mut self, channel: u16, band_limit: bool, rssi: u8) {
        let mut status = STC | STEREO | u16::from(rssi);
        if band_limit {
            status |= SFBL;
        }
        self.regs[0x0A] = status;
        self.regs[0x0B] = channel & Channel::FIELD_MASK;
    }

    /// Finish tuning to `frequency` with a strong signal
    pub fn complete_at(&mut self, frequency: Frequency) {
        self.complete(frequency.channel().raw(), false, 40);
    }

    /// Present one RDS group with clean block errors
    pub fn rds_group(&mut self, b: u16, c: u16, d: u16) {
        self.regs[0x0A] = RDSR | 30;
        self.regs[0x0B] &= Channel::FIELD_MASK;
        self.regs[0x0C] = 0x1234;
        self.regs[0x0D] = b;
        self.regs[0x0E] = c;
        self.regs[0x0F] = d;
    }

    /// Also flag a finished tune/seek on `frequency` in the current snapshot
    pub fn also_complete_at(&mut self, frequency: Frequency) {
        self.regs[0x0A] |= STC | STEREO;
        self.regs[0x0B] = frequency.channel().raw() & Channel::FIELD_MASK;
    }

    /// Drop every status flag
    pub fn idle(&mut self) {
        self.regs[0x0A] = 0;
    }

    fn write(&mut self, bytes: &[u8]) {
        for (offset, pair) in bytes.chunks_exact(2).enumerate() {
            self.regs[0x02 + offset] = u16::from_be_bytes([pair[0], pair[1]]);
        }
    }

    fn read(&self, buf: &mut [u8]) {
        for (offset, pair) in buf.chunks_exact_mut(2).enumerate() {
            let word = self.regs[(0x0A + offset) % 16];
            pair.copy_from_slice(&word.to_be_bytes());
        }
    }
}

/// Bus handle sharing the chip with the test
#[derive(Clone, Default)]
pub struct MockI2c {
    pub chip: Rc<RefCell<Chip>>,
}

impl MockI2c {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        let mut chip = self.chip.borrow_mut();
        if chip.fail {
            return Err(ErrorKind::Other);
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    chip.write(bytes);
                    chip.log.push(Transfer::Write(address, bytes.to_vec()));
                }
                Operation::Read(buf) => {
                    chip.read(buf);
                    chip.log.push(Transfer::Read(address, buf.len()));
                }
            }
        }
        Ok(())
    }
}

/// Delay that only records the requested milliseconds
#[derive(Default)]
pub struct RecordingDelay {
    pub millis: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.millis.push(ms);
    }
}

/// Event queue, timer mailboxes and the chip, shared by one test
#[derive(Default)]
pub struct Rig {
    pub bus: MockI2c,
    pub events: EventQueue,
    pub timers: TimerRequests,
}

impl Rig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Radio on this rig's bus, powered off
    pub fn radio(&self) -> Radio<MockI2c> {
        Radio::new(Si4703::new(self.bus.clone()))
    }

    pub fn out(&self) -> Outbox<'_> {
        Outbox::new(&self.events, &self.timers)
    }

    pub fn chip(&self) -> std::cell::RefMut<'_, Chip> {
        self.bus.chip.borrow_mut()
    }

    /// Pop every pending event
    pub fn drain(&self) -> Vec<Event> {
        std::iter::from_fn(|| self.events.pop()).collect()
    }
}

/// Radio, stations and alarms for driving the UI layers
pub struct World {
    pub radio: Radio<MockI2c>,
    pub favorites: FavoriteList,
    pub alarms: AlarmBank,
}

impl World {
    pub fn new(rig: &Rig) -> Self {
        Self {
            radio: rig.radio(),
            favorites: FavoriteList::new(),
            alarms: AlarmBank::new(),
        }
    }

    pub fn context<'a>(&'a mut self, rig: &'a Rig, now: ClockTime) -> Context<'a, MockI2c> {
        Context {
            radio: &mut self.radio,
            favorites: &mut self.favorites,
            alarms: &mut self.alarms,
            out: rig.out(),
            now,
        }
    }
}
