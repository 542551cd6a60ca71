//! Events and the bounded event queue
//!
//! Interrupt-side producers (rotary pins, buttons, tuner IRQ) push
//! pre-built [`Event`]s; the single consumer task drains them. The queue
//! holds at most [`EVENT_QUEUE_CAPACITY`] entries and drops the oldest
//! one on overflow. Every push raises the wake signal.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use heapless::{Deque, String};

use crate::config::EVENT_QUEUE_CAPACITY;
use crate::types::{Frequency, Rssi};

/// RDS basic tuning (programme service) name, up to 8 characters
pub type StationName = String<8>;

/// RDS radio text, up to 64 characters
pub type RadioTextString = String<64>;

/// Input and radio events routed through the system
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Rotary encoder turned clockwise
    RotateCw {
        /// Detent arrived quickly after the previous one
        fast: bool,
    },
    /// Rotary encoder turned counter-clockwise
    RotateCcw {
        /// Detent arrived quickly after the previous one
        fast: bool,
    },
    /// Rotary push button pressed
    RotaryPush,
    /// Rotary push button released
    RotaryRelease,
    /// Side button pressed
    SidePush,
    /// Side button released
    SideRelease,
    /// Tuner settled on a frequency
    Tuned {
        /// Frequency reported by the chip
        frequency: Frequency,
        /// Signal strength at that frequency
        rssi: Rssi,
        /// Whether the chip considers the channel a valid station
        valid: bool,
    },
    /// Station name reassembled from RDS group 0
    BasicTuningText {
        /// Decoded name
        text: StationName,
    },
    /// Radio text reassembled from RDS group 2
    RadioText {
        /// Decoded text
        text: RadioTextString,
    },
    /// Synthetic event delivered to a mode when it is engaged
    ModeEnter,
    /// A label-wait timer expired
    Timeout,
    /// A seek or scan session ended without a new station
    SeekComplete,
    /// Navigation returned to the top level
    Exit,
}

impl Event {
    /// Rotation as a signed detent count, None for other events
    #[must_use]
    pub const fn rotation(&self) -> Option<i32> {
        match self {
            Self::RotateCw { .. } => Some(1),
            Self::RotateCcw { .. } => Some(-1),
            _ => None,
        }
    }

    /// Whether this is a fast rotation
    #[must_use]
    pub const fn is_fast(&self) -> bool {
        matches!(
            self,
            Self::RotateCw { fast: true } | Self::RotateCcw { fast: true }
        )
    }

    /// Whether this event comes from the rotary encoder (turn or button)
    #[must_use]
    pub const fn is_rotary(&self) -> bool {
        matches!(
            self,
            Self::RotateCw { .. } | Self::RotateCcw { .. } | Self::RotaryPush | Self::RotaryRelease
        )
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Event {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::RotateCw { fast } => defmt::write!(f, "CW(fast={})", fast),
            Self::RotateCcw { fast } => defmt::write!(f, "CCW(fast={})", fast),
            Self::RotaryPush => defmt::write!(f, "RotPush"),
            Self::RotaryRelease => defmt::write!(f, "RotRelease"),
            Self::SidePush => defmt::write!(f, "SidePush"),
            Self::SideRelease => defmt::write!(f, "SideRelease"),
            Self::Tuned {
                frequency,
                rssi,
                valid,
            } => defmt::write!(f, "Tuned({}, {}, valid={})", frequency, rssi, valid),
            Self::BasicTuningText { text } => defmt::write!(f, "PS({})", text.as_str()),
            Self::RadioText { text } => defmt::write!(f, "RT({})", text.as_str()),
            Self::ModeEnter => defmt::write!(f, "ModeEnter"),
            Self::Timeout => defmt::write!(f, "Timeout"),
            Self::SeekComplete => defmt::write!(f, "SeekComplete"),
            Self::Exit => defmt::write!(f, "Exit"),
        }
    }
}

/// Bounded FIFO shared between interrupt producers and the consumer task
pub struct EventQueue {
    events: Mutex<CriticalSectionRawMutex, RefCell<Deque<Event, EVENT_QUEUE_CAPACITY>>>,
    ready: Signal<CriticalSectionRawMutex, ()>,
}

impl EventQueue {
    /// Create an empty queue (usable in a `static`)
    #[must_use]
    pub const fn new() -> Self {
        Self {
            events: Mutex::new(RefCell::new(Deque::new())),
            ready: Signal::new(),
        }
    }

    /// Append an event, evicting the oldest one when full
    ///
    /// Returns the evicted event, if any. Never blocks.
    pub fn push(&self, event: Event) -> Option<Event> {
        let evicted = self.events.lock(|events| {
            let mut events = events.borrow_mut();
            let evicted = if events.is_full() {
                events.pop_front()
            } else {
                None
            };
            // Cannot fail: a slot was freed above when full.
            let _ = events.push_back(event);
            evicted
        });
        self.ready.signal(());
        evicted
    }

    /// Take the oldest pending event, None when empty
    pub fn pop(&self) -> Option<Event> {
        self.events.lock(|events| events.borrow_mut().pop_front())
    }

    /// Number of pending events
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock(|events| events.borrow().len())
    }

    /// Check whether no events are pending
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all pending events
    pub fn clear(&self) {
        self.events.lock(|events| events.borrow_mut().clear());
    }

    /// Whether a push happened since the last wait completed
    #[must_use]
    pub fn is_signaled(&self) -> bool {
        self.ready.signaled()
    }

    /// Suspend until the next push
    pub async fn wait(&self) {
        self.ready.wait().await;
    }

    /// Wait for and take the next event
    pub async fn next(&self) -> Event {
        loop {
            if let Some(event) = self.pop() {
                return event;
            }
            self.wait().await;
        }
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
