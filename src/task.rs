//! Cancellable timer task handles
//!
//! Timer tasks (label wait, sleep-off, volume ramp) run independently of
//! the state they affect. A [`TaskSlot`] holds that state together with a
//! generation counter; a task receives a [`Ticket`] when started and must
//! check it at every resumption point. Whichever of completion or
//! cancellation runs first takes the state, the other becomes a no-op.
//!
//! Starting a slot only records the state; [`TimerRequests`] carries the
//! ticket to the task that does the waiting.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::event::{Event, EventQueue};

/// Proof of a particular start of a [`TaskSlot`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u32);

impl Ticket {
    /// Raw generation number
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.0
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Ticket {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "#{}", self.0);
    }
}

/// State owned by at most one running timer task
#[derive(Clone, Debug)]
pub struct TaskSlot<T> {
    generation: u32,
    state: Option<T>,
}

impl<T> TaskSlot<T> {
    /// Create an idle slot
    #[must_use]
    pub const fn new() -> Self {
        Self {
            generation: 0,
            state: None,
        }
    }

    /// Start a new run, superseding any previous one
    pub fn start(&mut self, state: T) -> Ticket {
        self.generation = self.generation.wrapping_add(1);
        self.state = Some(state);
        Ticket(self.generation)
    }

    /// Cancel the current run and return its state
    ///
    /// Cancelling an idle or already completed slot returns None.
    pub fn cancel(&mut self) -> Option<T> {
        let state = self.state.take();
        if state.is_some() {
            self.generation = self.generation.wrapping_add(1);
        }
        state
    }

    /// Finish the run identified by `ticket` and return its state
    ///
    /// Returns None if the run was cancelled or superseded meanwhile.
    pub fn complete(&mut self, ticket: Ticket) -> Option<T> {
        if self.is_live(ticket) {
            self.state.take()
        } else {
            None
        }
    }

    /// Whether `ticket` identifies the run still in progress
    #[must_use]
    pub fn is_live(&self, ticket: Ticket) -> bool {
        self.state.is_some() && ticket.0 == self.generation
    }

    /// Whether any run is in progress
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.state.is_some()
    }

    /// Ticket of the run in progress
    #[must_use]
    pub const fn current(&self) -> Option<Ticket> {
        match self.state {
            Some(_) => Some(Ticket(self.generation)),
            None => None,
        }
    }

    /// State of the run in progress
    #[must_use]
    pub const fn state(&self) -> Option<&T> {
        self.state.as_ref()
    }

    /// Mutable state of the run in progress
    pub fn state_mut(&mut self) -> Option<&mut T> {
        self.state.as_mut()
    }
}

impl<T> Default for TaskSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Wake-ups for the timer tasks
///
/// Each signal holds only the newest ticket; an older request that was
/// never picked up is stale anyway.
pub struct TimerRequests {
    label_wait: Signal<CriticalSectionRawMutex, Ticket>,
    sleep_off: Signal<CriticalSectionRawMutex, (Ticket, u16)>,
    ramp: Signal<CriticalSectionRawMutex, Ticket>,
}

impl TimerRequests {
    /// Create with nothing requested (usable in a `static`)
    #[must_use]
    pub const fn new() -> Self {
        Self {
            label_wait: Signal::new(),
            sleep_off: Signal::new(),
            ramp: Signal::new(),
        }
    }

    /// Ask for a label-wait timeout
    pub fn request_label_wait(&self, ticket: Ticket) {
        self.label_wait.signal(ticket);
    }

    /// Ask for a sleep-off countdown of `minutes`
    pub fn request_sleep_off(&self, ticket: Ticket, minutes: u16) {
        self.sleep_off.signal((ticket, minutes));
    }

    /// Ask for volume ramp steps
    pub fn request_ramp(&self, ticket: Ticket) {
        self.ramp.signal(ticket);
    }

    /// Take a pending label-wait request without waiting
    pub fn take_label_wait(&self) -> Option<Ticket> {
        self.label_wait.try_take()
    }

    /// Take a pending sleep-off request without waiting
    pub fn take_sleep_off(&self) -> Option<(Ticket, u16)> {
        self.sleep_off.try_take()
    }

    /// Take a pending ramp request without waiting
    pub fn take_ramp(&self) -> Option<Ticket> {
        self.ramp.try_take()
    }

    /// Wait for the next label-wait request
    pub async fn label_wait(&self) -> Ticket {
        self.label_wait.wait().await
    }

    /// Wait for the next sleep-off request
    pub async fn sleep_off(&self) -> (Ticket, u16) {
        self.sleep_off.wait().await
    }

    /// Wait for the next ramp request
    pub async fn ramp(&self) -> Ticket {
        self.ramp.wait().await
    }
}

impl Default for TimerRequests {
    fn default() -> Self {
        Self::new()
    }
}

/// Where control-core operations send their side effects
#[derive(Clone, Copy)]
pub struct Outbox<'a> {
    /// Event queue drained by the main loop
    pub events: &'a EventQueue,
    /// Timer task wake-ups
    pub timers: &'a TimerRequests,
}

impl<'a> Outbox<'a> {
    /// Bundle a queue and timer requests
    #[must_use]
    pub const fn new(events: &'a EventQueue, timers: &'a TimerRequests) -> Self {
        Self { events, timers }
    }

    /// Push an event, logging an eviction
    pub fn push(&self, event: Event) {
        if let Some(evicted) = self.events.push(event) {
            warn!("event queue full, dropped {}", evicted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_idempotent() {
        let mut slot = TaskSlot::new();
        let ticket = slot.start(5u8);
        assert_eq!(slot.cancel(), Some(5));
        assert_eq!(slot.cancel(), None);
        assert_eq!(slot.complete(ticket), None);
    }

    #[test]
    fn completion_after_restart_is_stale() {
        let mut slot = TaskSlot::new();
        let first = slot.start(1u8);
        let second = slot.start(2u8);
        assert!(!slot.is_live(first));
        assert_eq!(slot.complete(first), None);
        assert_eq!(slot.complete(second), Some(2));
        assert!(!slot.is_active());
    }
}
