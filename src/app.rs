//! Clock application state
//!
//! Ties the radio, stored stations, alarms, interceptor chain and
//! navigator together. The firmware shell keeps one [`Clock`] behind a
//! mutex and calls into it from each task; every method runs one whole
//! logical operation against the tuner.

use embedded_hal::i2c::I2c;

use crate::alarm::{self, AlarmBank, Triggered};
use crate::event::Event;
use crate::intercept::InterceptorChain;
use crate::persist::{self, PersistentStore, ALARM_RECORD, RADIO_RECORD};
use crate::radio::{FavoriteList, Radio};
use crate::task::{Outbox, Ticket};
use crate::tuner::TunerResult;
use crate::types::ClockTime;
use crate::ui::{Context, DisplaySurface, NavOutcome, Navigator};

/// Whole-device state
pub struct Clock<I2C> {
    radio: Radio<I2C>,
    favorites: FavoriteList,
    alarms: AlarmBank,
    navigator: Navigator,
    chain: InterceptorChain,
}

impl<I2C: I2c> Clock<I2C> {
    /// Fresh state with compiled-in defaults
    #[must_use]
    pub fn new(radio: Radio<I2C>) -> Self {
        Self {
            radio,
            favorites: FavoriteList::new(),
            alarms: AlarmBank::new(),
            navigator: Navigator::new(),
            chain: InterceptorChain::new(),
        }
    }

    /// Rehydrate every application from `store`
    pub fn load<S: PersistentStore>(&mut self, store: &mut S) {
        let radio = store.load(RADIO_RECORD);
        if radio.is_none() {
            info!("persist: no radio record, using defaults");
        }
        let settings = persist::radio_settings(radio.as_ref());
        self.radio.restore(settings.volume, settings.frequency);
        self.favorites = settings.favorites;

        let alarms = store.load(ALARM_RECORD);
        if alarms.is_none() {
            info!("persist: no alarm record, using defaults");
        }
        self.alarms = persist::alarm_bank(alarms.as_ref());
        self.navigator.invalidate();
    }

    /// Get radio
    #[must_use]
    pub const fn radio(&self) -> &Radio<I2C> {
        &self.radio
    }

    /// Get radio mutably
    pub fn radio_mut(&mut self) -> &mut Radio<I2C> {
        &mut self.radio
    }

    /// Get stored stations
    #[must_use]
    pub const fn favorites(&self) -> &FavoriteList {
        &self.favorites
    }

    /// Get alarms
    #[must_use]
    pub const fn alarms(&self) -> &AlarmBank {
        &self.alarms
    }

    /// Get alarms mutably
    pub fn alarms_mut(&mut self) -> &mut AlarmBank {
        &mut self.alarms
    }

    /// Get navigator
    #[must_use]
    pub const fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Get interceptor chain
    #[must_use]
    pub const fn chain(&self) -> &InterceptorChain {
        &self.chain
    }

    /// Force a redraw on the next render check
    pub fn invalidate(&mut self) {
        self.navigator.invalidate();
    }

    /// Check if the screen should be redrawn
    #[must_use]
    pub const fn needs_redraw(&self) -> bool {
        self.navigator.needs_update()
    }

    fn context<'a>(
        radio: &'a mut Radio<I2C>,
        favorites: &'a mut FavoriteList,
        alarms: &'a mut AlarmBank,
        out: Outbox<'a>,
        now: ClockTime,
    ) -> Context<'a, I2C> {
        Context {
            radio,
            favorites,
            alarms,
            out,
            now,
        }
    }

    /// Handle one dequeued event
    ///
    /// `Exit` only triggers the save step. Everything else runs through
    /// the interceptor chain, then the navigator; a mode exiting also
    /// triggers the save step.
    pub fn handle_event<S: PersistentStore>(
        &mut self,
        event: Event,
        out: Outbox<'_>,
        now: ClockTime,
        store: &mut S,
    ) -> TunerResult<NavOutcome, I2C::Error> {
        if event == Event::Exit {
            self.save_dirty(store);
            return Ok(NavOutcome::Handled);
        }

        let mut ctx = Self::context(&mut self.radio, &mut self.favorites, &mut self.alarms, out, now);
        let Some(event) = self.chain.run(event, &mut ctx)? else {
            self.navigator.invalidate();
            return Ok(NavOutcome::Handled);
        };
        let outcome = self.navigator.dispatch(&event, &mut ctx)?;
        if outcome == NavOutcome::ModeExited {
            self.save_dirty(store);
        }
        Ok(outcome)
    }

    /// Save each application whose tracked state changed
    pub fn save_dirty<S: PersistentStore>(&mut self, store: &mut S) {
        if self.radio.is_dirty() || self.favorites.is_dirty() {
            let record = persist::radio_record(self.radio.volume(), self.radio.frequency(), &self.favorites);
            store.save(RADIO_RECORD, &record);
            self.radio.mark_saved();
            self.favorites.mark_saved();
            info!("persist: saved radio ({} keys)", record.len());
        }
        if self.alarms.is_dirty() {
            let record = persist::alarm_record(&self.alarms);
            store.save(ALARM_RECORD, &record);
            self.alarms.mark_saved();
            info!("persist: saved alarms ({} keys)", record.len());
        }
    }

    /// Service the tuner interrupt line
    pub fn handle_interrupt(&mut self, out: Outbox<'_>) -> TunerResult<(), I2C::Error> {
        self.radio.handle_interrupt(out)
    }

    /// Per-second alarm poll
    pub fn tick(&mut self, now: &ClockTime, out: Outbox<'_>) -> TunerResult<Triggered, I2C::Error> {
        let fired = alarm::poll(&mut self.alarms, &mut self.radio, now, out)?;
        if !fired.is_empty() {
            self.navigator.invalidate();
        }
        Ok(fired)
    }

    /// A label-wait timer fired
    pub fn label_timeout(&mut self, ticket: Ticket, out: Outbox<'_>) -> TunerResult<(), I2C::Error> {
        self.radio.label_timeout(ticket, out)
    }

    /// A sleep-off countdown ran out
    pub fn sleep_expired(&mut self, ticket: Ticket) -> TunerResult<(), I2C::Error> {
        self.radio.sleep_expired(ticket)?;
        self.navigator.invalidate();
        Ok(())
    }

    /// One volume ramp step; returns whether more steps follow
    pub fn ramp_step(&mut self, ticket: Ticket) -> TunerResult<bool, I2C::Error> {
        self.radio.ramp_step(ticket)
    }

    /// Draw the current screen and clear the redraw flag
    pub fn render<D: DisplaySurface>(&mut self, surface: &mut D, out: Outbox<'_>, now: ClockTime) {
        let ctx = Self::context(&mut self.radio, &mut self.favorites, &mut self.alarms, out, now);
        self.navigator.render(surface, &ctx);
        self.navigator.mark_updated();
    }
}
