//! Radio service
//!
//! Owns the tuner and everything that reacts to it: RDS decoding, seek
//! and scan sequencing, the status shown on screen, and the three timer
//! slots (label wait, sleep-off, volume ramp).
//!
//! "Power" here is the listening state. The chip stays enabled while the
//! radio is off; it is muted with RDS disabled, so powering on needs no
//! crystal or settle delay.
//!
//! The alarm ramp drives the chip volume only. The listening volume is
//! untouched and comes back on the next power-on or volume change.

use embedded_hal::i2c::I2c;

use super::state::{apply_event, RadioStatus};
use crate::config::{default_frequency, DEFAULT_VOLUME, RAMP_STEP};
use crate::event::{Event, StationName};
use crate::task::{Outbox, TaskSlot, Ticket};
use crate::tuner::rds::RdsDecoder;
use crate::tuner::seek::{ScanResults, SeekController, SeekOutcome};
use crate::tuner::si4703::{Si4703, TunerStatus};
use crate::tuner::TunerResult;
use crate::types::{Frequency, SeekDirection, Volume};

/// Volume ramp in progress
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ramp {
    /// Volume the ramp stops at
    pub target: Volume,
    /// Volume currently on the chip
    pub level: Volume,
}

/// FM radio built on an Si4703
pub struct Radio<I2C> {
    tuner: Si4703<I2C>,
    rds: RdsDecoder,
    seek: SeekController,
    status: RadioStatus,
    powered: bool,
    volume: Volume,
    frequency: Frequency,
    label_wait: TaskSlot<Frequency>,
    sleep: TaskSlot<u16>,
    ramp: TaskSlot<Ramp>,
    dirty: bool,
}

impl<I2C: I2c> Radio<I2C> {
    /// Wrap an initialised tuner; the radio starts off
    #[must_use]
    pub fn new(tuner: Si4703<I2C>) -> Self {
        let frequency = default_frequency();
        Self {
            tuner,
            rds: RdsDecoder::new(),
            seek: SeekController::new(),
            status: RadioStatus::new(frequency),
            powered: false,
            volume: DEFAULT_VOLUME,
            frequency,
            label_wait: TaskSlot::new(),
            sleep: TaskSlot::new(),
            ramp: TaskSlot::new(),
            dirty: false,
        }
    }

    /// Load persisted settings without touching the chip or the dirty flag
    pub fn restore(&mut self, volume: Volume, frequency: Frequency) {
        self.volume = volume;
        self.frequency = frequency;
        self.status = RadioStatus::new(frequency);
    }

    /// Underlying tuner
    #[must_use]
    pub const fn tuner(&self) -> &Si4703<I2C> {
        &self.tuner
    }

    /// Underlying tuner, mutably
    pub fn tuner_mut(&mut self) -> &mut Si4703<I2C> {
        &mut self.tuner
    }

    /// Status shown on screen
    #[must_use]
    pub const fn status(&self) -> &RadioStatus {
        &self.status
    }

    /// Fold a tuner event into the on-screen status
    pub fn apply_status(&mut self, event: &Event) {
        let status = core::mem::replace(&mut self.status, RadioStatus::new(self.frequency));
        self.status = apply_event(status, event);
    }

    /// Seek/scan state
    #[must_use]
    pub const fn seek_state(&self) -> &SeekController {
        &self.seek
    }

    /// Check if the radio is on
    #[must_use]
    pub const fn is_on(&self) -> bool {
        self.powered
    }

    /// Listening volume
    #[must_use]
    pub const fn volume(&self) -> Volume {
        self.volume
    }

    /// Frequency to return to (last tuned or stored)
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Volume or frequency changed since the last save
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the changed flag after a save
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    // ------------------------------------------------------------------
    // Power and volume
    // ------------------------------------------------------------------

    /// Unmute and tune to the stored frequency
    pub fn power_on(&mut self) -> TunerResult<(), I2C::Error> {
        if self.powered {
            return Ok(());
        }
        let output = self.ramp.state().map_or(self.volume, |ramp| ramp.level);
        self.tuner.set_volume(output)?;
        self.tuner.mute(false)?;
        self.retune(self.frequency)?;
        self.powered = true;
        info!("radio: on at {}", self.frequency);
        Ok(())
    }

    /// Mute, stop any seek and cancel every timer
    pub fn power_off(&mut self) -> TunerResult<(), I2C::Error> {
        self.label_wait.cancel();
        self.sleep.cancel();
        self.ramp.cancel();
        self.seek.stop();
        self.rds.reset();
        if !self.powered {
            return Ok(());
        }
        self.powered = false;
        self.status = RadioStatus::new(self.frequency);
        self.tuner.mute(true)?;
        self.tuner.finish_tune()?;
        self.tuner.enable_rds(false)?;
        info!("radio: off");
        Ok(())
    }

    /// Switch power state; returns the new state
    pub fn toggle_power(&mut self) -> TunerResult<bool, I2C::Error> {
        if self.powered {
            self.power_off()?;
        } else {
            self.power_on()?;
        }
        Ok(self.powered)
    }

    /// Set the listening volume; ends any alarm ramp
    pub fn set_volume(&mut self, volume: Volume) -> TunerResult<(), I2C::Error> {
        if self.ramp.cancel().is_some() {
            debug!("radio: ramp ended by volume change");
        }
        if volume != self.volume {
            self.volume = volume;
            self.dirty = true;
        }
        if self.powered {
            self.tuner.set_volume(volume)?;
        }
        Ok(())
    }

    /// Change the volume by `delta`, clamped
    ///
    /// While on, steps from what is playing so a ramped alarm is adjusted
    /// from its current level.
    pub fn adjust_volume(&mut self, delta: i32) -> TunerResult<Volume, I2C::Error> {
        let base = if self.powered { self.tuner.volume() } else { self.volume };
        let volume = base.step(delta);
        self.set_volume(volume)?;
        debug!("radio: volume {}", volume);
        Ok(volume)
    }

    // ------------------------------------------------------------------
    // Tuning
    // ------------------------------------------------------------------

    /// Tune to a frequency and remember it
    pub fn tune(&mut self, frequency: Frequency) -> TunerResult<(), I2C::Error> {
        self.label_wait.cancel();
        self.seek.stop();
        if frequency != self.frequency {
            self.frequency = frequency;
            self.dirty = true;
        }
        self.retune(frequency)
    }

    /// Move by `channels`, wrapping at the band edges
    pub fn tune_by(&mut self, channels: i32) -> TunerResult<Frequency, I2C::Error> {
        let frequency = self.frequency.step_channels(channels);
        self.tune(frequency)?;
        Ok(frequency)
    }

    fn retune(&mut self, frequency: Frequency) -> TunerResult<(), I2C::Error> {
        self.rds.reset();
        self.status = RadioStatus::new(frequency);
        self.tuner.enable_rds(false)?;
        self.tuner.set_frequency(frequency)
    }

    /// Start a single hardware seek
    pub fn seek(&mut self, direction: SeekDirection, wrap: bool) -> TunerResult<(), I2C::Error> {
        self.label_wait.cancel();
        self.rds.reset();
        self.seek.start_seek(direction, wrap);
        self.tuner.enable_rds(false)?;
        self.tuner.start_seek(direction, wrap)
    }

    /// Start a full band scan from the bottom edge
    pub fn scan(&mut self) -> TunerResult<(), I2C::Error> {
        self.label_wait.cancel();
        self.rds.reset();
        self.seek.start_scan();
        info!("radio: scan started");
        self.status = RadioStatus::new(Frequency::MIN);
        self.tuner.enable_rds(false)?;
        self.tuner.set_frequency(Frequency::MIN)
    }

    /// Abandon a seek or scan and go back to the stored frequency
    pub fn stop_seek(&mut self) -> TunerResult<(), I2C::Error> {
        self.label_wait.cancel();
        if self.seek.is_idle() {
            return Ok(());
        }
        self.seek.stop();
        self.tuner.finish_tune()?;
        self.retune(self.frequency)
    }

    /// Hand over the stations found by the last scan
    pub fn take_scan_results(&mut self) -> ScanResults {
        self.seek.take_results()
    }

    // ------------------------------------------------------------------
    // Interrupt
    // ------------------------------------------------------------------

    /// Service the tuner interrupt line
    ///
    /// Reads the status block once, then handles RDS data and seek/tune
    /// completion independently; both may be flagged at once.
    pub fn handle_interrupt(&mut self, out: Outbox<'_>) -> TunerResult<(), I2C::Error> {
        let status = self.tuner.read_status()?;

        if status.rds_ready && self.tuner.rds_enabled() {
            if let Some(event) = self.rds.decode(self.tuner.registers()) {
                if let Event::BasicTuningText { text } = &event {
                    if self.seek.awaiting_label().is_some() {
                        let label = text.clone();
                        self.label_wait.cancel();
                        out.push(event);
                        // A new seek is now running; any STC in this
                        // snapshot predates it.
                        return self.continue_scan(Some(label), out);
                    }
                }
                out.push(event);
            }
        }

        if status.seek_tune_complete {
            self.tuner.finish_tune()?;
            self.on_seek_tune_complete(&status, out)?;
        }
        Ok(())
    }

    fn on_seek_tune_complete(&mut self, status: &TunerStatus, out: Outbox<'_>) -> TunerResult<(), I2C::Error> {
        let found = status.frequency();
        let outcome = self.seek.on_complete(status.band_limit, found);
        debug!("radio: {}", outcome);

        match outcome {
            SeekOutcome::Tuned => {
                self.tuner.enable_rds(true)?;
                self.push_tuned(found, status, !status.afc_railed, out);
            }
            SeekOutcome::Found(frequency) => {
                if frequency != self.frequency {
                    self.frequency = frequency;
                    self.dirty = true;
                }
                self.tuner.enable_rds(true)?;
                self.push_tuned(frequency, status, true, out);
            }
            SeekOutcome::Exhausted => {
                info!("radio: no station found");
                out.push(Event::SeekComplete);
                self.retune(self.frequency)?;
            }
            SeekOutcome::ScanContinue => {
                self.seek.advance();
                self.tuner.start_seek(SeekDirection::Up, false)?;
            }
            SeekOutcome::ScanStop(frequency) => {
                self.tuner.enable_rds(true)?;
                self.push_tuned(frequency, status, true, out);
                let ticket = self.label_wait.start(frequency);
                out.timers.request_label_wait(ticket);
            }
            SeekOutcome::ScanExhausted => {
                info!("radio: scan done, {} stations", self.seek.results().len());
                out.push(Event::SeekComplete);
                self.retune(self.frequency)?;
            }
        }
        Ok(())
    }

    fn push_tuned(&mut self, frequency: Frequency, status: &TunerStatus, valid: bool, out: Outbox<'_>) {
        self.status = RadioStatus::new(frequency).with_stereo(status.stereo);
        out.push(Event::Tuned {
            frequency,
            rssi: status.rssi,
            valid,
        });
    }

    /// The label wait identified by `ticket` expired
    ///
    /// Records the parked station without a name and moves the scan on.
    /// A stale ticket does nothing.
    pub fn label_timeout(&mut self, ticket: Ticket, out: Outbox<'_>) -> TunerResult<(), I2C::Error> {
        if self.label_wait.complete(ticket).is_none() {
            return Ok(());
        }
        out.push(Event::Timeout);
        self.continue_scan(None, out)
    }

    fn continue_scan(&mut self, label: Option<StationName>, out: Outbox<'_>) -> TunerResult<(), I2C::Error> {
        if self.seek.record_label(label) {
            self.rds.reset();
            self.tuner.enable_rds(false)?;
            self.tuner.start_seek(SeekDirection::Up, false)
        } else {
            info!("radio: scan list full");
            out.push(Event::SeekComplete);
            self.retune(self.frequency)
        }
    }

    // ------------------------------------------------------------------
    // Sleep timer
    // ------------------------------------------------------------------

    /// Arm the sleep-off countdown; zero minutes cancels it
    pub fn start_sleep(&mut self, minutes: u16, out: Outbox<'_>) {
        if minutes == 0 {
            self.sleep.cancel();
            return;
        }
        let ticket = self.sleep.start(minutes);
        out.timers.request_sleep_off(ticket, minutes);
        info!("radio: sleep in {} min", minutes);
    }

    /// Cancel the sleep-off countdown
    pub fn cancel_sleep(&mut self) -> Option<u16> {
        self.sleep.cancel()
    }

    /// Minutes the armed countdown was started with
    #[must_use]
    pub const fn sleep_minutes(&self) -> Option<u16> {
        match self.sleep.state() {
            Some(minutes) => Some(*minutes),
            None => None,
        }
    }

    /// The countdown identified by `ticket` ran out
    pub fn sleep_expired(&mut self, ticket: Ticket) -> TunerResult<(), I2C::Error> {
        if self.sleep.complete(ticket).is_some() {
            info!("radio: sleep timer expired");
            self.power_off()?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Volume ramp
    // ------------------------------------------------------------------

    /// Start raising the volume from 1 up to `target`
    pub fn start_ramp(&mut self, target: Volume, out: Outbox<'_>) -> TunerResult<Ticket, I2C::Error> {
        let start = Volume::clamped(1).min(target);
        let ticket = self.ramp.start(Ramp { target, level: start });
        if self.powered {
            self.tuner.set_volume(start)?;
        }
        out.timers.request_ramp(ticket);
        Ok(ticket)
    }

    /// Perform one ramp step; returns whether more steps follow
    ///
    /// The ramp ends when the target is reached, the radio was turned
    /// off, or the ramp was cancelled or restarted.
    pub fn ramp_step(&mut self, ticket: Ticket) -> TunerResult<bool, I2C::Error> {
        if !self.ramp.is_live(ticket) {
            return Ok(false);
        }
        if !self.powered {
            self.ramp.cancel();
            return Ok(false);
        }
        let Some(ramp) = self.ramp.state_mut() else {
            return Ok(false);
        };
        let volume = ramp.level.step(i32::from(RAMP_STEP)).min(ramp.target);
        ramp.level = volume;
        let target = ramp.target;
        self.tuner.set_volume(volume)?;
        if volume >= target {
            self.ramp.complete(ticket);
            return Ok(false);
        }
        Ok(true)
    }

    /// Stop the volume ramp at its current level
    pub fn cancel_ramp(&mut self) -> Option<Ramp> {
        self.ramp.cancel()
    }

    /// Check if a ramp is running
    #[must_use]
    pub const fn is_ramping(&self) -> bool {
        self.ramp.is_active()
    }
}
