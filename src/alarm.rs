//! Alarms and the per-second scheduler
//!
//! An alarm fires at most once per day: the scheduler remembers the day
//! number of the last trigger, so clearing a ringing alarm within its
//! minute does not make it ring again.

use embedded_hal::i2c::I2c;
use heapless::Vec;

use crate::config::{ALARM_COUNT, DEFAULT_ALARM_VOLUME};
use crate::radio::Radio;
use crate::task::Outbox;
use crate::tuner::TunerResult;
use crate::types::{ClockTime, TimeOfDay, Volume};

/// Source of wall-clock readings
pub trait WallClock {
    /// Current time
    fn now(&self) -> ClockTime;
}

/// Wall clock derived from uptime plus a fixed offset
///
/// Stands in for a time source; accuracy is whatever the offset was.
#[derive(Clone, Copy, Debug, Default)]
pub struct UptimeClock {
    offset_secs: u64,
}

impl UptimeClock {
    /// Clock reading `start` at uptime zero
    #[must_use]
    pub const fn new(start: ClockTime) -> Self {
        let offset_secs = start.day as u64 * 86_400
            + start.hour as u64 * 3600
            + start.minute as u64 * 60
            + start.second as u64;
        Self { offset_secs }
    }

    /// Time after `uptime_secs` seconds
    #[must_use]
    pub const fn at(&self, uptime_secs: u64) -> ClockTime {
        ClockTime::from_epoch_secs(self.offset_secs + uptime_secs)
    }
}

#[cfg(feature = "embedded")]
impl WallClock for UptimeClock {
    fn now(&self) -> ClockTime {
        self.at(embassy_time::Instant::now().as_secs())
    }
}

/// One wake-up alarm
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Alarm {
    time: Option<TimeOfDay>,
    active: bool,
    ringing: bool,
    volume: Volume,
    last_ring_day: Option<u32>,
    dirty: bool,
}

impl Alarm {
    /// Unset, inactive alarm
    #[must_use]
    pub const fn new() -> Self {
        Self {
            time: None,
            active: false,
            ringing: false,
            volume: DEFAULT_ALARM_VOLUME,
            last_ring_day: None,
            dirty: false,
        }
    }

    /// Get wake-up time
    #[must_use]
    pub const fn time(&self) -> Option<TimeOfDay> {
        self.time
    }

    /// Check if armed
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Check if ringing
    #[must_use]
    pub const fn is_ringing(&self) -> bool {
        self.ringing
    }

    /// Get target volume
    #[must_use]
    pub const fn volume(&self) -> Volume {
        self.volume
    }

    /// Day number of the last trigger
    #[must_use]
    pub const fn last_ring_day(&self) -> Option<u32> {
        self.last_ring_day
    }

    /// Changed since the last save
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Set wake-up time
    pub fn set_time(&mut self, time: TimeOfDay) {
        if self.time != Some(time) {
            self.time = Some(time);
            self.dirty = true;
        }
    }

    /// Forget the wake-up time
    pub fn clear_time(&mut self) {
        if self.time.is_some() {
            self.time = None;
            self.dirty = true;
        }
    }

    /// Arm or disarm
    pub fn set_active(&mut self, active: bool) {
        if self.active != active {
            self.active = active;
            self.dirty = true;
        }
    }

    /// Set target volume
    pub fn set_volume(&mut self, volume: Volume) {
        if self.volume != volume {
            self.volume = volume;
            self.dirty = true;
        }
    }

    /// Whether the alarm fires at `now`
    #[must_use]
    pub fn is_due(&self, now: &ClockTime) -> bool {
        self.active
            && !self.ringing
            && self.last_ring_day != Some(now.day)
            && self.time.is_some_and(|time| time.matches(now))
    }

    /// Fire if due; returns whether it started ringing
    pub fn trigger(&mut self, now: &ClockTime) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.ringing = true;
        self.last_ring_day = Some(now.day);
        true
    }

    /// Stop ringing; returns whether it was ringing
    pub fn dismiss(&mut self) -> bool {
        core::mem::replace(&mut self.ringing, false)
    }

    /// Clear the changed flag after a save
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }
}

impl Default for Alarm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Alarm {
    fn format(&self, f: defmt::Formatter) {
        match self.time {
            Some(time) => defmt::write!(f, "Alarm({}", time),
            None => defmt::write!(f, "Alarm(--:--"),
        }
        defmt::write!(
            f,
            ", active={}, ringing={}, {})",
            self.active,
            self.ringing,
            self.volume
        );
    }
}

/// Indices of alarms that fired in one tick
pub type Triggered = Vec<usize, ALARM_COUNT>;

/// Fixed set of alarms
#[derive(Clone, Debug, Default)]
pub struct AlarmBank {
    alarms: [Alarm; ALARM_COUNT],
}

impl AlarmBank {
    /// All alarms unset
    #[must_use]
    pub const fn new() -> Self {
        Self {
            alarms: [Alarm::new(); ALARM_COUNT],
        }
    }

    /// Number of alarms
    #[must_use]
    pub const fn len(&self) -> usize {
        ALARM_COUNT
    }

    /// Always false; the bank has a fixed size
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        ALARM_COUNT == 0
    }

    /// Get alarm by index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Alarm> {
        self.alarms.get(index)
    }

    /// Get alarm mutably by index
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Alarm> {
        self.alarms.get_mut(index)
    }

    /// Iterate over alarms
    pub fn iter(&self) -> impl Iterator<Item = &Alarm> {
        self.alarms.iter()
    }

    /// Check if any alarm is ringing
    #[must_use]
    pub fn any_ringing(&self) -> bool {
        self.alarms.iter().any(Alarm::is_ringing)
    }

    /// Fire every due alarm
    pub fn tick(&mut self, now: &ClockTime) -> Triggered {
        let mut fired = Triggered::new();
        for (index, alarm) in self.alarms.iter_mut().enumerate() {
            if alarm.trigger(now) {
                // Cannot overflow: one entry per alarm.
                let _ = fired.push(index);
            }
        }
        fired
    }

    /// Silence every ringing alarm; returns whether any was ringing
    pub fn dismiss_all(&mut self) -> bool {
        self.alarms
            .iter_mut()
            .fold(false, |any, alarm| alarm.dismiss() || any)
    }

    /// Any alarm changed since the last save
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.alarms.iter().any(Alarm::is_dirty)
    }

    /// Clear all changed flags after a save
    pub fn mark_saved(&mut self) {
        self.alarms.iter_mut().for_each(Alarm::mark_saved);
    }
}

/// Run the scheduler for one wall-clock second
///
/// Each alarm that fires turns the radio on and starts a volume ramp up
/// to its target. Returns the alarms that fired.
pub fn poll<I2C: I2c>(
    alarms: &mut AlarmBank,
    radio: &mut Radio<I2C>,
    now: &ClockTime,
    out: Outbox<'_>,
) -> TunerResult<Triggered, I2C::Error> {
    let fired = alarms.tick(now);
    for &index in &fired {
        let Some(alarm) = alarms.get(index) else {
            continue;
        };
        info!("alarm {}: ringing at {}", index, now);
        radio.start_ramp(alarm.volume(), out)?;
        radio.power_on()?;
    }
    Ok(fired)
}

/// Silence all alarms, stop the ramp and turn the radio off
///
/// Returns whether anything was ringing.
pub fn dismiss<I2C: I2c>(alarms: &mut AlarmBank, radio: &mut Radio<I2C>) -> TunerResult<bool, I2C::Error> {
    if !alarms.dismiss_all() {
        return Ok(false);
    }
    info!("alarm: dismissed");
    radio.cancel_ramp();
    radio.power_off()?;
    Ok(true)
}
