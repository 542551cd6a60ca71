//! Shared types used across the FM clock firmware
//!
//! This module defines domain-specific types that enforce invariants
//! at compile time and provide type safety throughout the codebase.

use core::fmt;
#[cfg(feature = "embedded")]
use micromath::F32Ext;

/// Lower band edge in MHz (Europe/US wide band)
pub const BAND_LOW_MHZ: f32 = 87.5;

/// Channel spacing in MHz
pub const CHANNEL_SPACING_MHZ: f32 = 0.1;

/// Convert a frequency in MHz to a tuner channel number
///
/// `channel = round((freq - 87.5) * 10)`, saturating at the edges of the
/// 10-bit channel field.
#[must_use]
pub fn freq_to_channel(mhz: f32) -> u16 {
    let steps = ((mhz - BAND_LOW_MHZ) / CHANNEL_SPACING_MHZ).round();
    if steps <= 0.0 {
        0
    } else if steps >= f32::from(Channel::FIELD_MASK) {
        Channel::FIELD_MASK
    } else {
        steps as u16
    }
}

/// Convert a tuner channel number to a frequency in MHz
#[must_use]
pub fn channel_to_freq(channel: u16) -> f32 {
    BAND_LOW_MHZ + f32::from(channel & Channel::FIELD_MASK) * CHANNEL_SPACING_MHZ
}

/// Frequency in Hertz with validation
///
/// Represents a valid frequency within the FM broadcast band.
/// The frequency is stored in Hz for precision.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Frequency(u32);

impl Frequency {
    /// Minimum supported frequency (87.5 MHz)
    pub const MIN_HZ: u32 = 87_500_000;

    /// Maximum supported frequency (108 MHz)
    pub const MAX_HZ: u32 = 108_000_000;

    /// Channel spacing (100 kHz)
    pub const SPACING_HZ: u32 = 100_000;

    /// Lowest frequency in the band
    pub const MIN: Self = Self(Self::MIN_HZ);

    /// Highest frequency in the band
    pub const MAX: Self = Self(Self::MAX_HZ);

    /// Create a new Frequency from Hz, returns None if out of range
    #[must_use]
    pub const fn from_hz(hz: u32) -> Option<Self> {
        if hz >= Self::MIN_HZ && hz <= Self::MAX_HZ {
            Some(Self(hz))
        } else {
            None
        }
    }

    /// Create a new Frequency from kHz
    #[must_use]
    pub const fn from_khz(khz: u32) -> Option<Self> {
        match khz.checked_mul(1000) {
            Some(hz) => Self::from_hz(hz),
            None => None,
        }
    }

    /// Create a frequency from MHz, snapped to the channel raster
    #[must_use]
    pub fn from_mhz(mhz: f32) -> Option<Self> {
        if !(BAND_LOW_MHZ - 0.05..=108.05).contains(&mhz) {
            return None;
        }
        Self::from_channel(Channel::from_raw(freq_to_channel(mhz)))
    }

    /// Frequency of a tuner channel, None if the channel lies above the band
    #[must_use]
    pub const fn from_channel(channel: Channel) -> Option<Self> {
        Self::from_hz(Self::MIN_HZ + channel.raw() as u32 * Self::SPACING_HZ)
    }

    /// Get the frequency in Hz
    #[must_use]
    pub const fn as_hz(self) -> u32 {
        self.0
    }

    /// Get the frequency in kHz (truncated)
    #[must_use]
    pub const fn as_khz(self) -> u32 {
        self.0 / 1000
    }

    /// Get the frequency in MHz as floating point
    #[must_use]
    pub fn as_mhz_f32(self) -> f32 {
        self.0 as f32 / 1_000_000.0
    }

    /// Whole MHz and tenths, e.g. `(98, 2)` for 98.2 MHz
    #[must_use]
    pub const fn mhz_tenths(self) -> (u32, u32) {
        (self.0 / 1_000_000, (self.0 / 100_000) % 10)
    }

    /// Tuner channel for this frequency
    #[must_use]
    pub const fn channel(self) -> Channel {
        let steps = (self.0 - Self::MIN_HZ + Self::SPACING_HZ / 2) / Self::SPACING_HZ;
        Channel::from_raw(steps as u16)
    }

    /// Move by `steps` channels, wrapping around the band edges
    #[must_use]
    pub fn step_channels(self, steps: i32) -> Self {
        let count = i32::from(Channel::BAND_MAX.raw()) + 1;
        let current = i32::from(self.channel().raw());
        let next = (current + steps).rem_euclid(count);
        Self::from_channel(Channel::from_raw(next as u16)).unwrap_or(Self::MIN)
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({} Hz)", self.0)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (mhz, tenths) = self.mhz_tenths();
        write!(f, "{mhz}.{tenths}")
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Frequency {
    fn format(&self, f: defmt::Formatter) {
        let (mhz, tenths) = self.mhz_tenths();
        defmt::write!(f, "{}.{} MHz", mhz, tenths);
    }
}

/// Tuner channel number (10-bit CHAN field)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Channel(u16);

impl Channel {
    /// Width mask of the CHAN/READCHAN fields
    pub const FIELD_MASK: u16 = 0x03FF;

    /// Last channel of the 87.5-108 MHz band at 100 kHz spacing
    pub const BAND_MAX: Self = Self(205);

    /// Create from a raw register value (masked to 10 bits)
    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw & Self::FIELD_MASK)
    }

    /// Raw channel number
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Channel {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "ch{}", self.0);
    }
}

/// Audio volume (4-bit VOLUME field, 0-15)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Volume(u8);

impl Volume {
    /// Silent
    pub const MIN: Self = Self(0);

    /// Loudest setting the chip supports
    pub const MAX: Self = Self(15);

    /// Create a volume, clamping any input to 0-15
    #[must_use]
    pub const fn clamped(level: i32) -> Self {
        if level < 0 {
            Self::MIN
        } else if level > Self::MAX.0 as i32 {
            Self::MAX
        } else {
            Self(level as u8)
        }
    }

    /// Get the level
    #[must_use]
    pub const fn level(self) -> u8 {
        self.0
    }

    /// Adjust by a signed amount, clamped
    #[must_use]
    pub const fn step(self, delta: i32) -> Self {
        Self::clamped(self.0 as i32 + delta)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Volume {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "vol{}", self.0);
    }
}

/// Received signal strength (dBµV, 0-75 typical)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Rssi(pub u8);

#[cfg(feature = "embedded")]
impl defmt::Format for Rssi {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}dBuV", self.0);
    }
}

/// Seek direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekDirection {
    /// Towards higher frequencies
    Up,
    /// Towards lower frequencies
    Down,
}

#[cfg(feature = "embedded")]
impl defmt::Format for SeekDirection {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Up => defmt::write!(f, "up"),
            Self::Down => defmt::write!(f, "down"),
        }
    }
}

/// Wall-clock reading handed to the scheduler
///
/// `day` is a monotonically increasing day number; it only needs to
/// change at midnight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ClockTime {
    /// Day number
    pub day: u32,
    /// Hour (0-23)
    pub hour: u8,
    /// Minute (0-59)
    pub minute: u8,
    /// Second (0-59)
    pub second: u8,
}

impl ClockTime {
    /// Create a clock reading
    #[must_use]
    pub const fn new(day: u32, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            day,
            hour,
            minute,
            second,
        }
    }

    /// Build from seconds elapsed since midnight of day 0
    #[must_use]
    pub const fn from_epoch_secs(secs: u64) -> Self {
        let day = secs / 86_400;
        let rem = secs % 86_400;
        Self {
            day: day as u32,
            hour: (rem / 3600) as u8,
            minute: ((rem / 60) % 60) as u8,
            second: (rem % 60) as u8,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ClockTime {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "d{} {:02}:{:02}:{:02}",
            self.day,
            self.hour,
            self.minute,
            self.second
        );
    }
}

/// Hour and minute of day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TimeOfDay {
    /// Hour (0-23)
    pub hour: u8,
    /// Minute (0-59)
    pub minute: u8,
}

impl TimeOfDay {
    /// Create a time of day, None if out of range
    #[must_use]
    pub const fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Check whether a clock reading falls inside this minute
    #[must_use]
    pub const fn matches(self, now: &ClockTime) -> bool {
        self.hour == now.hour && self.minute == now.minute
    }

    /// Add hours, wrapping at midnight
    #[must_use]
    pub const fn add_hours(self, delta: i32) -> Self {
        let hour = (self.hour as i32 + delta).rem_euclid(24);
        Self {
            hour: hour as u8,
            minute: self.minute,
        }
    }

    /// Add minutes within the hour, wrapping at 60
    #[must_use]
    pub const fn add_minutes(self, delta: i32) -> Self {
        let minute = (self.minute as i32 + delta).rem_euclid(60);
        Self {
            hour: self.hour,
            minute: minute as u8,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TimeOfDay {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{:02}:{:02}", self.hour, self.minute);
    }
}
