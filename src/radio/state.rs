//! Radio status shown on screen
//!
//! Immutable state transitions: every update returns a new status.

use crate::event::{Event, RadioTextString, StationName};
use crate::types::{Frequency, Rssi};

/// What the display knows about the current station
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RadioStatus {
    /// Tuned frequency
    frequency: Frequency,
    /// Signal strength at the last tune
    rssi: Rssi,
    /// Chip considered the channel a valid station
    valid: bool,
    /// Stereo pilot present
    stereo: bool,
    /// RDS station name, empty until received
    station_name: StationName,
    /// RDS radio text, empty until received
    radio_text: RadioTextString,
}

impl RadioStatus {
    /// Status for a frequency with nothing received yet
    #[must_use]
    pub const fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            rssi: Rssi(0),
            valid: false,
            stereo: false,
            station_name: StationName::new(),
            radio_text: RadioTextString::new(),
        }
    }

    /// Get tuned frequency
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Get signal strength
    #[must_use]
    pub const fn rssi(&self) -> Rssi {
        self.rssi
    }

    /// Check if the channel is a valid station
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Check if stereo
    #[must_use]
    pub const fn is_stereo(&self) -> bool {
        self.stereo
    }

    /// Get station name
    #[must_use]
    pub fn station_name(&self) -> &str {
        &self.station_name
    }

    /// Get radio text
    #[must_use]
    pub fn radio_text(&self) -> &str {
        &self.radio_text
    }

    /// Retune: new frequency, RDS texts forgotten
    #[must_use]
    pub fn tuning(self, frequency: Frequency) -> Self {
        Self::new(frequency)
    }

    /// Record the result of a finished tune
    #[must_use]
    pub fn with_tuned(self, frequency: Frequency, rssi: Rssi, valid: bool) -> Self {
        let base = if frequency == self.frequency {
            self
        } else {
            Self::new(frequency)
        };
        Self {
            rssi,
            valid,
            ..base
        }
    }

    /// Set stereo indicator
    #[must_use]
    pub fn with_stereo(self, stereo: bool) -> Self {
        Self { stereo, ..self }
    }

    /// Set station name
    #[must_use]
    pub fn with_station_name(self, station_name: StationName) -> Self {
        Self {
            station_name,
            ..self
        }
    }

    /// Set radio text
    #[must_use]
    pub fn with_radio_text(self, radio_text: RadioTextString) -> Self {
        Self { radio_text, ..self }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for RadioStatus {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Status({}, {}, valid={}, '{}')",
            self.frequency,
            self.rssi,
            self.valid,
            self.station_name.as_str()
        );
    }
}

/// Apply a tuner event to the status (returns new status)
///
/// Events that carry no station information leave it unchanged.
#[must_use]
pub fn apply_event(status: RadioStatus, event: &Event) -> RadioStatus {
    match event {
        Event::Tuned {
            frequency,
            rssi,
            valid,
        } => status.with_tuned(*frequency, *rssi, *valid),
        Event::BasicTuningText { text } => status.with_station_name(text.clone()),
        Event::RadioText { text } => status.with_radio_text(text.clone()),
        _ => status,
    }
}
