//! Seek and scan sequencing
//!
//! The chip performs one hardware seek at a time and raises STC when it
//! stops. [`SeekController`] tracks what the caller asked for and turns
//! each completion into a [`SeekOutcome`]. A scan is a chain of
//! non-wrapping upward seeks starting at the bottom of the band, pausing
//! at every station for its name.

use heapless::Vec;

use crate::config::FAVORITE_CAPACITY;
use crate::event::StationName;
use crate::types::{Frequency, SeekDirection};

/// Station found during a scan
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanHit {
    /// Where the seek stopped
    pub frequency: Frequency,
    /// Station name, if one arrived before the label wait expired
    pub label: Option<StationName>,
}

/// Collected scan results
pub type ScanResults = Vec<ScanHit, FAVORITE_CAPACITY>;

/// Scan progress
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanPhase {
    /// Tuning to the bottom of the band
    Starting,
    /// Hardware seek in progress
    Stepping,
    /// Parked on a station until its name arrives or the wait expires
    AwaitingLabel(Frequency),
}

/// Controller state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekState {
    /// No seek in progress
    Idle,
    /// Single seek in progress
    Seeking {
        /// Search direction
        direction: SeekDirection,
        /// Whether the chip wraps at the band edge
        wrap: bool,
    },
    /// Full band scan in progress
    Scanning {
        /// What the scan waits for
        phase: ScanPhase,
        /// Last station the scan stopped at
        last: Option<Frequency>,
    },
}

/// Result of a seek/tune completion
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekOutcome {
    /// A plain tune finished
    Tuned,
    /// A single seek stopped on a station
    Found(Frequency),
    /// A non-wrapping seek hit the band edge without finding anything
    Exhausted,
    /// The scan reached the band start; the first seek should follow
    ScanContinue,
    /// The scan stopped on a station and waits for its name
    ScanStop(Frequency),
    /// The scan covered the whole band; results are ready
    ScanExhausted,
}

#[cfg(feature = "embedded")]
impl defmt::Format for SeekOutcome {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Tuned => defmt::write!(f, "Tuned"),
            Self::Found(freq) => defmt::write!(f, "Found({})", freq),
            Self::Exhausted => defmt::write!(f, "Exhausted"),
            Self::ScanContinue => defmt::write!(f, "ScanContinue"),
            Self::ScanStop(freq) => defmt::write!(f, "ScanStop({})", freq),
            Self::ScanExhausted => defmt::write!(f, "ScanExhausted"),
        }
    }
}

/// Seek/scan state machine
#[derive(Clone, Debug)]
pub struct SeekController {
    state: SeekState,
    results: ScanResults,
}

impl SeekController {
    /// Create an idle controller
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SeekState::Idle,
            results: Vec::new(),
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SeekState {
        self.state
    }

    /// Check if nothing is in progress
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self.state, SeekState::Idle)
    }

    /// Check if a scan is in progress
    #[must_use]
    pub const fn is_scanning(&self) -> bool {
        matches!(self.state, SeekState::Scanning { .. })
    }

    /// Station the scan is parked on, if waiting for a name
    #[must_use]
    pub const fn awaiting_label(&self) -> Option<Frequency> {
        match self.state {
            SeekState::Scanning {
                phase: ScanPhase::AwaitingLabel(freq),
                ..
            } => Some(freq),
            _ => None,
        }
    }

    /// Record a single seek request
    pub fn start_seek(&mut self, direction: SeekDirection, wrap: bool) {
        self.state = SeekState::Seeking { direction, wrap };
    }

    /// Begin a scan; any earlier results are dropped
    ///
    /// The caller tunes to [`Frequency::MIN`] next.
    pub fn start_scan(&mut self) {
        self.results.clear();
        self.state = SeekState::Scanning {
            phase: ScanPhase::Starting,
            last: None,
        };
    }

    /// Record that the next scan seek was issued
    pub fn advance(&mut self) {
        if let SeekState::Scanning { last, .. } = self.state {
            self.state = SeekState::Scanning {
                phase: ScanPhase::Stepping,
                last,
            };
        }
    }

    /// Handle a seek/tune completion
    ///
    /// `band_limit` is the chip's SF/BL flag and `found` the channel it
    /// settled on.
    pub fn on_complete(&mut self, band_limit: bool, found: Frequency) -> SeekOutcome {
        match self.state {
            SeekState::Idle => SeekOutcome::Tuned,
            SeekState::Seeking { wrap, .. } => {
                self.state = SeekState::Idle;
                if band_limit && !wrap {
                    SeekOutcome::Exhausted
                } else {
                    SeekOutcome::Found(found)
                }
            }
            SeekState::Scanning { phase, last } => match phase {
                ScanPhase::Starting => SeekOutcome::ScanContinue,
                // A stale completion while parked changes nothing.
                ScanPhase::AwaitingLabel(freq) => SeekOutcome::ScanStop(freq),
                ScanPhase::Stepping => {
                    let wrapped = last.is_some_and(|last| found <= last);
                    if band_limit || wrapped {
                        self.state = SeekState::Idle;
                        SeekOutcome::ScanExhausted
                    } else {
                        self.state = SeekState::Scanning {
                            phase: ScanPhase::AwaitingLabel(found),
                            last: Some(found),
                        };
                        SeekOutcome::ScanStop(found)
                    }
                }
            },
        }
    }

    /// Record the name (or its absence) for the station the scan is
    /// parked on
    ///
    /// Returns `true` if the scan should continue with the next seek and
    /// `false` if it ended because the result list is full. Does nothing
    /// (and returns `false`) when the scan is not waiting for a name.
    pub fn record_label(&mut self, label: Option<StationName>) -> bool {
        let Some(frequency) = self.awaiting_label() else {
            return false;
        };
        if self.results.push(ScanHit { frequency, label }).is_err() || self.results.is_full() {
            self.state = SeekState::Idle;
            return false;
        }
        self.advance();
        true
    }

    /// Abandon whatever is in progress
    pub fn stop(&mut self) {
        self.state = SeekState::Idle;
    }

    /// Results gathered by the last scan
    #[must_use]
    pub fn results(&self) -> &[ScanHit] {
        &self.results
    }

    /// Hand over the scan results, leaving the list empty
    pub fn take_results(&mut self) -> ScanResults {
        core::mem::take(&mut self.results)
    }
}

impl Default for SeekController {
    fn default() -> Self {
        Self::new()
    }
}
