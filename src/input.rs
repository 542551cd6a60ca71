//! Rotary encoder and button decoding
//!
//! Pure edge decoders used from interrupt context. They turn raw pin
//! levels into [`Event`]s and keep only the minimal state needed to do so.

use crate::config::FAST_ROTATION_MS;
use crate::event::Event;

/// Encoder rotation direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Clockwise rotation (increment)
    Clockwise,
    /// Counter-clockwise rotation (decrement)
    CounterClockwise,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Direction {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Clockwise => defmt::write!(f, "CW"),
            Self::CounterClockwise => defmt::write!(f, "CCW"),
        }
    }
}

/// Decodes falling edges on the encoder A pin into rotation events
///
/// On an A falling edge the level of B gives the direction: B high means
/// clockwise, B low counter-clockwise. A detent arriving within
/// [`FAST_ROTATION_MS`] of the previous one is flagged `fast`.
#[derive(Clone, Copy, Debug)]
pub struct RotaryDecoder {
    /// Fast rotation threshold in milliseconds
    threshold_ms: u32,
    /// Timestamp of the last decoded detent
    last_rotation_ms: Option<u32>,
}

impl RotaryDecoder {
    /// Create a decoder with the default fast threshold
    #[must_use]
    pub const fn new() -> Self {
        Self::with_threshold(FAST_ROTATION_MS)
    }

    /// Create a decoder with a custom fast threshold
    #[must_use]
    pub const fn with_threshold(threshold_ms: u32) -> Self {
        Self {
            threshold_ms,
            last_rotation_ms: None,
        }
    }

    /// Direction for the pin levels sampled at an A edge
    ///
    /// Only a low A level is a valid falling edge; bounce that reads A
    /// high again is ignored.
    #[must_use]
    pub const fn direction(a: bool, b: bool) -> Option<Direction> {
        match (a, b) {
            (false, true) => Some(Direction::Clockwise),
            (false, false) => Some(Direction::CounterClockwise),
            _ => None,
        }
    }

    /// Handle an A-pin falling edge sampled at `now_ms`
    pub fn on_edge(&mut self, a: bool, b: bool, now_ms: u32) -> Option<Event> {
        let direction = Self::direction(a, b)?;
        let fast = self
            .last_rotation_ms
            .is_some_and(|last| now_ms.wrapping_sub(last) < self.threshold_ms);
        self.last_rotation_ms = Some(now_ms);

        Some(match direction {
            Direction::Clockwise => Event::RotateCw { fast },
            Direction::CounterClockwise => Event::RotateCcw { fast },
        })
    }

    /// Forget the last detent timestamp
    pub fn reset(&mut self) {
        self.last_rotation_ms = None;
    }
}

impl Default for RotaryDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Which physical button a [`ButtonDecoder`] watches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonKind {
    /// Push switch of the rotary encoder
    Rotary,
    /// Side (back) button
    Side,
}

/// Button state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonState {
    /// Button is released
    Released,
    /// Button is pressed
    Pressed,
}

#[cfg(feature = "embedded")]
impl defmt::Format for ButtonState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Released => defmt::write!(f, "Released"),
            Self::Pressed => defmt::write!(f, "Pressed"),
        }
    }
}

/// Turns both-edge button interrupts into press/release events
///
/// Buttons are active low with pull-ups. An edge that reports the same
/// level as the previous one is contact bounce and produces nothing.
#[derive(Clone, Copy, Debug)]
pub struct ButtonDecoder {
    kind: ButtonKind,
    state: ButtonState,
}

impl ButtonDecoder {
    /// Create a decoder, initially released
    #[must_use]
    pub const fn new(kind: ButtonKind) -> Self {
        Self {
            kind,
            state: ButtonState::Released,
        }
    }

    /// Handle an edge with the pin level sampled after it
    pub fn on_edge(&mut self, level_high: bool) -> Option<Event> {
        let state = if level_high {
            ButtonState::Released
        } else {
            ButtonState::Pressed
        };
        if state == self.state {
            return None;
        }
        self.state = state;

        Some(match (self.kind, state) {
            (ButtonKind::Rotary, ButtonState::Pressed) => Event::RotaryPush,
            (ButtonKind::Rotary, ButtonState::Released) => Event::RotaryRelease,
            (ButtonKind::Side, ButtonState::Pressed) => Event::SidePush,
            (ButtonKind::Side, ButtonState::Released) => Event::SideRelease,
        })
    }

    /// Current debounced state
    #[must_use]
    pub const fn state(&self) -> ButtonState {
        self.state
    }

    /// Check if button is currently pressed
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.state == ButtonState::Pressed
    }
}
