//! Rotary Encoder and Button Driver
//!
//! Binds EXTI pins to the edge decoders in [`crate::input`]. Each driver
//! waits for its edge, samples the pins and hands back a ready event.

use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::Input;
use embassy_time::{Duration, Instant, Timer};

use crate::config::BUTTON_DEBOUNCE_MS;
use crate::event::Event;
use crate::input::{ButtonDecoder, ButtonKind, RotaryDecoder};

/// Encoder A/B pair
pub struct Encoder<'d> {
    /// A phase, falling-edge interrupt
    a_pin: ExtiInput<'d>,
    /// B phase, sampled at each A edge
    b_pin: Input<'d>,
    decoder: RotaryDecoder,
}

impl<'d> Encoder<'d> {
    /// Create a new encoder driver
    #[must_use]
    pub fn new(a_pin: ExtiInput<'d>, b_pin: Input<'d>) -> Self {
        Self {
            a_pin,
            b_pin,
            decoder: RotaryDecoder::new(),
        }
    }

    /// Wait for the next detent
    pub async fn next_event(&mut self) -> Event {
        loop {
            self.a_pin.wait_for_falling_edge().await;
            let now_ms = Instant::now().as_millis() as u32;
            if let Some(event) = self
                .decoder
                .on_edge(self.a_pin.is_high(), self.b_pin.is_high(), now_ms)
            {
                return event;
            }
        }
    }
}

/// Active-low push button on a both-edge interrupt
pub struct Button<'d> {
    pin: ExtiInput<'d>,
    decoder: ButtonDecoder,
}

impl<'d> Button<'d> {
    /// Create a new button driver
    #[must_use]
    pub fn new(pin: ExtiInput<'d>, kind: ButtonKind) -> Self {
        Self {
            pin,
            decoder: ButtonDecoder::new(kind),
        }
    }

    /// Wait for the next press or release
    pub async fn next_event(&mut self) -> Event {
        loop {
            self.pin.wait_for_any_edge().await;
            Timer::after(Duration::from_millis(u64::from(BUTTON_DEBOUNCE_MS))).await;
            if let Some(event) = self.decoder.on_edge(self.pin.is_high()) {
                return event;
            }
        }
    }

    /// Check if button is currently pressed
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.decoder.is_pressed()
    }
}
