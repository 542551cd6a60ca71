//! Event interceptor chain
//!
//! Interceptors see every event before the navigator does. Each one
//! either consumes the event or hands it on unchanged. The order is
//! fixed: radio/volume first, then alarm dismissal.

use embedded_hal::i2c::I2c;

use crate::alarm;
use crate::event::Event;
use crate::tuner::TunerResult;
use crate::ui::Context;

/// One stage of the chain
pub trait Interceptor<I2C: I2c> {
    /// Return `None` to consume the event, or the event to pass it on
    fn intercept(&mut self, event: Event, ctx: &mut Context<'_, I2C>) -> TunerResult<Option<Event>, I2C::Error>;
}

/// Radio status refresh and the press-and-turn volume gesture
///
/// Active only while the radio is on. A rotary press latches volume
/// adjustment; rotations while latched change the volume. The release
/// that ends the gesture is swallowed if the volume changed, otherwise
/// it passes on as an ordinary click.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VolumeInterceptor {
    latched: bool,
    adjusted: bool,
}

impl VolumeInterceptor {
    /// Unlatched interceptor
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latched: false,
            adjusted: false,
        }
    }

    /// Check if the volume gesture is in progress
    #[must_use]
    pub const fn is_latched(&self) -> bool {
        self.latched
    }

    /// Check if the volume changed since the gesture began
    #[must_use]
    pub const fn is_adjusted(&self) -> bool {
        self.adjusted
    }
}

impl<I2C: I2c> Interceptor<I2C> for VolumeInterceptor {
    fn intercept(&mut self, event: Event, ctx: &mut Context<'_, I2C>) -> TunerResult<Option<Event>, I2C::Error> {
        if !ctx.radio.is_on() {
            *self = Self::new();
            return Ok(Some(event));
        }

        match event {
            Event::Tuned { .. } | Event::BasicTuningText { .. } | Event::RadioText { .. } => {
                ctx.radio.apply_status(&event);
                Ok(None)
            }
            Event::RotaryPush => {
                self.latched = true;
                self.adjusted = false;
                Ok(None)
            }
            Event::RotaryRelease if self.latched => {
                let adjusted = self.adjusted;
                *self = Self::new();
                if adjusted {
                    Ok(None)
                } else {
                    Ok(Some(event))
                }
            }
            _ => match event.rotation() {
                Some(steps) if self.latched => {
                    let volume = ctx.radio.adjust_volume(steps)?;
                    trace!("volume {}", volume);
                    self.adjusted = true;
                    Ok(None)
                }
                _ => Ok(Some(event)),
            },
        }
    }
}

/// Swallows the side button and dismisses alarms while one rings
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlarmInterceptor;

impl<I2C: I2c> Interceptor<I2C> for AlarmInterceptor {
    fn intercept(&mut self, event: Event, ctx: &mut Context<'_, I2C>) -> TunerResult<Option<Event>, I2C::Error> {
        if !ctx.alarms.any_ringing() {
            return Ok(Some(event));
        }
        match event {
            Event::SideRelease => Ok(None),
            Event::RotaryRelease => {
                alarm::dismiss(ctx.alarms, ctx.radio)?;
                Ok(None)
            }
            other => Ok(Some(other)),
        }
    }
}

/// The fixed interceptor sequence
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InterceptorChain {
    /// First stage
    pub volume: VolumeInterceptor,
    /// Second stage
    pub alarm: AlarmInterceptor,
}

impl InterceptorChain {
    /// Fresh chain
    #[must_use]
    pub const fn new() -> Self {
        Self {
            volume: VolumeInterceptor::new(),
            alarm: AlarmInterceptor,
        }
    }

    /// Run every stage; `None` means some stage consumed the event
    pub fn run<I2C: I2c>(&mut self, event: Event, ctx: &mut Context<'_, I2C>) -> TunerResult<Option<Event>, I2C::Error> {
        let Some(event) = self.volume.intercept(event, ctx)? else {
            return Ok(None);
        };
        self.alarm.intercept(event, ctx)
    }
}
