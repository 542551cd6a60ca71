//! FM Radio Clock Firmware Library
//!
//! Control core for an STM32G474-based FM radio alarm clock built around
//! an Si4703 tuner with RDS, a rotary encoder, a side button and a small
//! OLED.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  Clock  │  Interceptor chain  │  Navigator / Modes          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     SERVICE LAYER                            │
//! │  Radio (seek/scan, RDS, timers)  │  Alarms  │  Persistence   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   DRIVER / INPUT LAYER                       │
//! │  Si4703 registers  │  Rotary/buttons  │  Event queue        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │           embassy-rs (async/await executor)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Interrupt-side producers push [`event::Event`]s into a bounded queue.
//! One consumer task drains it, runs each event through the
//! [`intercept::InterceptorChain`] and hands what survives to the
//! [`ui::Navigator`].
//!
//! # Design Principles
//!
//! - **Allocation-free**: bounded `heapless` containers throughout
//! - **Type-driven design**: custom types enforce ranges at construction
//! - **No unsafe in application code**
//! - **Functional core, imperative shell**: hardware only behind traits
//! - **Explicit error handling**: bus failures surface as `Result`

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Must come first so the logging macros are visible everywhere
#[macro_use]
mod fmt;

// Re-export dependencies needed by the firmware binary
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Peripheral Drivers
///
/// OLED display and input pin glue.
#[cfg(feature = "embedded")]
pub mod drivers;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Events and the bounded event queue
pub mod event;

/// Rotary encoder and button decoding
pub mod input;

/// Cancellable timer slots and timer requests
pub mod task;

/// Si4703 tuner: registers, RDS, seek
pub mod tuner;

/// Radio Control Logic
///
/// Radio service, station list and display status.
pub mod radio;

/// Alarms and the per-second scheduler
pub mod alarm;

/// Event interceptors run ahead of the navigator
pub mod intercept;

/// User Interface
///
/// Application/mode navigation and screen layouts.
pub mod ui;

/// Settings persistence
pub mod persist;

/// Whole-device state
pub mod app;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    pub use crate::app::Clock;
    pub use crate::event::{Event, EventQueue};
    pub use crate::task::{Outbox, TimerRequests};
    pub use crate::tuner::{TunerError, TunerResult};

    // Common traits
    pub use embedded_hal::i2c::I2c;

    // Embassy
    #[cfg(feature = "embedded")]
    pub use embassy_time::{Duration, Instant, Timer};
}
