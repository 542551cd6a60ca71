//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the FM clock hardware.
//! All pin mappings, timings, and capacity limits are centralized here.

use crate::types::{Frequency, Volume};

/// I2C bus frequency for the Si4703 (standard mode)
pub const I2C_FREQUENCY_HZ: u32 = 100_000;

/// Si4703 I2C address
pub const SI4703_I2C_ADDR: u8 = 0x10;

/// SSD1306 OLED I2C address
pub const DISPLAY_I2C_ADDR: u8 = 0x3C;

/// Display width in pixels
pub const DISPLAY_WIDTH: u32 = 128;

/// Display height in pixels
pub const DISPLAY_HEIGHT: u32 = 64;

/// Event queue capacity; older events are evicted beyond this
pub const EVENT_QUEUE_CAPACITY: usize = 10;

/// Rotations closer together than this are reported as fast
pub const FAST_ROTATION_MS: u32 = 50;

/// Reset line low/high hold time
pub const TUNER_RESET_MS: u64 = 100;

/// Crystal oscillator stabilization delay after setting XOSCEN
pub const CRYSTAL_SETTLE_MS: u64 = 500;

/// Power-up settle time after ENABLE
pub const POWER_UP_SETTLE_MS: u64 = 110;

/// RSSI threshold used by hardware seek (SEEKTH)
pub const SEEK_RSSI_THRESHOLD: u8 = 0x19;

/// How long a scan waits on each station for its RDS name
pub const LABEL_WAIT_MS: u64 = 3_000;

/// Interval between volume ramp steps
pub const RAMP_STEP_MS: u64 = 2_000;

/// Volume increment per ramp step
pub const RAMP_STEP: u8 = 1;

/// Number of alarms
pub const ALARM_COUNT: usize = 2;

/// Default alarm volume
pub const DEFAULT_ALARM_VOLUME: Volume = Volume::clamped(8);

/// Maximum stored stations
pub const FAVORITE_CAPACITY: usize = 16;

/// Sleep timer increment in minutes
pub const SLEEP_STEP_MINUTES: u16 = 15;

/// Longest sleep timer in minutes
pub const SLEEP_MAX_MINUTES: u16 = 90;

/// Channels moved per fast detent in manual tuning
pub const FAST_TUNE_CHANNELS: i32 = 5;

/// Default startup frequency in Hz
pub const DEFAULT_FREQUENCY_HZ: u32 = 98_200_000;

/// Default listening volume
pub const DEFAULT_VOLUME: Volume = Volume::clamped(1);

/// Button debounce time in milliseconds
pub const BUTTON_DEBOUNCE_MS: u32 = 20;

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the schematic

    /// Status LED (directly on MCU)
    pub const LED_STATUS: &str = "PA5";

    /// I2C1 SCL (Si4703)
    pub const I2C1_SCL: &str = "PB8";

    /// I2C1 SDA (Si4703)
    pub const I2C1_SDA: &str = "PB9";

    /// Si4703 reset (active low)
    pub const TUNER_RESET: &str = "PB7";

    /// Si4703 GPIO2 interrupt (falling edge)
    pub const TUNER_IRQ: &str = "PB6";

    /// I2C2 SCL (display)
    pub const I2C2_SCL: &str = "PA9";

    /// I2C2 SDA (display)
    pub const I2C2_SDA: &str = "PA8";

    /// Encoder A input
    pub const ENCODER_A: &str = "PA0";

    /// Encoder B input
    pub const ENCODER_B: &str = "PA1";

    /// Encoder push button
    pub const ENCODER_SW: &str = "PA2";

    /// Side (back) button
    pub const SIDE_BUTTON: &str = "PA3";
}

/// Build the default startup frequency
#[must_use]
pub const fn default_frequency() -> Frequency {
    match Frequency::from_hz(DEFAULT_FREQUENCY_HZ) {
        Some(freq) => freq,
        None => Frequency::MIN,
    }
}
