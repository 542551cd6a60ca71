//! Peripheral Drivers
//!
//! Hardware glue for the pieces the control core reaches through traits:
//! the OLED behind [`crate::ui::DisplaySurface`] and the input pins that
//! feed the event queue.

pub mod display;
pub mod encoder;
