//! User Interface
//!
//! Two-level navigation (application, then mode) and the screens each
//! level draws. Pixels are the display collaborator's business; the UI
//! only picks primitives and positions.

pub mod modes;
pub mod navigator;
pub mod render;

use crate::alarm::AlarmBank;
use crate::radio::{FavoriteList, Radio};
use crate::task::Outbox;
use crate::types::ClockTime;

pub use modes::{Mode, ModeStep};
pub use navigator::{Application, Level, NavOutcome, Navigator};

/// Drawing primitives provided by the display
///
/// Coordinates are pixels from the top-left corner. Text is drawn with
/// its top-left corner at `(x, y)`.
pub trait DisplaySurface {
    /// Blank the whole surface
    fn clear(&mut self);

    /// Draw a string; `inverted` draws dark text on a lit background
    fn text(&mut self, x: i32, y: i32, text: &str, inverted: bool);

    /// Fill a rectangle lit (`on`) or dark
    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, on: bool);

    /// Draw a one pixel lit line
    fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32);
}

/// Everything a mode may act on while handling one event
pub struct Context<'a, I2C> {
    /// Radio service
    pub radio: &'a mut Radio<I2C>,
    /// Stored stations
    pub favorites: &'a mut FavoriteList,
    /// Alarms
    pub alarms: &'a mut AlarmBank,
    /// Event queue and timer requests
    pub out: Outbox<'a>,
    /// Wall-clock time of the event
    pub now: ClockTime,
}
