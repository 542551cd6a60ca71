//! Radio Control Logic
//!
//! The radio service built on the tuner, its on-screen status and the
//! stored station list.

pub mod control;
pub mod favorites;
pub mod state;

pub use control::{Radio, Ramp};
pub use favorites::{FavoriteList, Station};
pub use state::{apply_event, RadioStatus};
