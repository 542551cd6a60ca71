//! Si4703 FM Tuner
//!
//! Register model, RDS reassembly, seek/scan sequencing and the chip
//! driver that ties them to the I2C bus.

pub mod rds;
pub mod registers;
pub mod seek;
pub mod si4703;

use core::fmt;

pub use registers::{Register, RegisterFile, ShadowRegisters};
pub use si4703::Si4703;

/// Tuner operation result
pub type TunerResult<T, E> = Result<T, TunerError<E>>;

/// Errors surfaced by register operations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TunerError<E> {
    /// The I2C transaction failed
    Bus(E),
    /// Commit requested up to a register outside 0x02..=0x07
    NotWritable(Register),
    /// Refresh requested up to a register outside 0x0A..=0x0F
    NotReadable(Register),
}

impl<E: fmt::Debug> fmt::Display for TunerError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(err) => write!(f, "tuner bus error: {err:?}"),
            Self::NotWritable(reg) => write!(f, "register {:#04x} is not writable", reg.index()),
            Self::NotReadable(reg) => write!(f, "register {:#04x} is not a status register", reg.index()),
        }
    }
}

#[cfg(feature = "embedded")]
impl<E: fmt::Debug> defmt::Format for TunerError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Bus(err) => defmt::write!(f, "Bus({})", defmt::Debug2Format(err)),
            Self::NotWritable(reg) => defmt::write!(f, "NotWritable({=u8:#x})", reg.index() as u8),
            Self::NotReadable(reg) => defmt::write!(f, "NotReadable({=u8:#x})", reg.index() as u8),
        }
    }
}
