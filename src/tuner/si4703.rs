//! Si4703 driver
//!
//! Every operation is one get-modify-commit cycle on the shadow register
//! file. Each commit transmits only the registers up to the highest one
//! the operation touched.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;

use super::registers::{field, Register, RegisterFile, ShadowRegisters};
use super::TunerResult;
use crate::config::{
    CRYSTAL_SETTLE_MS, POWER_UP_SETTLE_MS, SEEK_RSSI_THRESHOLD, SI4703_I2C_ADDR, TUNER_RESET_MS,
};
use crate::types::{Channel, Frequency, Rssi, SeekDirection, Volume};

/// GPIO2 function: STC/RDS interrupt output
const GPIO2_INTERRUPT: u16 = 0b01;

/// SPACE value for 100 kHz channel spacing
const SPACE_100KHZ: u16 = 0b01;

/// BAND value for 87.5-108 MHz
const BAND_EUROPE_US: u16 = 0b00;

/// Pulse the reset line with SDIO held low, selecting the 2-wire bus mode
///
/// Must run before the I2C peripheral takes over the SDIO pin.
pub fn reset<RST, SDIO, D>(rst: &mut RST, sdio: &mut SDIO, delay: &mut D) -> Result<(), RST::Error>
where
    RST: OutputPin,
    SDIO: OutputPin<Error = RST::Error>,
    D: DelayNs,
{
    sdio.set_low()?;
    rst.set_low()?;
    delay.delay_ms(TUNER_RESET_MS as u32);
    rst.set_high()?;
    delay.delay_ms(TUNER_RESET_MS as u32);
    Ok(())
}

/// Snapshot of the status registers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TunerStatus {
    /// An RDS group is waiting in 0x0C..=0x0F
    pub rds_ready: bool,
    /// Seek/tune complete
    pub seek_tune_complete: bool,
    /// Seek failed or hit the band limit
    pub band_limit: bool,
    /// AFC railed; the channel is not a valid station
    pub afc_railed: bool,
    /// Stereo pilot detected
    pub stereo: bool,
    /// Signal strength
    pub rssi: Rssi,
    /// Channel the chip is tuned to
    pub channel: Channel,
}

impl TunerStatus {
    /// Decode the status part of a register file
    #[must_use]
    pub const fn from_registers(regs: &RegisterFile) -> Self {
        Self {
            rds_ready: regs.flag(field::RDSR),
            seek_tune_complete: regs.flag(field::STC),
            band_limit: regs.flag(field::SFBL),
            afc_railed: regs.flag(field::AFCRL),
            stereo: regs.flag(field::ST),
            rssi: Rssi(regs.field(field::RSSI) as u8),
            channel: Channel::from_raw(regs.field(field::READCHAN)),
        }
    }

    /// Frequency of the reported channel
    #[must_use]
    pub fn frequency(&self) -> Frequency {
        Frequency::from_channel(self.channel).unwrap_or(Frequency::MAX)
    }
}

/// Si4703 FM tuner on a blocking I2C bus
pub struct Si4703<I2C> {
    regs: ShadowRegisters<I2C>,
}

impl<I2C: I2c> Si4703<I2C> {
    /// Wrap a bus using the standard address
    #[must_use]
    pub const fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, SI4703_I2C_ADDR)
    }

    /// Wrap a bus using a custom address
    #[must_use]
    pub const fn with_address(i2c: I2C, address: u8) -> Self {
        Self {
            regs: ShadowRegisters::new(i2c, address),
        }
    }

    /// Bring the chip up after a reset pulse
    ///
    /// Loads the register file, starts the crystal, enables the chip and
    /// applies the European defaults with interrupts on GPIO2. The output
    /// is left muted with RDS off, the state of a radio that is off.
    pub fn init<D: DelayNs>(&mut self, delay: &mut D) -> TunerResult<(), I2C::Error> {
        self.regs.refresh_all()?;
        self.power_crystal(true, delay)?;
        self.enable(true)?;
        delay.delay_ms(POWER_UP_SETTLE_MS as u32);

        let file = self.regs.file_mut();
        file.set_flag(field::DSMUTE, true);
        file.set_flag(field::DMUTE, false);
        file.set_flag(field::RDSIEN, true);
        file.set_flag(field::STCIEN, true);
        file.set_flag(field::RDS, false);
        file.set_flag(field::DE, true);
        file.set_field(field::GPIO2, GPIO2_INTERRUPT);
        file.set_field(field::SEEKTH, u16::from(SEEK_RSSI_THRESHOLD));
        file.set_field(field::BAND, BAND_EUROPE_US);
        file.set_field(field::SPACE, SPACE_100KHZ);
        self.regs.commit(Register::SysConfig2)?;

        info!("si4703: powered up");
        Ok(())
    }

    /// Start or stop the crystal oscillator
    ///
    /// Starting blocks for the stabilisation delay; the chip accepts no
    /// other command before that.
    pub fn power_crystal<D: DelayNs>(&mut self, on: bool, delay: &mut D) -> TunerResult<(), I2C::Error> {
        self.regs.file_mut().set_flag(field::XOSCEN, on);
        self.regs.commit(Register::Test1)?;
        if on {
            delay.delay_ms(CRYSTAL_SETTLE_MS as u32);
        }
        Ok(())
    }

    /// Set or clear the ENABLE bit
    pub fn enable(&mut self, on: bool) -> TunerResult<(), I2C::Error> {
        let file = self.regs.file_mut();
        file.set_flag(field::ENABLE, on);
        file.set_flag(field::DISABLE, false);
        self.regs.commit(Register::PowerCfg)
    }

    /// Power the chip down (ENABLE and DISABLE both set)
    pub fn power_down(&mut self) -> TunerResult<(), I2C::Error> {
        let file = self.regs.file_mut();
        file.set_flag(field::RDS, false);
        file.set_flag(field::ENABLE, true);
        file.set_flag(field::DISABLE, true);
        self.regs.commit(Register::SysConfig1)?;
        info!("si4703: powered down");
        Ok(())
    }

    /// Mute or unmute the audio output
    pub fn mute(&mut self, on: bool) -> TunerResult<(), I2C::Error> {
        self.regs.file_mut().set_flag(field::DMUTE, !on);
        self.regs.commit(Register::PowerCfg)
    }

    /// Check if the audio output is muted
    #[must_use]
    pub const fn is_muted(&self) -> bool {
        !self.regs.file().flag(field::DMUTE)
    }

    /// Set the output volume
    pub fn set_volume(&mut self, volume: Volume) -> TunerResult<(), I2C::Error> {
        self.regs
            .file_mut()
            .set_field(field::VOLUME, u16::from(volume.level()));
        self.regs.commit(Register::SysConfig2)
    }

    /// Volume currently in the mirror
    #[must_use]
    pub const fn volume(&self) -> Volume {
        Volume::clamped(self.regs.file().field(field::VOLUME) as i32)
    }

    /// Start tuning to a frequency; completion is signalled by STC
    pub fn set_frequency(&mut self, frequency: Frequency) -> TunerResult<(), I2C::Error> {
        let file = self.regs.file_mut();
        file.set_flag(field::SEEK, false);
        file.set_field(field::CHAN, frequency.channel().raw());
        file.set_flag(field::TUNE, true);
        debug!("si4703: tune {}", frequency);
        self.regs.commit(Register::Channel)
    }

    /// Enable or disable RDS reception
    pub fn enable_rds(&mut self, on: bool) -> TunerResult<(), I2C::Error> {
        self.regs.file_mut().set_flag(field::RDS, on);
        self.regs.commit(Register::SysConfig1)
    }

    /// Check if RDS reception is enabled
    #[must_use]
    pub const fn rds_enabled(&self) -> bool {
        self.regs.file().flag(field::RDS)
    }

    /// Start a hardware seek; completion is signalled by STC
    ///
    /// Without `wrap` the seek stops at the band edge and reports SF/BL.
    pub fn start_seek(&mut self, direction: SeekDirection, wrap: bool) -> TunerResult<(), I2C::Error> {
        let file = self.regs.file_mut();
        file.set_flag(field::SEEKUP, direction == SeekDirection::Up);
        file.set_flag(field::SKMODE, !wrap);
        file.set_flag(field::SEEK, true);
        debug!("si4703: seek {} wrap={}", direction, wrap);
        self.regs.commit(Register::PowerCfg)
    }

    /// Clear TUNE and SEEK so the chip drops STC
    pub fn finish_tune(&mut self) -> TunerResult<(), I2C::Error> {
        let file = self.regs.file_mut();
        file.set_flag(field::SEEK, false);
        file.set_flag(field::TUNE, false);
        self.regs.commit(Register::Channel)
    }

    /// Read 0x0A..=0x0F and decode the status part
    pub fn read_status(&mut self) -> TunerResult<TunerStatus, I2C::Error> {
        self.regs.refresh(Register::RdsD)?;
        Ok(self.status())
    }

    /// Status decoded from the mirror without bus traffic
    #[must_use]
    pub const fn status(&self) -> TunerStatus {
        TunerStatus::from_registers(self.regs.file())
    }

    /// Register mirror
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        self.regs.file()
    }

    /// Bus-bound register mirror
    pub fn shadow(&mut self) -> &mut ShadowRegisters<I2C> {
        &mut self.regs
    }

    /// Give back the bus
    pub fn release(self) -> I2C {
        self.regs.release()
    }
}
