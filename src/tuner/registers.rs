//! Si4703 register model
//!
//! The chip exposes sixteen 16-bit registers. Writes always start at
//! register 0x02 and reads always start at register 0x0A (wrapping past
//! 0x0F to 0x00), so the in-memory mirror is mutated locally and then
//! transmitted as one contiguous block.

use embedded_hal::i2c::I2c;

use super::{TunerError, TunerResult};

/// Number of registers in the file
pub const REGISTER_COUNT: usize = 16;

/// Si4703 register addresses
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Register {
    /// Device identification
    DeviceId = 0x00,
    /// Chip identification
    ChipId = 0x01,
    /// Power configuration
    PowerCfg = 0x02,
    /// Channel and tune flag
    Channel = 0x03,
    /// System configuration 1
    SysConfig1 = 0x04,
    /// System configuration 2
    SysConfig2 = 0x05,
    /// System configuration 3
    SysConfig3 = 0x06,
    /// Test 1 (oscillator)
    Test1 = 0x07,
    /// Test 2
    Test2 = 0x08,
    /// Boot configuration
    BootConfig = 0x09,
    /// Status and RSSI
    StatusRssi = 0x0A,
    /// Read channel
    ReadChan = 0x0B,
    /// RDS block A
    RdsA = 0x0C,
    /// RDS block B
    RdsB = 0x0D,
    /// RDS block C
    RdsC = 0x0E,
    /// RDS block D
    RdsD = 0x0F,
}

impl Register {
    /// First register of every write
    pub const FIRST_WRITABLE: Self = Self::PowerCfg;

    /// Last register that may be written
    pub const LAST_WRITABLE: Self = Self::Test1;

    /// First register of every read
    pub const FIRST_STATUS: Self = Self::StatusRssi;

    /// Index into the register file
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether the register lies in the writable window 0x02..=0x07
    #[must_use]
    pub const fn is_writable(self) -> bool {
        let i = self as u8;
        i >= Self::FIRST_WRITABLE as u8 && i <= Self::LAST_WRITABLE as u8
    }

    /// Whether the register lies in the status window 0x0A..=0x0F
    #[must_use]
    pub const fn is_status(self) -> bool {
        self as u8 >= Self::FIRST_STATUS as u8
    }

    /// Register at `index`, None past 0x0F
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        Some(match index {
            0x00 => Self::DeviceId,
            0x01 => Self::ChipId,
            0x02 => Self::PowerCfg,
            0x03 => Self::Channel,
            0x04 => Self::SysConfig1,
            0x05 => Self::SysConfig2,
            0x06 => Self::SysConfig3,
            0x07 => Self::Test1,
            0x08 => Self::Test2,
            0x09 => Self::BootConfig,
            0x0A => Self::StatusRssi,
            0x0B => Self::ReadChan,
            0x0C => Self::RdsA,
            0x0D => Self::RdsB,
            0x0E => Self::RdsC,
            0x0F => Self::RdsD,
            _ => return None,
        })
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Register {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "R{=u8:02x}", *self as u8);
    }
}

/// Location of a bitfield within a register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    /// Register holding the field
    pub register: Register,
    /// Lowest bit (inclusive)
    pub low: u8,
    /// Highest bit (inclusive)
    pub high: u8,
}

impl Field {
    /// Multi-bit field
    #[must_use]
    pub const fn bits(register: Register, low: u8, high: u8) -> Self {
        Self {
            register,
            low,
            high,
        }
    }

    /// Single-bit flag
    #[must_use]
    pub const fn bit(register: Register, bit: u8) -> Self {
        Self::bits(register, bit, bit)
    }

    /// Mask of the field in register position
    #[must_use]
    pub const fn mask(self) -> u16 {
        mask(self.low, self.high)
    }
}

const fn mask(low_bit: u8, high_bit: u8) -> u16 {
    let width = high_bit - low_bit + 1;
    let ones = if width >= 16 {
        u16::MAX
    } else {
        (1u16 << width) - 1
    };
    ones << low_bit
}

/// Bitfield locations from the Si4702/03 datasheet
///
/// SYSCONFIG1 follows the datasheet: RDS is bit 12 and DE bit 11, the
/// reverse of some register summaries.
pub mod field {
    use super::{Field, Register};

    /// Softmute disable
    pub const DSMUTE: Field = Field::bit(Register::PowerCfg, 15);
    /// Mute disable (1 = audio on)
    pub const DMUTE: Field = Field::bit(Register::PowerCfg, 14);
    /// Force mono
    pub const MONO: Field = Field::bit(Register::PowerCfg, 13);
    /// RDS verbose mode
    pub const RDSM: Field = Field::bit(Register::PowerCfg, 11);
    /// Seek mode (1 = stop at band limit, 0 = wrap)
    pub const SKMODE: Field = Field::bit(Register::PowerCfg, 10);
    /// Seek direction (1 = up)
    pub const SEEKUP: Field = Field::bit(Register::PowerCfg, 9);
    /// Start seek
    pub const SEEK: Field = Field::bit(Register::PowerCfg, 8);
    /// Power-down request
    pub const DISABLE: Field = Field::bit(Register::PowerCfg, 6);
    /// Power-up enable
    pub const ENABLE: Field = Field::bit(Register::PowerCfg, 0);

    /// Start tune
    pub const TUNE: Field = Field::bit(Register::Channel, 15);
    /// Channel select
    pub const CHAN: Field = Field::bits(Register::Channel, 0, 9);

    /// RDS interrupt enable
    pub const RDSIEN: Field = Field::bit(Register::SysConfig1, 15);
    /// Seek/tune complete interrupt enable
    pub const STCIEN: Field = Field::bit(Register::SysConfig1, 14);
    /// RDS enable
    pub const RDS: Field = Field::bit(Register::SysConfig1, 12);
    /// De-emphasis (1 = 50 µs)
    pub const DE: Field = Field::bit(Register::SysConfig1, 11);
    /// GPIO2 function (01 = STC/RDS interrupt)
    pub const GPIO2: Field = Field::bits(Register::SysConfig1, 2, 3);

    /// RSSI seek threshold
    pub const SEEKTH: Field = Field::bits(Register::SysConfig2, 8, 15);
    /// Band select (00 = 87.5-108 MHz)
    pub const BAND: Field = Field::bits(Register::SysConfig2, 6, 7);
    /// Channel spacing (01 = 100 kHz)
    pub const SPACE: Field = Field::bits(Register::SysConfig2, 4, 5);
    /// Volume
    pub const VOLUME: Field = Field::bits(Register::SysConfig2, 0, 3);

    /// Crystal oscillator enable
    pub const XOSCEN: Field = Field::bit(Register::Test1, 15);

    /// RDS group ready
    pub const RDSR: Field = Field::bit(Register::StatusRssi, 15);
    /// Seek/tune complete
    pub const STC: Field = Field::bit(Register::StatusRssi, 14);
    /// Seek failed / band limit reached
    pub const SFBL: Field = Field::bit(Register::StatusRssi, 13);
    /// AFC railed (invalid channel)
    pub const AFCRL: Field = Field::bit(Register::StatusRssi, 12);
    /// Stereo indicator
    pub const ST: Field = Field::bit(Register::StatusRssi, 8);
    /// Received signal strength
    pub const RSSI: Field = Field::bits(Register::StatusRssi, 0, 7);

    /// Block B error level
    pub const BLERB: Field = Field::bits(Register::ReadChan, 14, 15);
    /// Block D error level
    pub const BLERD: Field = Field::bits(Register::ReadChan, 10, 11);
    /// Tuned channel
    pub const READCHAN: Field = Field::bits(Register::ReadChan, 0, 9);
}

/// In-memory copy of the whole register file
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegisterFile {
    regs: [u16; REGISTER_COUNT],
}

impl RegisterFile {
    /// All-zero register file
    #[must_use]
    pub const fn new() -> Self {
        Self {
            regs: [0; REGISTER_COUNT],
        }
    }

    /// Build from explicit register values (index = address)
    #[must_use]
    pub const fn from_words(regs: [u16; REGISTER_COUNT]) -> Self {
        Self { regs }
    }

    /// Raw register value
    #[must_use]
    pub const fn get(&self, reg: Register) -> u16 {
        self.regs[reg.index()]
    }

    /// Overwrite a whole register
    pub fn set(&mut self, reg: Register, value: u16) {
        self.regs[reg.index()] = value;
    }

    /// Read bits `low_bit..=high_bit` of a register
    #[must_use]
    pub const fn bitfield(&self, reg: Register, low_bit: u8, high_bit: u8) -> u16 {
        (self.regs[reg.index()] & mask(low_bit, high_bit)) >> low_bit
    }

    /// Replace bits `low_bit..=high_bit` of a register with `value`
    ///
    /// Bits of `value` that do not fit the field are discarded. Only the
    /// mirror changes; nothing is sent until a commit.
    pub fn set_bitfield(&mut self, reg: Register, low_bit: u8, high_bit: u8, value: u16) {
        let mask = mask(low_bit, high_bit);
        let word = &mut self.regs[reg.index()];
        *word = (*word & !mask) | ((value << low_bit) & mask);
    }

    /// Read a named field
    #[must_use]
    pub const fn field(&self, field: Field) -> u16 {
        self.bitfield(field.register, field.low, field.high)
    }

    /// Write a named field
    pub fn set_field(&mut self, field: Field, value: u16) {
        self.set_bitfield(field.register, field.low, field.high, value);
    }

    /// Read a single-bit field
    #[must_use]
    pub const fn flag(&self, field: Field) -> bool {
        self.field(field) != 0
    }

    /// Set or clear a single-bit field
    pub fn set_flag(&mut self, field: Field, on: bool) {
        self.set_field(field, u16::from(on));
    }

    /// Serialize registers 0x02..=`up_to` as big-endian bytes into `buf`
    ///
    /// Returns the number of bytes used; zero if `up_to` is not writable.
    pub fn encode_writes(&self, up_to: Register, buf: &mut [u8; 12]) -> usize {
        if !up_to.is_writable() {
            return 0;
        }
        let first = Register::FIRST_WRITABLE.index();
        let mut len = 0;
        for &word in &self.regs[first..=up_to.index()] {
            buf[len..len + 2].copy_from_slice(&word.to_be_bytes());
            len += 2;
        }
        len
    }

    /// Load big-endian words read from the chip, starting at 0x0A and
    /// wrapping past 0x0F to 0x00
    pub fn decode_reads(&mut self, bytes: &[u8]) {
        let first = Register::FIRST_STATUS.index();
        for (offset, pair) in bytes.chunks_exact(2).take(REGISTER_COUNT).enumerate() {
            let index = (first + offset) % REGISTER_COUNT;
            self.regs[index] = u16::from_be_bytes([pair[0], pair[1]]);
        }
    }
}

/// Register mirror bound to the chip's I2C bus
///
/// The mirror is the single shared copy of the chip state. Callers must
/// finish each get-modify-commit cycle before starting another.
pub struct ShadowRegisters<I2C> {
    i2c: I2C,
    address: u8,
    file: RegisterFile,
}

impl<I2C: I2c> ShadowRegisters<I2C> {
    /// Wrap a bus; the mirror starts zeroed until the first refresh
    #[must_use]
    pub const fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            file: RegisterFile::new(),
        }
    }

    /// Current mirror contents
    #[must_use]
    pub const fn file(&self) -> &RegisterFile {
        &self.file
    }

    /// Mutable mirror contents (no bus traffic)
    pub fn file_mut(&mut self) -> &mut RegisterFile {
        &mut self.file
    }

    /// Modify a bitfield in the mirror only
    pub fn set_bitfield(&mut self, reg: Register, low_bit: u8, high_bit: u8, value: u16) {
        self.file.set_bitfield(reg, low_bit, high_bit, value);
    }

    /// Transmit registers 0x02..=`up_to` in one bus write
    pub fn commit(&mut self, up_to: Register) -> TunerResult<(), I2C::Error> {
        if !up_to.is_writable() {
            return Err(TunerError::NotWritable(up_to));
        }
        let mut buf = [0u8; 12];
        let len = self.file.encode_writes(up_to, &mut buf);
        self.i2c
            .write(self.address, &buf[..len])
            .map_err(TunerError::Bus)
    }

    /// Read registers 0x0A..=`up_to` in one bus read
    pub fn refresh(&mut self, up_to: Register) -> TunerResult<(), I2C::Error> {
        if !up_to.is_status() {
            return Err(TunerError::NotReadable(up_to));
        }
        let len = (up_to.index() - Register::FIRST_STATUS.index() + 1) * 2;
        let mut buf = [0u8; 12];
        self.i2c
            .read(self.address, &mut buf[..len])
            .map_err(TunerError::Bus)?;
        self.file.decode_reads(&buf[..len]);
        Ok(())
    }

    /// Read the entire register file (0x0A..=0x0F then 0x00..=0x09)
    pub fn refresh_all(&mut self) -> TunerResult<(), I2C::Error> {
        let mut buf = [0u8; REGISTER_COUNT * 2];
        self.i2c
            .read(self.address, &mut buf)
            .map_err(TunerError::Bus)?;
        self.file.decode_reads(&buf);
        Ok(())
    }

    /// Give back the bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}
