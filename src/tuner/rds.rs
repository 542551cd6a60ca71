//! RDS group reassembly
//!
//! The chip delivers one RDS group (blocks A-D) per RDS interrupt. Text
//! arrives in small indexed segments, in any order and with repeats:
//!
//! - Group 0 carries the 8-character station name, 2 characters per
//!   segment from block D, segment index in block B bits 0-1.
//! - Group 2 carries up to 64 characters of radio text, segment index in
//!   block B bits 0-3. Version A groups carry 4 characters per segment
//!   (blocks C and D), version B groups 2 characters (block D).
//!
//! A carriage return ends the message early. A message is complete once
//! every segment up to the last one has been seen.

use heapless::String;

use super::registers::{field, Field, Register, RegisterFile};
use crate::event::{Event, RadioTextString, StationName};

/// End-of-message marker inside RDS text
pub const CARRIAGE_RETURN: u8 = 0x0D;

/// Group type carrying the station name
pub const GROUP_BASIC_TUNING: u8 = 0;

/// Group type carrying radio text
pub const GROUP_RADIO_TEXT: u8 = 2;

/// Block error level the chip reports for an uncorrectable block
const BLER_UNCORRECTABLE: u16 = 3;

/// Block C error level (only needed for version A radio text)
const BLERC: Field = Field::bits(Register::ReadChan, 12, 13);

/// Group version (block B bit 11)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupVersion {
    /// Version A: block C carries data
    A,
    /// Version B: block C repeats the PI code
    B,
}

impl GroupVersion {
    /// Characters per radio text segment for this version
    #[must_use]
    pub const fn text_chars_per_segment(self) -> usize {
        match self {
            Self::A => 4,
            Self::B => 2,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for GroupVersion {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::A => defmt::write!(f, "A"),
            Self::B => defmt::write!(f, "B"),
        }
    }
}

/// The four 16-bit blocks of one RDS group
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RdsBlocks {
    /// Block A (PI code)
    pub a: u16,
    /// Block B (group type, version, segment address)
    pub b: u16,
    /// Block C
    pub c: u16,
    /// Block D
    pub d: u16,
}

impl RdsBlocks {
    /// Extract the blocks from a register snapshot
    #[must_use]
    pub const fn from_registers(regs: &RegisterFile) -> Self {
        Self {
            a: regs.get(Register::RdsA),
            b: regs.get(Register::RdsB),
            c: regs.get(Register::RdsC),
            d: regs.get(Register::RdsD),
        }
    }

    /// Group type code (block B bits 12-15)
    #[must_use]
    pub const fn group_type(&self) -> u8 {
        (self.b >> 12) as u8
    }

    /// Group version (block B bit 11)
    #[must_use]
    pub const fn version(&self) -> GroupVersion {
        if self.b & (1 << 11) == 0 {
            GroupVersion::A
        } else {
            GroupVersion::B
        }
    }

    /// Radio text A/B flag (block B bit 4), toggled by the broadcaster
    /// whenever the message changes
    #[must_use]
    pub const fn text_flag(&self) -> bool {
        self.b & (1 << 4) != 0
    }
}

/// Segmented text buffer with completion tracking
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assembler<const N: usize> {
    buffer: [u8; N],
    chars_per_segment: usize,
    received: u16,
    last_segment: u8,
    complete: bool,
}

impl<const N: usize> Assembler<N> {
    /// Create an assembler for `chars_per_segment`-character segments
    ///
    /// The last segment defaults to the last one that fits the buffer.
    #[must_use]
    pub fn new(chars_per_segment: usize) -> Self {
        let segments = (N / chars_per_segment).clamp(1, 16);
        Self {
            buffer: [0; N],
            chars_per_segment,
            received: 0,
            last_segment: (segments - 1) as u8,
            complete: false,
        }
    }

    /// Store one segment; returns whether the message is now complete
    ///
    /// Segments past the buffer are dropped.
    pub fn receive(&mut self, index: u8, chars: &[u8]) -> bool {
        let start = usize::from(index) * self.chars_per_segment;
        if index >= 16 || start + chars.len() > N {
            return self.complete;
        }
        self.buffer[start..start + chars.len()].copy_from_slice(chars);
        self.received |= 1 << index;

        if chars.contains(&CARRIAGE_RETURN) {
            self.last_segment = index;
        }

        let needed = if self.last_segment >= 15 {
            u16::MAX
        } else {
            (1u16 << (self.last_segment + 1)) - 1
        };
        self.complete = self.received & needed == needed;
        self.complete
    }

    /// Whether every segment up to the last one has arrived
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    /// Index of the final segment
    #[must_use]
    pub const fn last_segment(&self) -> u8 {
        self.last_segment
    }

    /// Whether segment `index` has been seen
    #[must_use]
    pub const fn has_segment(&self, index: u8) -> bool {
        index < 16 && self.received & (1 << index) != 0
    }

    /// Characters per segment
    #[must_use]
    pub const fn chars_per_segment(&self) -> usize {
        self.chars_per_segment
    }

    /// Raw buffer up to the end of the last segment
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        let end = ((usize::from(self.last_segment) + 1) * self.chars_per_segment).min(N);
        &self.buffer[..end]
    }

    /// Text up to the terminator or the end of the last segment
    ///
    /// Bytes outside printable ASCII are shown as spaces.
    #[must_use]
    pub fn text(&self) -> String<N> {
        let mut text = String::new();
        for &byte in self.raw().iter().take_while(|&&b| b != CARRIAGE_RETURN) {
            let ch = if (0x20..0x7F).contains(&byte) {
                char::from(byte)
            } else {
                ' '
            };
            // Cannot overflow: at most N single-byte characters.
            let _ = text.push(ch);
        }
        text
    }
}

/// Station name assembler (4 segments of 2 characters)
pub type BasicTuningAssembler = Assembler<8>;

/// Radio text assembler tagged with the group version it was started for
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RadioTextAssembler {
    version: GroupVersion,
    text_flag: bool,
    inner: Assembler<64>,
}

impl RadioTextAssembler {
    /// Start assembling a message of the given version
    #[must_use]
    pub fn new(version: GroupVersion, text_flag: bool) -> Self {
        Self {
            version,
            text_flag,
            inner: Assembler::new(version.text_chars_per_segment()),
        }
    }

    /// Group version of this message
    #[must_use]
    pub const fn version(&self) -> GroupVersion {
        self.version
    }

    /// Text A/B flag of this message
    #[must_use]
    pub const fn text_flag(&self) -> bool {
        self.text_flag
    }

    /// Underlying segment buffer
    #[must_use]
    pub const fn assembler(&self) -> &Assembler<64> {
        &self.inner
    }

    /// Store one segment; returns whether the message is now complete
    pub fn receive(&mut self, index: u8, chars: &[u8]) -> bool {
        self.inner.receive(index, chars)
    }
}

/// Stateful RDS decoder fed with one register snapshot per interrupt
#[derive(Clone, Debug, Default)]
pub struct RdsDecoder {
    basic: Option<BasicTuningAssembler>,
    radio_text: Option<RadioTextAssembler>,
    last_basic: Option<StationName>,
    last_radio_text: Option<RadioTextString>,
}

impl RdsDecoder {
    /// Create an idle decoder
    #[must_use]
    pub const fn new() -> Self {
        Self {
            basic: None,
            radio_text: None,
            last_basic: None,
            last_radio_text: None,
        }
    }

    /// Decode the RDS blocks of a fresh register snapshot
    ///
    /// Groups whose blocks the chip flags as uncorrectable are skipped.
    pub fn decode(&mut self, regs: &RegisterFile) -> Option<Event> {
        let blocks = RdsBlocks::from_registers(regs);
        if regs.field(field::BLERB) >= BLER_UNCORRECTABLE
            || regs.field(field::BLERD) >= BLER_UNCORRECTABLE
        {
            trace!("rds: uncorrectable group skipped");
            return None;
        }
        if blocks.group_type() == GROUP_RADIO_TEXT
            && blocks.version() == GroupVersion::A
            && regs.field(BLERC) >= BLER_UNCORRECTABLE
        {
            return None;
        }
        self.decode_blocks(&blocks)
    }

    /// Decode one group given as raw blocks
    pub fn decode_blocks(&mut self, blocks: &RdsBlocks) -> Option<Event> {
        match blocks.group_type() {
            GROUP_BASIC_TUNING => self.on_basic_tuning(blocks),
            GROUP_RADIO_TEXT => self.on_radio_text(blocks),
            _ => None,
        }
    }

    fn on_basic_tuning(&mut self, blocks: &RdsBlocks) -> Option<Event> {
        let index = (blocks.b & 0x03) as u8;
        let assembler = self.basic.get_or_insert_with(|| Assembler::new(2));
        if !assembler.receive(index, &blocks.d.to_be_bytes()) {
            return None;
        }

        let text = assembler.text();
        self.basic = None;
        if self.last_basic.as_ref() == Some(&text) {
            return None;
        }
        debug!("rds: station name '{}'", text.as_str());
        self.last_basic = Some(text.clone());
        Some(Event::BasicTuningText { text })
    }

    fn on_radio_text(&mut self, blocks: &RdsBlocks) -> Option<Event> {
        let version = blocks.version();
        let text_flag = blocks.text_flag();
        let index = (blocks.b & 0x0F) as u8;

        if let Some(current) = &self.radio_text {
            if current.version() != version || current.text_flag() != text_flag {
                debug!("rds: radio text restarted (version {})", version);
                self.radio_text = None;
            }
        }
        let assembler = self
            .radio_text
            .get_or_insert_with(|| RadioTextAssembler::new(version, text_flag));

        let [c_hi, c_lo] = blocks.c.to_be_bytes();
        let [d_hi, d_lo] = blocks.d.to_be_bytes();
        let complete = match version {
            GroupVersion::A => assembler.receive(index, &[c_hi, c_lo, d_hi, d_lo]),
            GroupVersion::B => assembler.receive(index, &[d_hi, d_lo]),
        };
        if !complete {
            return None;
        }

        let text = assembler.assembler().text();
        self.radio_text = None;
        if self.last_radio_text.as_ref() == Some(&text) {
            return None;
        }
        debug!("rds: radio text '{}'", text.as_str());
        self.last_radio_text = Some(text.clone());
        Some(Event::RadioText { text })
    }

    /// In-progress station name assembly
    #[must_use]
    pub const fn basic_tuning(&self) -> Option<&BasicTuningAssembler> {
        self.basic.as_ref()
    }

    /// In-progress radio text assembly
    #[must_use]
    pub const fn radio_text(&self) -> Option<&RadioTextAssembler> {
        self.radio_text.as_ref()
    }

    /// Drop partial assemblies
    pub fn discard_partial(&mut self) {
        self.basic = None;
        self.radio_text = None;
    }

    /// Drop partial assemblies and forget what was already surfaced
    ///
    /// Used when the tuner leaves the current station.
    pub fn reset(&mut self) {
        self.discard_partial();
        self.last_basic = None;
        self.last_radio_text = None;
    }
}
