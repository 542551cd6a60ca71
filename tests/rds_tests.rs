//! RDS Decoder Tests
//!
//! Tests for station name and radio text reassembly from group 0 and
//! group 2 blocks.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test rds_tests

use fm_clock::event::Event;
use fm_clock::tuner::rds::{Assembler, GroupVersion, RdsBlocks, RdsDecoder, CARRIAGE_RETURN};
use fm_clock::tuner::{Register, RegisterFile};

const VERSION_B: u16 = 1 << 11;
const TEXT_FLAG: u16 = 1 << 4;

fn chars(pair: &[u8; 2]) -> u16 {
    u16::from_be_bytes(*pair)
}

fn basic(index: u16, pair: &[u8; 2]) -> RdsBlocks {
    RdsBlocks {
        a: 0x1234,
        b: VERSION_B | index,
        c: 0,
        d: chars(pair),
    }
}

fn text_b(index: u16, pair: &[u8; 2]) -> RdsBlocks {
    RdsBlocks {
        a: 0x1234,
        b: (2 << 12) | VERSION_B | index,
        c: 0x1234,
        d: chars(pair),
    }
}

fn text_a(index: u16, quad: &[u8; 4]) -> RdsBlocks {
    RdsBlocks {
        a: 0x1234,
        b: (2 << 12) | index,
        c: u16::from_be_bytes([quad[0], quad[1]]),
        d: u16::from_be_bytes([quad[2], quad[3]]),
    }
}

fn feed_name(decoder: &mut RdsDecoder, name: &[u8; 8]) -> Option<Event> {
    let mut last = None;
    for index in 0..4 {
        let pair = [name[index * 2], name[index * 2 + 1]];
        last = decoder.decode_blocks(&basic(index as u16, &pair));
    }
    last
}

// =============================================================================
// Block Fields
// =============================================================================

#[test]
fn test_block_b_fields() {
    let blocks = text_b(3, b"ab");
    assert_eq!(blocks.group_type(), 2);
    assert_eq!(blocks.version(), GroupVersion::B);
    assert!(!blocks.text_flag());

    let blocks = RdsBlocks { b: TEXT_FLAG, ..Default::default() };
    assert_eq!(blocks.group_type(), 0);
    assert_eq!(blocks.version(), GroupVersion::A);
    assert!(blocks.text_flag());
}

#[test]
fn test_chars_per_segment() {
    assert_eq!(GroupVersion::A.text_chars_per_segment(), 4);
    assert_eq!(GroupVersion::B.text_chars_per_segment(), 2);
}

// =============================================================================
// Assembler
// =============================================================================

#[test]
fn test_assembler_out_of_order() {
    let mut assembler = Assembler::<8>::new(2);
    assert!(!assembler.receive(2, b"CD"));
    assert!(!assembler.receive(0, b"AB"));
    assert!(!assembler.receive(3, b"EF"));
    assert!(assembler.receive(1, b"XY"));
    assert_eq!(assembler.text().as_str(), "ABXYCDEF");
}

#[test]
fn test_assembler_replaces_non_printable() {
    let mut assembler = Assembler::<8>::new(2);
    for (index, pair) in [b"A\x01", b"BC", b"DE", b"FG"].iter().enumerate() {
        assembler.receive(index as u8, &pair[..]);
    }
    assert_eq!(assembler.text().as_str(), "A BCDEFG");
}

// =============================================================================
// Station Name (Group 0)
// =============================================================================

#[test]
fn test_station_name_complete() {
    let mut decoder = RdsDecoder::new();
    let event = feed_name(&mut decoder, b"RADIO 1 ");
    match event {
        Some(Event::BasicTuningText { text }) => assert_eq!(text.as_str(), "RADIO 1 "),
        other => panic!("expected station name, got {other:?}"),
    }
    assert!(decoder.basic_tuning().is_none());
}

#[test]
fn test_station_name_partial_is_silent() {
    let mut decoder = RdsDecoder::new();
    assert_eq!(decoder.decode_blocks(&basic(0, b"RA")), None);
    assert_eq!(decoder.decode_blocks(&basic(1, b"DI")), None);
    let partial = decoder.basic_tuning().unwrap();
    assert!(partial.has_segment(1));
    assert!(!partial.has_segment(2));
}

#[test]
fn test_station_name_repeat_suppressed() {
    let mut decoder = RdsDecoder::new();
    assert!(feed_name(&mut decoder, b"JAZZ FM ").is_some());
    assert_eq!(feed_name(&mut decoder, b"JAZZ FM "), None);
    assert!(feed_name(&mut decoder, b"NEWS    ").is_some());
}

#[test]
fn test_reset_forgets_surfaced_name() {
    let mut decoder = RdsDecoder::new();
    assert!(feed_name(&mut decoder, b"JAZZ FM ").is_some());
    decoder.reset();
    assert!(feed_name(&mut decoder, b"JAZZ FM ").is_some());
}

// =============================================================================
// Radio Text (Group 2)
// =============================================================================

#[test]
fn test_radio_text_version_b_with_terminator() {
    let mut decoder = RdsDecoder::new();
    assert_eq!(decoder.decode_blocks(&text_b(0, b"He")), None);
    assert_eq!(decoder.decode_blocks(&text_b(1, b"ll")), None);
    assert_eq!(decoder.decode_blocks(&text_b(2, b"o ")), None);
    // Repeated segment changes nothing
    assert_eq!(decoder.decode_blocks(&text_b(0, b"He")), None);

    let partial = decoder.radio_text().unwrap();
    assert_eq!(partial.version(), GroupVersion::B);
    assert!(!partial.assembler().is_complete());

    let event = decoder.decode_blocks(&text_b(3, &[b'!', CARRIAGE_RETURN]));
    match event {
        Some(Event::RadioText { text }) => assert_eq!(text.as_str(), "Hello !"),
        other => panic!("expected radio text, got {other:?}"),
    }
}

#[test]
fn test_terminator_sets_last_segment() {
    let mut assembler = Assembler::<64>::new(2);
    assembler.receive(1, &[b'x', CARRIAGE_RETURN]);
    assert_eq!(assembler.last_segment(), 1);
    assert!(!assembler.is_complete());
    assert!(assembler.receive(0, b"ab"));
    assert_eq!(assembler.text().as_str(), "abx");
}

#[test]
fn test_radio_text_version_a() {
    let mut decoder = RdsDecoder::new();
    assert_eq!(decoder.decode_blocks(&text_a(0, b"Good")), None);
    let event = decoder.decode_blocks(&text_a(1, &[b' ', b'd', b'y', CARRIAGE_RETURN]));
    match event {
        Some(Event::RadioText { text }) => assert_eq!(text.as_str(), "Good dy"),
        other => panic!("expected radio text, got {other:?}"),
    }
}

#[test]
fn test_version_change_restarts_text() {
    let mut decoder = RdsDecoder::new();
    decoder.decode_blocks(&text_a(0, b"ABCD"));
    assert_eq!(decoder.radio_text().unwrap().version(), GroupVersion::A);

    decoder.decode_blocks(&text_b(1, b"xy"));
    let restarted = decoder.radio_text().unwrap();
    assert_eq!(restarted.version(), GroupVersion::B);
    assert!(!restarted.assembler().has_segment(0));
    assert!(restarted.assembler().has_segment(1));
}

#[test]
fn test_text_flag_toggle_restarts_text() {
    let mut decoder = RdsDecoder::new();
    decoder.decode_blocks(&text_b(0, b"ab"));
    let mut flagged = text_b(1, b"cd");
    flagged.b |= TEXT_FLAG;
    decoder.decode_blocks(&flagged);

    let current = decoder.radio_text().unwrap();
    assert!(current.text_flag());
    assert!(!current.assembler().has_segment(0));
}

#[test]
fn test_radio_text_repeat_suppressed() {
    let mut decoder = RdsDecoder::new();
    let terminated = text_b(0, &[b'A', CARRIAGE_RETURN]);
    assert!(decoder.decode_blocks(&terminated).is_some());
    assert_eq!(decoder.decode_blocks(&terminated), None);
}

// =============================================================================
// Register Snapshots
// =============================================================================

fn snapshot(blocks: &RdsBlocks, read_chan: u16) -> RegisterFile {
    let mut regs = RegisterFile::new();
    regs.set(Register::ReadChan, read_chan);
    regs.set(Register::RdsA, blocks.a);
    regs.set(Register::RdsB, blocks.b);
    regs.set(Register::RdsC, blocks.c);
    regs.set(Register::RdsD, blocks.d);
    regs
}

#[test]
fn test_decode_from_registers() {
    let mut decoder = RdsDecoder::new();
    let terminated = text_b(0, &[b'O', CARRIAGE_RETURN]);
    let event = decoder.decode(&snapshot(&terminated, 107));
    assert!(matches!(event, Some(Event::RadioText { .. })));
}

#[test]
fn test_uncorrectable_block_skipped() {
    let mut decoder = RdsDecoder::new();
    // BLERD = 3
    let regs = snapshot(&basic(0, b"RA"), 0x0C00 | 107);
    assert_eq!(decoder.decode(&regs), None);
    assert!(decoder.basic_tuning().is_none());
}

#[test]
fn test_other_groups_ignored() {
    let mut decoder = RdsDecoder::new();
    let clock_time = RdsBlocks {
        a: 0x1234,
        b: 4 << 12,
        c: 0xFFFF,
        d: 0xFFFF,
    };
    assert_eq!(decoder.decode_blocks(&clock_time), None);
    assert!(decoder.basic_tuning().is_none());
    assert!(decoder.radio_text().is_none());
}
