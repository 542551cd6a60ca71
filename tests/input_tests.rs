//! Input Decoder Tests
//!
//! Tests for rotary encoder direction, fast-rotation detection and
//! button edge handling.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test input_tests

use fm_clock::config::FAST_ROTATION_MS;
use fm_clock::event::Event;
use fm_clock::input::{ButtonDecoder, ButtonKind, ButtonState, Direction, RotaryDecoder};

// =============================================================================
// Rotary Direction
// =============================================================================

#[test]
fn test_direction_from_b_level() {
    assert_eq!(RotaryDecoder::direction(false, true), Some(Direction::Clockwise));
    assert_eq!(RotaryDecoder::direction(false, false), Some(Direction::CounterClockwise));
}

#[test]
fn test_a_high_is_bounce() {
    assert_eq!(RotaryDecoder::direction(true, true), None);
    assert_eq!(RotaryDecoder::direction(true, false), None);

    let mut decoder = RotaryDecoder::new();
    assert_eq!(decoder.on_edge(true, true, 0), None);
}

#[test]
fn test_clockwise_and_counter_clockwise_events() {
    let mut decoder = RotaryDecoder::new();
    assert_eq!(decoder.on_edge(false, true, 0), Some(Event::RotateCw { fast: false }));
    assert_eq!(decoder.on_edge(false, false, 1000), Some(Event::RotateCcw { fast: false }));
}

// =============================================================================
// Fast Rotation
// =============================================================================

#[test]
fn test_first_detent_is_never_fast() {
    let mut decoder = RotaryDecoder::new();
    assert_eq!(decoder.on_edge(false, true, 5), Some(Event::RotateCw { fast: false }));
}

#[test]
fn test_quick_detent_is_fast() {
    let mut decoder = RotaryDecoder::new();
    decoder.on_edge(false, true, 100);
    assert_eq!(
        decoder.on_edge(false, true, 100 + FAST_ROTATION_MS - 1),
        Some(Event::RotateCw { fast: true })
    );
}

#[test]
fn test_slow_detent_is_not_fast() {
    let mut decoder = RotaryDecoder::new();
    decoder.on_edge(false, false, 100);
    assert_eq!(
        decoder.on_edge(false, false, 100 + FAST_ROTATION_MS),
        Some(Event::RotateCcw { fast: false })
    );
}

#[test]
fn test_bounce_does_not_restart_interval() {
    let mut decoder = RotaryDecoder::new();
    decoder.on_edge(false, true, 0);
    decoder.on_edge(true, true, 40);
    // Measured from the last real detent at 0, not the bounce at 40
    assert_eq!(decoder.on_edge(false, true, 60), Some(Event::RotateCw { fast: false }));
}

#[test]
fn test_custom_threshold_and_reset() {
    let mut decoder = RotaryDecoder::with_threshold(200);
    decoder.on_edge(false, true, 0);
    assert!(decoder.on_edge(false, true, 150).is_some_and(|e| e.is_fast()));

    decoder.reset();
    assert_eq!(decoder.on_edge(false, true, 160), Some(Event::RotateCw { fast: false }));
}

#[test]
fn test_timestamp_wraparound() {
    let mut decoder = RotaryDecoder::new();
    decoder.on_edge(false, true, u32::MAX - 10);
    assert_eq!(decoder.on_edge(false, true, 10), Some(Event::RotateCw { fast: true }));
}

// =============================================================================
// Buttons
// =============================================================================

#[test]
fn test_rotary_button_press_and_release() {
    let mut button = ButtonDecoder::new(ButtonKind::Rotary);
    assert_eq!(button.state(), ButtonState::Released);
    assert_eq!(button.on_edge(false), Some(Event::RotaryPush));
    assert!(button.is_pressed());
    assert_eq!(button.on_edge(true), Some(Event::RotaryRelease));
    assert!(!button.is_pressed());
}

#[test]
fn test_side_button_events() {
    let mut button = ButtonDecoder::new(ButtonKind::Side);
    assert_eq!(button.on_edge(false), Some(Event::SidePush));
    assert_eq!(button.on_edge(true), Some(Event::SideRelease));
}

#[test]
fn test_repeated_level_is_ignored() {
    let mut button = ButtonDecoder::new(ButtonKind::Rotary);
    assert_eq!(button.on_edge(true), None);
    assert_eq!(button.on_edge(false), Some(Event::RotaryPush));
    assert_eq!(button.on_edge(false), None);
    assert_eq!(button.on_edge(true), Some(Event::RotaryRelease));
}
