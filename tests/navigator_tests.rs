//! Navigator Tests
//!
//! Tests for application/mode navigation, the modes it drives and the
//! screens each level draws.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test navigator_tests

mod common;

use common::{Rig, World};
use fm_clock::event::Event;
use fm_clock::tuner::registers::field;
use fm_clock::types::{ClockTime, Frequency, TimeOfDay, Volume};
use fm_clock::ui::modes::{AlarmEditor, AlarmField};
use fm_clock::ui::{DisplaySurface, Level, Mode, NavOutcome, Navigator};

const NOW: ClockTime = ClockTime::new(2, 6, 30, 0);

fn cw() -> Event {
    Event::RotateCw { fast: false }
}

fn ccw() -> Event {
    Event::RotateCcw { fast: false }
}

/// Feeds events straight to the navigator (no interceptors)
fn send(nav: &mut Navigator, world: &mut World, rig: &Rig, events: &[Event]) -> NavOutcome {
    let mut last = NavOutcome::Ignored;
    for event in events {
        let mut ctx = world.context(rig, NOW);
        last = nav.dispatch(event, &mut ctx).unwrap();
    }
    last
}

/// Surface that keeps every string drawn
#[derive(Default)]
struct TextLog {
    texts: Vec<String>,
    clears: usize,
}

impl TextLog {
    fn contains(&self, needle: &str) -> bool {
        self.texts.iter().any(|t| t.contains(needle))
    }
}

impl DisplaySurface for TextLog {
    fn clear(&mut self) {
        self.clears += 1;
        self.texts.clear();
    }

    fn text(&mut self, _x: i32, _y: i32, text: &str, _inverted: bool) {
        self.texts.push(text.to_owned());
    }

    fn fill_rect(&mut self, _x: i32, _y: i32, _width: u32, _height: u32, _on: bool) {}

    fn line(&mut self, _x0: i32, _y0: i32, _x1: i32, _y1: i32) {}
}

// =============================================================================
// Top Level
// =============================================================================

#[test]
fn test_starts_at_top_level() {
    let nav = Navigator::new();
    assert_eq!(nav.level(), Level::Top);
    assert_eq!(nav.cursor(), 0);
    assert_eq!(nav.apps().len(), 2);
    assert_eq!(nav.apps()[0].name(), "Radio");
    assert_eq!(nav.apps()[1].name(), "Alarm");
    assert!(nav.needs_update());
}

#[test]
fn test_top_level_cursor_wraps() {
    let rig = Rig::new();
    let mut world = World::new(&rig);
    let mut nav = Navigator::new();

    assert_eq!(send(&mut nav, &mut world, &rig, &[ccw()]), NavOutcome::Handled);
    assert_eq!(nav.cursor(), 1);
    send(&mut nav, &mut world, &rig, &[cw()]);
    assert_eq!(nav.cursor(), 0);
}

#[test]
fn test_unhandled_event_leaves_screen_clean() {
    let rig = Rig::new();
    let mut world = World::new(&rig);
    let mut nav = Navigator::new();
    nav.mark_updated();

    assert_eq!(send(&mut nav, &mut world, &rig, &[Event::SidePush]), NavOutcome::Ignored);
    assert!(!nav.needs_update());
    send(&mut nav, &mut world, &rig, &[cw()]);
    assert!(nav.needs_update());
}

// =============================================================================
// Selection and Exit
// =============================================================================

#[test]
fn test_select_engage_and_back() {
    let rig = Rig::new();
    let mut world = World::new(&rig);
    let mut nav = Navigator::new();

    send(&mut nav, &mut world, &rig, &[cw(), Event::RotaryRelease]);
    assert_eq!(nav.level(), Level::ModeSelect);
    assert_eq!(nav.selected().unwrap().name(), "Alarm");

    send(&mut nav, &mut world, &rig, &[Event::RotaryRelease]);
    assert_eq!(nav.level(), Level::Engaged);
    assert!(matches!(nav.selected().unwrap().engaged_mode(), Some(Mode::AlarmEdit(_))));

    assert_eq!(send(&mut nav, &mut world, &rig, &[Event::SidePush]), NavOutcome::Handled);
    assert_eq!(nav.level(), Level::Top);
    assert!(nav.selected().is_none());
    assert_eq!(rig.drain(), vec![Event::Exit]);
}

#[test]
fn test_reselect_starts_at_first_mode() {
    let rig = Rig::new();
    let mut world = World::new(&rig);
    let mut nav = Navigator::new();

    send(&mut nav, &mut world, &rig, &[Event::RotaryRelease, cw(), cw()]);
    assert_eq!(nav.selected().unwrap().mode_cursor(), 2);
    send(&mut nav, &mut world, &rig, &[Event::SidePush, Event::RotaryRelease]);
    assert_eq!(nav.selected().unwrap().mode_cursor(), 0);
}

#[test]
fn test_mode_cursor_wraps() {
    let rig = Rig::new();
    let mut world = World::new(&rig);
    let mut nav = Navigator::new();

    send(&mut nav, &mut world, &rig, &[Event::RotaryRelease, ccw()]);
    let radio = nav.selected().unwrap();
    assert_eq!(radio.mode_cursor(), radio.modes().len() - 1);
}

#[test]
fn test_reset_returns_silently() {
    let rig = Rig::new();
    let mut world = World::new(&rig);
    let mut nav = Navigator::new();
    send(&mut nav, &mut world, &rig, &[Event::RotaryRelease]);
    nav.reset();
    assert_eq!(nav.level(), Level::Top);
    assert!(rig.drain().is_empty());
}

// =============================================================================
// Radio Modes
// =============================================================================

#[test]
fn test_power_mode_toggles_and_exits() {
    let rig = Rig::new();
    let mut world = World::new(&rig);
    let mut nav = Navigator::new();

    let outcome = send(&mut nav, &mut world, &rig, &[Event::RotaryRelease, Event::RotaryRelease]);
    assert_eq!(outcome, NavOutcome::ModeExited);
    assert!(world.radio.is_on());
    assert_eq!(nav.level(), Level::ModeSelect);

    send(&mut nav, &mut world, &rig, &[Event::RotaryRelease]);
    assert!(!world.radio.is_on());
}

#[test]
fn test_tune_mode() {
    let rig = Rig::new();
    let mut world = World::new(&rig);
    let mut nav = Navigator::new();
    let start = world.radio.frequency();

    send(&mut nav, &mut world, &rig, &[Event::RotaryRelease, cw(), Event::RotaryRelease]);
    assert_eq!(nav.level(), Level::Engaged);
    assert!(world.radio.is_on());

    send(&mut nav, &mut world, &rig, &[cw(), Event::RotateCw { fast: true }]);
    assert_eq!(world.radio.frequency(), start.step_channels(6));

    let outcome = send(&mut nav, &mut world, &rig, &[Event::RotaryRelease]);
    assert_eq!(outcome, NavOutcome::ModeExited);
}

#[test]
fn test_seek_mode_back_stops_seek() {
    let rig = Rig::new();
    let mut world = World::new(&rig);
    let mut nav = Navigator::new();

    send(&mut nav, &mut world, &rig, &[Event::RotaryRelease, cw(), cw(), Event::RotaryRelease]);
    send(&mut nav, &mut world, &rig, &[cw()]);
    assert!(!world.radio.seek_state().is_idle());

    send(&mut nav, &mut world, &rig, &[Event::SidePush]);
    assert!(world.radio.seek_state().is_idle());
    assert_eq!(nav.level(), Level::Top);
}

#[test]
fn test_seek_mode_back_after_completion_keeps_station() {
    let rig = Rig::new();
    let mut world = World::new(&rig);
    let mut nav = Navigator::new();
    let found = Frequency::from_khz(101_100).unwrap();

    send(&mut nav, &mut world, &rig, &[Event::RotaryRelease, cw(), cw(), Event::RotaryRelease]);
    send(&mut nav, &mut world, &rig, &[cw()]);
    // Completion is serviced; its Tuned never reaches the mode
    rig.chip().complete_at(found);
    world.radio.handle_interrupt(rig.out()).unwrap();
    assert!(world.radio.seek_state().is_idle());

    send(&mut nav, &mut world, &rig, &[Event::SidePush]);
    assert_eq!(world.radio.frequency(), found);
    // No retune after the seek already landed
    let regs = world.radio.tuner().registers();
    assert!(!regs.flag(field::TUNE));
    assert_eq!(regs.field(field::CHAN), found.channel().raw());
    assert!(world.radio.tuner().rds_enabled());
}

#[test]
fn test_seek_mode_exit_after_completion_keeps_station() {
    let rig = Rig::new();
    let mut world = World::new(&rig);
    let mut nav = Navigator::new();
    let found = Frequency::from_khz(95_000).unwrap();

    send(&mut nav, &mut world, &rig, &[Event::RotaryRelease, cw(), cw(), Event::RotaryRelease]);
    send(&mut nav, &mut world, &rig, &[ccw()]);
    rig.chip().complete_at(found);
    world.radio.handle_interrupt(rig.out()).unwrap();

    let outcome = send(&mut nav, &mut world, &rig, &[Event::RotaryRelease]);
    assert_eq!(outcome, NavOutcome::ModeExited);
    assert_eq!(world.radio.frequency(), found);
    assert!(!world.radio.tuner().registers().flag(field::TUNE));
    assert!(world.radio.tuner().rds_enabled());
}

#[test]
fn test_sleep_mode_arms_timer() {
    let rig = Rig::new();
    let mut world = World::new(&rig);
    let mut nav = Navigator::new();

    // Sleep is the sixth radio mode
    send(&mut nav, &mut world, &rig, &[Event::RotaryRelease, ccw(), Event::RotaryRelease]);
    send(&mut nav, &mut world, &rig, &[cw(), cw(), Event::RotaryRelease]);
    assert_eq!(world.radio.sleep_minutes(), Some(30));
    assert_eq!(rig.timers.take_sleep_off().map(|(_, m)| m), Some(30));
}

#[test]
fn test_stations_mode_tunes_selection() {
    let rig = Rig::new();
    let mut world = World::new(&rig);
    let a = Frequency::from_khz(89_300).unwrap();
    let b = Frequency::from_khz(104_600).unwrap();
    world.favorites.insert(fm_clock::radio::Station::new(a, None));
    world.favorites.insert(fm_clock::radio::Station::new(b, None));
    let mut nav = Navigator::new();

    // Stations is the fifth radio mode
    let path = [Event::RotaryRelease, cw(), cw(), cw(), cw(), Event::RotaryRelease];
    send(&mut nav, &mut world, &rig, &path);
    send(&mut nav, &mut world, &rig, &[cw(), Event::RotaryRelease]);
    assert!(world.radio.is_on());
    assert_eq!(world.radio.frequency(), b);

    // Release on the station already playing marks it favorite
    send(&mut nav, &mut world, &rig, &[Event::RotaryRelease]);
    assert!(world.favorites.get(1).unwrap().favorite);
}

// =============================================================================
// Alarm Modes
// =============================================================================

#[test]
fn test_alarm_editor_sets_alarm() {
    let rig = Rig::new();
    let mut world = World::new(&rig);
    let mut nav = Navigator::new();

    send(&mut nav, &mut world, &rig, &[cw(), Event::RotaryRelease, Event::RotaryRelease]);
    // Hour 7 -> 6, minute 0 -> 5 (fast), volume 8 -> 9
    send(&mut nav, &mut world, &rig, &[ccw(), Event::RotaryRelease]);
    send(&mut nav, &mut world, &rig, &[Event::RotateCw { fast: true }, Event::RotaryRelease]);
    let outcome = send(&mut nav, &mut world, &rig, &[cw(), Event::RotaryRelease]);

    assert_eq!(outcome, NavOutcome::ModeExited);
    let alarm = world.alarms.get(0).unwrap();
    assert_eq!(alarm.time(), TimeOfDay::new(6, 5));
    assert_eq!(alarm.volume(), Volume::clamped(9));
    assert!(alarm.is_active());
}

#[test]
fn test_alarm_toggle_requires_time() {
    let rig = Rig::new();
    let mut world = World::new(&rig);
    let mut nav = Navigator::new();

    send(&mut nav, &mut world, &rig, &[cw(), Event::RotaryRelease, cw(), Event::RotaryRelease]);
    assert!(!world.alarms.get(0).unwrap().is_active());

    world.alarms.get_mut(0).unwrap().set_time(TimeOfDay::new(6, 0).unwrap());
    send(&mut nav, &mut world, &rig, &[Event::RotaryRelease]);
    assert!(world.alarms.get(0).unwrap().is_active());
    send(&mut nav, &mut world, &rig, &[Event::RotaryRelease]);
    assert!(!world.alarms.get(0).unwrap().is_active());
}

#[test]
fn test_editor_defaults() {
    let editor = AlarmEditor::new(1);
    assert_eq!(editor.field, AlarmField::Hour);
    assert_eq!(editor.time, TimeOfDay::new(7, 0).unwrap());
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn test_render_top_level() {
    let rig = Rig::new();
    let mut world = World::new(&rig);
    let nav = Navigator::new();
    let mut surface = TextLog::default();

    let ctx = world.context(&rig, NOW);
    nav.render(&mut surface, &ctx);
    assert_eq!(surface.clears, 1);
    assert!(surface.contains("FM Clock"));
    assert!(surface.contains("Radio"));
    assert!(surface.contains("Alarm"));
    assert!(surface.contains("06:30"));
}

#[test]
fn test_render_mode_list_and_banner() {
    let rig = Rig::new();
    let mut world = World::new(&rig);
    let mut nav = Navigator::new();
    send(&mut nav, &mut world, &rig, &[Event::RotaryRelease]);

    let alarm = world.alarms.get_mut(1).unwrap();
    alarm.set_time(TimeOfDay::new(6, 30).unwrap());
    alarm.set_active(true);
    alarm.trigger(&NOW);

    let mut surface = TextLog::default();
    let ctx = world.context(&rig, NOW);
    nav.render(&mut surface, &ctx);
    assert!(surface.contains("Power"));
    assert!(surface.contains("Tune"));
    assert!(surface.contains("WAKE UP"));
}
