//! Persistence Tests
//!
//! Tests for key/value records, the radio and alarm record layouts, the
//! in-memory store and save-on-exit in the clock application.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test persist_tests

mod common;

use common::Rig;
use fm_clock::alarm::AlarmBank;
use fm_clock::app::Clock;
use fm_clock::config::{default_frequency, DEFAULT_ALARM_VOLUME, DEFAULT_VOLUME};
use fm_clock::event::{Event, StationName};
use fm_clock::persist::{
    self, MemoryStore, PersistentStore, Record, Value, ALARM_RECORD, KEY_LEN, RADIO_RECORD,
};
use fm_clock::radio::{FavoriteList, Station};
use fm_clock::types::{ClockTime, Frequency, TimeOfDay, Volume};
use fm_clock::ui::NavOutcome;

fn mhz(khz: u32) -> Frequency {
    Frequency::from_khz(khz).unwrap()
}

fn name(text: &str) -> StationName {
    StationName::try_from(text).unwrap()
}

// =============================================================================
// Record
// =============================================================================

#[test]
fn test_record_typed_access() {
    let mut record = Record::new();
    assert!(record.is_empty());
    assert!(record.insert("volume", Value::Int(7)));
    assert!(record.insert("on", Value::Flag(true)));
    assert!(record.insert("name", Value::Text(name("JAZZ"))));

    assert_eq!(record.len(), 3);
    assert_eq!(record.int("volume"), Some(7));
    assert_eq!(record.flag("on"), Some(true));
    assert_eq!(record.text("name"), Some("JAZZ"));
    // Wrong type reads as absent
    assert_eq!(record.flag("volume"), None);
    assert_eq!(record.int("missing"), None);
}

#[test]
fn test_record_overwrite_keeps_one_entry() {
    let mut record = Record::new();
    record.insert("volume", Value::Int(1));
    record.insert("volume", Value::Int(2));
    assert_eq!(record.len(), 1);
    assert_eq!(record.get("volume"), Some(&Value::Int(2)));
}

#[test]
fn test_record_rejects_long_key() {
    let mut record = Record::new();
    let long = "k".repeat(KEY_LEN + 1);
    assert!(!record.insert(&long, Value::Int(1)));
    assert_eq!(record.get(&long), None);
    assert!(record.insert(&long[..KEY_LEN], Value::Int(1)));
}

// =============================================================================
// Store
// =============================================================================

#[test]
fn test_memory_store_save_and_load() {
    let mut store = MemoryStore::new();
    assert!(store.load(RADIO_RECORD).is_none());

    let mut record = Record::new();
    record.insert("volume", Value::Int(4));
    store.save(RADIO_RECORD, &record);
    record.insert("volume", Value::Int(9));
    store.save(RADIO_RECORD, &record);

    assert_eq!(store.save_count(), 2);
    assert_eq!(store.load(RADIO_RECORD).unwrap().int("volume"), Some(9));
    assert!(store.load(ALARM_RECORD).is_none());
}

// =============================================================================
// Radio Record
// =============================================================================

#[test]
fn test_radio_record_round_trip() {
    let mut favorites = FavoriteList::new();
    favorites.insert(Station::new(mhz(104_600), None));
    favorites.insert(Station::new(mhz(89_300), Some(name("CLASSIC"))));
    favorites.toggle_favorite(1);

    let record = persist::radio_record(Volume::clamped(6), mhz(101_100), &favorites);
    assert_eq!(record.int("frequency"), Some(101_100));
    assert_eq!(record.int("fav.0.freq"), Some(89_300));
    assert_eq!(record.text("fav.0.label"), Some("CLASSIC"));
    assert_eq!(record.text("fav.1.label"), None);

    let settings = persist::radio_settings(Some(&record));
    assert_eq!(settings.volume, Volume::clamped(6));
    assert_eq!(settings.frequency, mhz(101_100));
    assert_eq!(settings.favorites.stations(), favorites.stations());
    assert!(settings.favorites.get(1).unwrap().favorite);
    assert!(!settings.favorites.is_dirty());
}

#[test]
fn test_missing_radio_record_uses_defaults() {
    let settings = persist::radio_settings(None);
    assert_eq!(settings.volume, DEFAULT_VOLUME);
    assert_eq!(settings.frequency, default_frequency());
    assert!(settings.favorites.is_empty());
}

#[test]
fn test_bad_radio_values_use_defaults() {
    let mut record = Record::new();
    record.insert("volume", Value::Flag(true));
    record.insert("frequency", Value::Int(150_000));
    record.insert("fav.0.freq", Value::Int(-5));
    record.insert("fav.1.freq", Value::Int(95_000));

    let settings = persist::radio_settings(Some(&record));
    assert_eq!(settings.volume, DEFAULT_VOLUME);
    assert_eq!(settings.frequency, default_frequency());
    // Stations stop at the first bad entry
    assert!(settings.favorites.is_empty());
}

#[test]
fn test_radio_volume_clamped_on_load() {
    let mut record = Record::new();
    record.insert("volume", Value::Int(99));
    assert_eq!(persist::radio_settings(Some(&record)).volume, Volume::MAX);
}

// =============================================================================
// Alarm Record
// =============================================================================

#[test]
fn test_alarm_record_round_trip() {
    let mut alarms = AlarmBank::new();
    let alarm = alarms.get_mut(1).unwrap();
    alarm.set_time(TimeOfDay::new(5, 45).unwrap());
    alarm.set_active(true);
    alarm.set_volume(Volume::clamped(12));

    let record = persist::alarm_record(&alarms);
    assert_eq!(record.flag("alarm.0.set"), Some(false));
    assert_eq!(record.int("alarm.1.hour"), Some(5));

    let loaded = persist::alarm_bank(Some(&record));
    assert!(!loaded.is_dirty());
    let first = loaded.get(0).unwrap();
    assert_eq!(first.time(), None);
    assert!(!first.is_active());
    assert_eq!(first.volume(), DEFAULT_ALARM_VOLUME);

    let second = loaded.get(1).unwrap();
    assert_eq!(second.time(), TimeOfDay::new(5, 45));
    assert!(second.is_active());
    assert_eq!(second.volume(), Volume::clamped(12));
}

#[test]
fn test_alarm_without_time_loads_inactive() {
    let mut record = Record::new();
    record.insert("alarm.0.active", Value::Flag(true));
    record.insert("alarm.0.hour", Value::Int(30));
    record.insert("alarm.0.minute", Value::Int(0));
    record.insert("alarm.0.set", Value::Flag(true));

    let loaded = persist::alarm_bank(Some(&record));
    let alarm = loaded.get(0).unwrap();
    assert_eq!(alarm.time(), None);
    assert!(!alarm.is_active());
}

// =============================================================================
// Clock Save/Load
// =============================================================================

const NOW: ClockTime = ClockTime::new(0, 12, 0, 0);

#[test]
fn test_clock_loads_saved_settings() {
    let rig = Rig::new();
    let mut store = MemoryStore::new();
    let mut favorites = FavoriteList::new();
    favorites.insert(Station::new(mhz(92_500), None));
    store.save(
        RADIO_RECORD,
        &persist::radio_record(Volume::clamped(10), mhz(92_500), &favorites),
    );

    let mut clock = Clock::new(rig.radio());
    clock.load(&mut store);
    assert_eq!(clock.radio().volume(), Volume::clamped(10));
    assert_eq!(clock.radio().frequency(), mhz(92_500));
    assert_eq!(clock.favorites().len(), 1);
    assert!(!clock.radio().is_dirty());
}

#[test]
fn test_save_dirty_only_when_changed() {
    let rig = Rig::new();
    let mut store = MemoryStore::new();
    let mut clock = Clock::new(rig.radio());
    clock.load(&mut store);

    clock.save_dirty(&mut store);
    assert_eq!(store.save_count(), 0);

    clock.alarms_mut().get_mut(0).unwrap().set_active(true);
    clock.save_dirty(&mut store);
    assert_eq!(store.save_count(), 1);
    assert!(store.load(ALARM_RECORD).is_some());
    assert!(store.load(RADIO_RECORD).is_none());

    clock.save_dirty(&mut store);
    assert_eq!(store.save_count(), 1);
}

#[test]
fn test_exit_event_saves_changes() {
    let rig = Rig::new();
    let mut store = MemoryStore::new();
    let mut clock = Clock::new(rig.radio());
    clock.load(&mut store);

    // Radio app, Tune mode, one channel up
    for event in [
        Event::RotaryRelease,
        Event::RotateCw { fast: false },
        Event::RotaryRelease,
        Event::RotateCw { fast: false },
    ] {
        clock.handle_event(event, rig.out(), NOW, &mut store).unwrap();
    }
    assert!(clock.radio().is_dirty());
    assert_eq!(store.save_count(), 0);

    clock.handle_event(Event::SidePush, rig.out(), NOW, &mut store).unwrap();
    let exit = rig.drain();
    assert_eq!(exit, vec![Event::Exit]);
    let outcome = clock.handle_event(Event::Exit, rig.out(), NOW, &mut store).unwrap();
    assert_eq!(outcome, NavOutcome::Handled);

    assert_eq!(store.save_count(), 1);
    let saved = store.load(RADIO_RECORD).unwrap();
    let expected = default_frequency().step_channels(1);
    assert_eq!(saved.int("frequency"), Some(expected.as_khz() as i32));
    assert!(!clock.radio().is_dirty());
}

#[test]
fn test_mode_exit_saves_changes() {
    let rig = Rig::new();
    let mut store = MemoryStore::new();
    let mut clock = Clock::new(rig.radio());
    clock.load(&mut store);

    // Radio app, Power mode toggles and exits at once
    clock.handle_event(Event::RotaryRelease, rig.out(), NOW, &mut store).unwrap();
    let outcome = clock.handle_event(Event::RotaryRelease, rig.out(), NOW, &mut store).unwrap();
    assert_eq!(outcome, NavOutcome::ModeExited);
    assert!(clock.radio().is_on());
    // Power alone is not persisted
    assert_eq!(store.save_count(), 0);
}
