//! Settings persistence
//!
//! Each application is saved as a flat key/value [`Record`] under its
//! own name. Storage itself is a collaborator behind [`PersistentStore`];
//! a missing or malformed record, or any missing key, means defaults.

use core::fmt::Write;

use heapless::{FnvIndexMap, String, Vec};

use crate::alarm::AlarmBank;
use crate::config::{default_frequency, DEFAULT_ALARM_VOLUME, DEFAULT_VOLUME};
use crate::event::StationName;
use crate::radio::{FavoriteList, Station};
use crate::types::{Frequency, TimeOfDay, Volume};

/// Longest key
pub const KEY_LEN: usize = 16;

/// Most keys in one record (power of two)
pub const RECORD_CAPACITY: usize = 64;

/// Record key
pub type Key = String<KEY_LEN>;

/// Stored value
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Integer
    Int(i32),
    /// Boolean
    Flag(bool),
    /// Short text
    Text(StationName),
}

/// Flat key/value map saved per application
#[derive(Clone, Debug, Default)]
pub struct Record {
    entries: FnvIndexMap<Key, Value, RECORD_CAPACITY>,
}

impl Record {
    /// Empty record
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: FnvIndexMap::new(),
        }
    }

    /// Store a value; returns `false` if the key is too long or the
    /// record is full
    pub fn insert(&mut self, key: &str, value: Value) -> bool {
        let Ok(key) = Key::try_from(key) else {
            return false;
        };
        self.entries.insert(key, value).is_ok()
    }

    /// Raw value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        let key = Key::try_from(key).ok()?;
        self.entries.get(&key)
    }

    /// Integer value, None if absent or another type
    #[must_use]
    pub fn int(&self, key: &str) -> Option<i32> {
        match self.get(key)? {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Boolean value, None if absent or another type
    #[must_use]
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Flag(value) => Some(*value),
            _ => None,
        }
    }

    /// Text value, None if absent or another type
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            Value::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Number of keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the record holds no keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

/// Where application records live
pub trait PersistentStore {
    /// Load the record saved under `name`
    fn load(&mut self, name: &str) -> Option<Record>;

    /// Save a record under `name`
    fn save(&mut self, name: &str, record: &Record);
}

/// RAM-backed store; contents are lost at reset
#[derive(Default)]
pub struct MemoryStore {
    records: Vec<(Key, Record), 4>,
    saves: usize,
}

impl MemoryStore {
    /// Empty store
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
            saves: 0,
        }
    }

    /// Number of `save` calls so far
    #[must_use]
    pub const fn save_count(&self) -> usize {
        self.saves
    }
}

impl PersistentStore for MemoryStore {
    fn load(&mut self, name: &str) -> Option<Record> {
        self.records
            .iter()
            .find(|(key, _)| key.as_str() == name)
            .map(|(_, record)| record.clone())
    }

    fn save(&mut self, name: &str, record: &Record) {
        self.saves += 1;
        let Ok(key) = Key::try_from(name) else {
            warn!("persist: name too long");
            return;
        };
        if let Some((_, slot)) = self.records.iter_mut().find(|(k, _)| *k == key) {
            *slot = record.clone();
        } else if self.records.push((key, record.clone())).is_err() {
            warn!("persist: store full");
        }
    }
}

/// Record name of the radio application
pub const RADIO_RECORD: &str = "radio";

/// Record name of the alarm application
pub const ALARM_RECORD: &str = "alarm";

fn key(args: core::fmt::Arguments<'_>) -> Key {
    let mut key = Key::new();
    // Keys are short fixed patterns; overflow only truncates.
    let _ = key.write_fmt(args);
    key
}

// ----------------------------------------------------------------------
// Radio
// ----------------------------------------------------------------------

/// Snapshot volume, frequency and stations
#[must_use]
pub fn radio_record(volume: Volume, frequency: Frequency, favorites: &FavoriteList) -> Record {
    let mut record = Record::new();
    record.insert("volume", Value::Int(i32::from(volume.level())));
    record.insert("frequency", Value::Int(frequency.as_khz() as i32));
    for (i, station) in favorites.stations().iter().enumerate() {
        record.insert(
            &key(format_args!("fav.{i}.freq")),
            Value::Int(station.frequency.as_khz() as i32),
        );
        if let Some(label) = &station.label {
            record.insert(&key(format_args!("fav.{i}.label")), Value::Text(label.clone()));
        }
        record.insert(&key(format_args!("fav.{i}.fav")), Value::Flag(station.favorite));
    }
    record
}

/// Settings recovered from a radio record
#[derive(Clone, Debug)]
pub struct RadioSettings {
    /// Listening volume
    pub volume: Volume,
    /// Last frequency
    pub frequency: Frequency,
    /// Stored stations
    pub favorites: FavoriteList,
}

impl Default for RadioSettings {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            frequency: default_frequency(),
            favorites: FavoriteList::new(),
        }
    }
}

/// Decode a radio record; bad or missing values take defaults
#[must_use]
pub fn radio_settings(record: Option<&Record>) -> RadioSettings {
    let mut settings = RadioSettings::default();
    let Some(record) = record else {
        return settings;
    };
    if let Some(volume) = record.int("volume") {
        settings.volume = Volume::clamped(volume);
    }
    if let Some(frequency) = record.int("frequency").and_then(frequency_from_khz) {
        settings.frequency = frequency;
    }
    for i in 0..crate::config::FAVORITE_CAPACITY {
        let Some(frequency) = record
            .int(&key(format_args!("fav.{i}.freq")))
            .and_then(frequency_from_khz)
        else {
            break;
        };
        let label = record
            .text(&key(format_args!("fav.{i}.label")))
            .and_then(|text| StationName::try_from(text).ok());
        let mut station = Station::new(frequency, label);
        station.favorite = record
            .flag(&key(format_args!("fav.{i}.fav")))
            .unwrap_or(false);
        settings.favorites.insert(station);
    }
    settings.favorites.mark_saved();
    settings
}

fn frequency_from_khz(khz: i32) -> Option<Frequency> {
    let khz = u32::try_from(khz).ok()?;
    Frequency::from_hz(khz.checked_mul(1000)?)
}

// ----------------------------------------------------------------------
// Alarms
// ----------------------------------------------------------------------

/// Snapshot every alarm
#[must_use]
pub fn alarm_record(alarms: &AlarmBank) -> Record {
    let mut record = Record::new();
    for (i, alarm) in alarms.iter().enumerate() {
        let time = alarm.time().unwrap_or_default();
        record.insert(&key(format_args!("alarm.{i}.hour")), Value::Int(i32::from(time.hour)));
        record.insert(&key(format_args!("alarm.{i}.minute")), Value::Int(i32::from(time.minute)));
        record.insert(&key(format_args!("alarm.{i}.set")), Value::Flag(alarm.time().is_some()));
        record.insert(&key(format_args!("alarm.{i}.active")), Value::Flag(alarm.is_active()));
        record.insert(
            &key(format_args!("alarm.{i}.volume")),
            Value::Int(i32::from(alarm.volume().level())),
        );
    }
    record
}

/// Decode an alarm record; bad or missing values take defaults
#[must_use]
pub fn alarm_bank(record: Option<&Record>) -> AlarmBank {
    let mut alarms = AlarmBank::new();
    let Some(record) = record else {
        return alarms;
    };
    for i in 0..alarms.len() {
        let Some(alarm) = alarms.get_mut(i) else {
            break;
        };
        let hour = record.int(&key(format_args!("alarm.{i}.hour")));
        let minute = record.int(&key(format_args!("alarm.{i}.minute")));
        let set = record.flag(&key(format_args!("alarm.{i}.set"))).unwrap_or(false);
        let time = match (hour, minute) {
            (Some(h), Some(m)) if set => u8::try_from(h)
                .ok()
                .zip(u8::try_from(m).ok())
                .and_then(|(h, m)| TimeOfDay::new(h, m)),
            _ => None,
        };
        if let Some(time) = time {
            alarm.set_time(time);
        }
        alarm.set_active(
            time.is_some() && record.flag(&key(format_args!("alarm.{i}.active"))).unwrap_or(false),
        );
        let volume = record
            .int(&key(format_args!("alarm.{i}.volume")))
            .map_or(DEFAULT_ALARM_VOLUME, Volume::clamped);
        alarm.set_volume(volume);
    }
    alarms.mark_saved();
    alarms
}
