//! Stored station list
//!
//! Filled by scans, browsed by the Stations mode. Entries stay sorted by
//! frequency; favorites survive a rescan.

use heapless::Vec;

use crate::config::FAVORITE_CAPACITY;
use crate::event::StationName;
use crate::tuner::seek::ScanHit;
use crate::types::Frequency;

/// One stored station
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Station {
    /// Station frequency
    pub frequency: Frequency,
    /// RDS name captured during the scan
    pub label: Option<StationName>,
    /// Kept across rescans
    pub favorite: bool,
}

impl Station {
    /// Create a non-favorite station
    #[must_use]
    pub const fn new(frequency: Frequency, label: Option<StationName>) -> Self {
        Self {
            frequency,
            label,
            favorite: false,
        }
    }
}

impl From<ScanHit> for Station {
    fn from(hit: ScanHit) -> Self {
        Self::new(hit.frequency, hit.label)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Station {
    fn format(&self, f: defmt::Formatter) {
        match &self.label {
            Some(label) => defmt::write!(f, "{}({})", self.frequency, label.as_str()),
            None => defmt::write!(f, "{}", self.frequency),
        }
        if self.favorite {
            defmt::write!(f, "*");
        }
    }
}

/// Sorted, bounded station list with a selection cursor
#[derive(Clone, Debug, Default)]
pub struct FavoriteList {
    stations: Vec<Station, FAVORITE_CAPACITY>,
    selected: usize,
    dirty: bool,
}

impl FavoriteList {
    /// Create an empty list
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stations: Vec::new(),
            selected: 0,
            dirty: false,
        }
    }

    /// All stations in frequency order
    #[must_use]
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Number of stations
    #[must_use]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Check if the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Get station by index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Station> {
        self.stations.get(index)
    }

    /// Index of a station on `frequency`
    #[must_use]
    pub fn position(&self, frequency: Frequency) -> Option<usize> {
        self.stations.iter().position(|s| s.frequency == frequency)
    }

    /// Insert or update a station, keeping frequency order
    ///
    /// An existing entry on the same frequency keeps its favorite flag
    /// and gains the new label if one is given. Returns `false` when the
    /// list is full.
    pub fn insert(&mut self, station: Station) -> bool {
        if let Some(index) = self.position(station.frequency) {
            let existing = &mut self.stations[index];
            if station.label.is_some() {
                existing.label = station.label;
            }
            existing.favorite |= station.favorite;
            self.dirty = true;
            return true;
        }
        let index = self
            .stations
            .iter()
            .position(|s| s.frequency > station.frequency)
            .unwrap_or(self.stations.len());
        if self.stations.insert(index, station).is_err() {
            return false;
        }
        self.dirty = true;
        true
    }

    /// Replace all non-favorite entries with scan results
    ///
    /// Favorites are kept; hits that do not fit are dropped.
    pub fn replace_scanned<I>(&mut self, hits: I)
    where
        I: IntoIterator<Item = ScanHit>,
    {
        self.stations.retain(|s| s.favorite);
        for hit in hits {
            if !self.insert(Station::from(hit)) {
                warn!("favorites: list full, scan hit dropped");
                break;
            }
        }
        self.selected = 0;
        self.dirty = true;
        info!("favorites: {} stations after scan", self.stations.len());
    }

    /// Flip the favorite flag of a station
    pub fn toggle_favorite(&mut self, index: usize) -> Option<bool> {
        let station = self.stations.get_mut(index)?;
        station.favorite = !station.favorite;
        self.dirty = true;
        Some(station.favorite)
    }

    /// Remove every station
    pub fn clear(&mut self) {
        if !self.stations.is_empty() {
            self.dirty = true;
        }
        self.stations.clear();
        self.selected = 0;
    }

    /// Selected index
    #[must_use]
    pub const fn selected_index(&self) -> usize {
        self.selected
    }

    /// Selected station
    #[must_use]
    pub fn selected(&self) -> Option<&Station> {
        self.stations.get(self.selected)
    }

    /// Move the selection to a station
    pub fn select(&mut self, index: usize) {
        if index < self.stations.len() {
            self.selected = index;
        }
    }

    /// Move the selection by `steps`, wrapping at both ends
    pub fn select_by(&mut self, steps: i32) -> Option<&Station> {
        let count = self.stations.len();
        if count == 0 {
            return None;
        }
        let next = (self.selected as i32 + steps).rem_euclid(count as i32);
        self.selected = next as usize;
        self.stations.get(self.selected)
    }

    /// Select the next station (wrapping)
    pub fn next(&mut self) -> Option<&Station> {
        self.select_by(1)
    }

    /// Select the previous station (wrapping)
    pub fn prev(&mut self) -> Option<&Station> {
        self.select_by(-1)
    }

    /// Count favorites
    #[must_use]
    pub fn favorite_count(&self) -> usize {
        self.stations.iter().filter(|s| s.favorite).count()
    }

    /// Changed since the last save
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the changed flag after a save
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }
}
