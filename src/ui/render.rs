//! Screen layouts
//!
//! Text-row layouts for a 128x64 panel with a 6x10 font: a title row,
//! then up to five content rows.

use core::fmt::Write;

use heapless::String;

use super::modes::{AlarmEditor, AlarmField};
use super::DisplaySurface;
use crate::config::DISPLAY_WIDTH;
use crate::radio::{FavoriteList, RadioStatus};
use crate::types::{ClockTime, Frequency};

/// Pixel height of one text row
pub const LINE_HEIGHT: i32 = 10;

/// Pixel width of one character
pub const CHAR_WIDTH: i32 = 6;

/// Content rows below the title
pub const VISIBLE_ROWS: usize = 5;

/// Title row with a rule underneath
pub fn title<S: DisplaySurface>(surface: &mut S, text: &str) {
    surface.text(0, 0, text, false);
    surface.line(0, LINE_HEIGHT - 1, DISPLAY_WIDTH as i32 - 1, LINE_HEIGHT - 1);
}

/// Scrolling list with the selected row inverted
pub fn menu<'a, S, I>(surface: &mut S, items: I, selected: usize)
where
    S: DisplaySurface,
    I: IntoIterator<Item = &'a str>,
{
    let first = selected.saturating_sub(VISIBLE_ROWS - 1);
    for (row, (index, item)) in items
        .into_iter()
        .enumerate()
        .skip(first)
        .take(VISIBLE_ROWS)
        .enumerate()
    {
        let y = LINE_HEIGHT * (row as i32 + 1);
        let inverted = index == selected;
        if inverted {
            surface.fill_rect(0, y, DISPLAY_WIDTH, LINE_HEIGHT as u32, true);
        }
        surface.text(CHAR_WIDTH, y, item, inverted);
    }
}

/// Frequency, stereo flag and RDS texts at row `y`
pub fn frequency_line<S: DisplaySurface>(surface: &mut S, status: &RadioStatus, y: i32) {
    let mut line: String<24> = String::new();
    let _ = write!(line, "{} MHz", status.frequency());
    if status.is_stereo() {
        let _ = line.push_str(" ST");
    }
    surface.text(0, y, &line, false);
    if !status.station_name().is_empty() {
        surface.text(0, y + LINE_HEIGHT, status.station_name(), false);
    }
    let text = status.radio_text();
    if !text.is_empty() {
        let width = (DISPLAY_WIDTH as i32 / CHAR_WIDTH) as usize;
        surface.text(0, y + 2 * LINE_HEIGHT, text.get(..width).unwrap_or(text), false);
    }
}

/// Home screen footer: time, then the radio state
pub fn status_bar<S: DisplaySurface>(surface: &mut S, now: &ClockTime, radio: Option<&RadioStatus>) {
    let mut line: String<24> = String::new();
    let _ = write!(line, "{:02}:{:02}", now.hour, now.minute);
    if let Some(status) = radio {
        let _ = write!(line, "  {}", status.frequency());
        if !status.station_name().is_empty() {
            let _ = write!(line, " {}", status.station_name());
        }
    }
    let y = LINE_HEIGHT * (VISIBLE_ROWS as i32 + 1) - 4;
    surface.line(0, y - 2, DISPLAY_WIDTH as i32 - 1, y - 2);
    surface.text(0, y, &line, false);
}

/// Stored stations, current one marked with '>' and favorites with '*'
pub fn station_list<S: DisplaySurface>(surface: &mut S, favorites: &FavoriteList, playing: Frequency) {
    let mut rows: heapless::Vec<String<20>, { crate::config::FAVORITE_CAPACITY }> = heapless::Vec::new();
    for station in favorites.stations() {
        let mut row: String<20> = String::new();
        let marker = if station.frequency == playing { '>' } else { ' ' };
        let star = if station.favorite { '*' } else { ' ' };
        let _ = write!(row, "{marker}{star}{}", station.frequency);
        if let Some(label) = &station.label {
            let _ = write!(row, " {label}");
        }
        let _ = rows.push(row);
    }
    menu(surface, rows.iter().map(String::as_str), favorites.selected_index());
}

/// Alarm editor with the field under edit inverted
pub fn alarm_editor<S: DisplaySurface>(surface: &mut S, editor: &AlarmEditor) {
    let y = LINE_HEIGHT * 2;
    let mut hour: String<4> = String::new();
    let mut minute: String<4> = String::new();
    let mut volume: String<8> = String::new();
    let _ = write!(hour, "{:02}", editor.time.hour);
    let _ = write!(minute, "{:02}", editor.time.minute);
    let _ = write!(volume, "Vol {}", editor.volume.level());

    surface.text(0, y, &hour, editor.field == AlarmField::Hour);
    surface.text(2 * CHAR_WIDTH, y, ":", false);
    surface.text(3 * CHAR_WIDTH, y, &minute, editor.field == AlarmField::Minute);
    surface.text(0, y + 2 * LINE_HEIGHT, &volume, editor.field == AlarmField::Volume);
}

/// Full-width banner across the middle of the screen
pub fn banner<S: DisplaySurface>(surface: &mut S, text: &str) {
    let y = LINE_HEIGHT * 2;
    surface.fill_rect(0, y, DISPLAY_WIDTH, (LINE_HEIGHT * 2) as u32, true);
    let x = (DISPLAY_WIDTH as i32 - text.len() as i32 * CHAR_WIDTH).max(0) / 2;
    surface.text(x, y + LINE_HEIGHT / 2, text, true);
}
