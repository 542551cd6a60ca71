//! Modes of the Radio and Alarm applications
//!
//! A mode owns the events that reach it while engaged and says after each
//! one whether it stays engaged.

use core::fmt::Write;

use embedded_hal::i2c::I2c;
use heapless::String;

use super::render::{self, LINE_HEIGHT};
use super::{Context, DisplaySurface};
use crate::config::{FAST_TUNE_CHANNELS, SLEEP_MAX_MINUTES, SLEEP_STEP_MINUTES};
use crate::event::Event;
use crate::tuner::TunerResult;
use crate::types::{SeekDirection, TimeOfDay, Volume};

/// Mode display name
pub type ModeName = String<12>;

/// Whether a mode stays engaged after an event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeStep {
    /// Keep receiving events
    Continue,
    /// Return to mode selection
    Exit,
}

#[cfg(feature = "embedded")]
impl defmt::Format for ModeStep {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Continue => defmt::write!(f, "Continue"),
            Self::Exit => defmt::write!(f, "Exit"),
        }
    }
}

/// Scan mode progress
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanView {
    /// Waiting for the user to start
    Ready,
    /// Scan running
    Running,
    /// Scan finished with this many stations
    Done(usize),
}

/// Alarm field being edited
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlarmField {
    /// Hour
    Hour,
    /// Minute
    Minute,
    /// Target volume
    Volume,
}

/// Alarm editor state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlarmEditor {
    /// Alarm index
    pub index: usize,
    /// Field under edit
    pub field: AlarmField,
    /// Time being edited
    pub time: TimeOfDay,
    /// Volume being edited
    pub volume: Volume,
}

impl AlarmEditor {
    /// Editor for alarm `index`
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            field: AlarmField::Hour,
            time: TimeOfDay { hour: 7, minute: 0 },
            volume: crate::config::DEFAULT_ALARM_VOLUME,
        }
    }
}

/// Every mode the firmware offers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Switch the radio on or off
    Power,
    /// Tune channel by channel
    Tune,
    /// Hardware seek up or down
    Seek {
        /// A seek is running
        busy: bool,
    },
    /// Full band scan into the station list
    Scan {
        /// Progress
        view: ScanView,
    },
    /// Browse stored stations
    Stations,
    /// Sleep timer
    Sleep {
        /// Minutes being set
        minutes: u16,
    },
    /// Edit an alarm
    AlarmEdit(AlarmEditor),
    /// Arm or disarm an alarm
    AlarmToggle {
        /// Alarm index
        index: usize,
    },
}

impl Mode {
    /// Fresh scan mode
    #[must_use]
    pub const fn scan() -> Self {
        Self::Scan {
            view: ScanView::Ready,
        }
    }

    /// Fresh seek mode
    #[must_use]
    pub const fn seek() -> Self {
        Self::Seek { busy: false }
    }

    /// Fresh sleep mode
    #[must_use]
    pub const fn sleep() -> Self {
        Self::Sleep { minutes: 0 }
    }

    /// Editor for alarm `index`
    #[must_use]
    pub const fn alarm_edit(index: usize) -> Self {
        Self::AlarmEdit(AlarmEditor::new(index))
    }

    /// Name shown in the mode list
    #[must_use]
    pub fn name(&self) -> ModeName {
        let mut name = ModeName::new();
        // Longest name is "Toggle 2".
        let _ = match self {
            Self::Power => name.write_str("Power"),
            Self::Tune => name.write_str("Tune"),
            Self::Seek { .. } => name.write_str("Seek"),
            Self::Scan { .. } => name.write_str("Scan"),
            Self::Stations => name.write_str("Stations"),
            Self::Sleep { .. } => name.write_str("Sleep"),
            Self::AlarmEdit(editor) => write!(name, "Alarm {}", editor.index + 1),
            Self::AlarmToggle { index } => write!(name, "Toggle {}", index + 1),
        };
        name
    }

    /// Handle one event while engaged
    pub fn handle_event<I2C: I2c>(
        &mut self,
        event: &Event,
        ctx: &mut Context<'_, I2C>,
    ) -> TunerResult<ModeStep, I2C::Error> {
        match self {
            Self::Power => power(event, ctx),
            Self::Tune => tune(event, ctx),
            Self::Seek { busy } => seek(busy, event, ctx),
            Self::Scan { view } => scan(view, event, ctx),
            Self::Stations => stations(event, ctx),
            Self::Sleep { minutes } => sleep(minutes, event, ctx),
            Self::AlarmEdit(editor) => alarm_edit(editor, event, ctx),
            Self::AlarmToggle { index } => alarm_toggle(*index, event, ctx),
        }
    }

    /// Forced disengage (back button)
    pub fn leave<I2C: I2c>(&mut self, ctx: &mut Context<'_, I2C>) -> TunerResult<(), I2C::Error> {
        match self {
            Self::Seek { busy } => {
                let seeking = *busy && !ctx.radio.seek_state().is_idle();
                *busy = false;
                if seeking {
                    ctx.radio.stop_seek()?;
                }
                Ok(())
            }
            Self::Scan { view } if *view == ScanView::Running => {
                *view = ScanView::Ready;
                ctx.radio.stop_seek()
            }
            _ => Ok(()),
        }
    }

    /// Draw the engaged screen
    pub fn render<S: DisplaySurface, I2C: I2c>(&self, surface: &mut S, ctx: &Context<'_, I2C>) {
        let mut line: String<24> = String::new();
        render::title(surface, &self.name());
        let status = ctx.radio.status();
        match self {
            Self::Power => {
                let state = if ctx.radio.is_on() { "On" } else { "Off" };
                surface.text(0, LINE_HEIGHT * 2, state, false);
            }
            Self::Tune | Self::Seek { .. } => {
                render::frequency_line(surface, status, LINE_HEIGHT * 2);
                if matches!(self, Self::Seek { .. }) && !ctx.radio.seek_state().is_idle() {
                    surface.text(0, LINE_HEIGHT * 4, "Seeking...", false);
                }
            }
            Self::Scan { view } => {
                let _ = match view {
                    ScanView::Ready => line.write_str("Press to scan"),
                    ScanView::Running => write!(line, "Scanning {}", status.frequency()),
                    ScanView::Done(count) => write!(line, "Found {count}"),
                };
                surface.text(0, LINE_HEIGHT * 2, &line, false);
            }
            Self::Stations => {
                if ctx.favorites.is_empty() {
                    surface.text(0, LINE_HEIGHT * 2, "No stations", false);
                } else {
                    render::station_list(surface, ctx.favorites, ctx.radio.frequency());
                }
            }
            Self::Sleep { minutes } => {
                let _ = if *minutes == 0 {
                    line.write_str("Off")
                } else {
                    write!(line, "{minutes} min")
                };
                surface.text(0, LINE_HEIGHT * 2, &line, false);
            }
            Self::AlarmEdit(editor) => render::alarm_editor(surface, editor),
            Self::AlarmToggle { index } => {
                let active = ctx.alarms.get(*index).is_some_and(|a| a.is_active());
                surface.text(0, LINE_HEIGHT * 2, if active { "Active" } else { "Inactive" }, false);
            }
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Mode {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", self.name().as_str());
    }
}

fn power<I2C: I2c>(event: &Event, ctx: &mut Context<'_, I2C>) -> TunerResult<ModeStep, I2C::Error> {
    if *event == Event::ModeEnter {
        ctx.radio.toggle_power()?;
    }
    Ok(ModeStep::Exit)
}

fn tune<I2C: I2c>(event: &Event, ctx: &mut Context<'_, I2C>) -> TunerResult<ModeStep, I2C::Error> {
    match event {
        Event::ModeEnter => ctx.radio.power_on()?,
        Event::RotaryRelease => return Ok(ModeStep::Exit),
        _ => {
            if let Some(direction) = event.rotation() {
                let channels = if event.is_fast() {
                    direction * FAST_TUNE_CHANNELS
                } else {
                    direction
                };
                ctx.radio.tune_by(channels)?;
            }
        }
    }
    Ok(ModeStep::Continue)
}

fn seek<I2C: I2c>(busy: &mut bool, event: &Event, ctx: &mut Context<'_, I2C>) -> TunerResult<ModeStep, I2C::Error> {
    // Tuned is taken by the volume interceptor while the radio plays.
    if ctx.radio.seek_state().is_idle() {
        *busy = false;
    }
    match event {
        Event::ModeEnter => {
            *busy = false;
            ctx.radio.power_on()?;
        }
        Event::RotaryRelease => {
            if *busy {
                ctx.radio.stop_seek()?;
            }
            *busy = false;
            return Ok(ModeStep::Exit);
        }
        _ => {
            if let Some(rotation) = event.rotation() {
                let direction = if rotation > 0 {
                    SeekDirection::Up
                } else {
                    SeekDirection::Down
                };
                *busy = true;
                ctx.radio.seek(direction, true)?;
            }
        }
    }
    Ok(ModeStep::Continue)
}

fn scan<I2C: I2c>(view: &mut ScanView, event: &Event, ctx: &mut Context<'_, I2C>) -> TunerResult<ModeStep, I2C::Error> {
    match (event, *view) {
        (Event::ModeEnter, _) => {
            *view = ScanView::Ready;
            ctx.radio.power_on()?;
        }
        (Event::RotaryRelease, ScanView::Ready) => {
            *view = ScanView::Running;
            ctx.radio.scan()?;
        }
        (Event::RotaryRelease, ScanView::Running) => {
            ctx.radio.stop_seek()?;
            *view = ScanView::Done(commit_scan(ctx));
        }
        (Event::RotaryRelease, ScanView::Done(_)) => return Ok(ModeStep::Exit),
        (Event::SeekComplete, ScanView::Running) => {
            *view = ScanView::Done(commit_scan(ctx));
        }
        _ => {}
    }
    Ok(ModeStep::Continue)
}

fn commit_scan<I2C: I2c>(ctx: &mut Context<'_, I2C>) -> usize {
    let results = ctx.radio.take_scan_results();
    let found = results.len();
    ctx.favorites.replace_scanned(results);
    found
}

fn stations<I2C: I2c>(event: &Event, ctx: &mut Context<'_, I2C>) -> TunerResult<ModeStep, I2C::Error> {
    match event {
        Event::ModeEnter => {
            if let Some(index) = ctx.favorites.position(ctx.radio.frequency()) {
                ctx.favorites.select(index);
            }
        }
        Event::RotaryRelease => {
            let Some(station) = ctx.favorites.selected() else {
                return Ok(ModeStep::Exit);
            };
            let frequency = station.frequency;
            if ctx.radio.is_on() && frequency == ctx.radio.frequency() {
                let index = ctx.favorites.selected_index();
                ctx.favorites.toggle_favorite(index);
            } else {
                ctx.radio.power_on()?;
                ctx.radio.tune(frequency)?;
            }
        }
        _ => {
            if let Some(steps) = event.rotation() {
                ctx.favorites.select_by(steps);
            }
        }
    }
    Ok(ModeStep::Continue)
}

fn sleep<I2C: I2c>(minutes: &mut u16, event: &Event, ctx: &mut Context<'_, I2C>) -> TunerResult<ModeStep, I2C::Error> {
    match event {
        Event::ModeEnter => *minutes = ctx.radio.sleep_minutes().unwrap_or(0),
        Event::RotaryRelease => {
            ctx.radio.start_sleep(*minutes, ctx.out);
            return Ok(ModeStep::Exit);
        }
        _ => {
            if let Some(steps) = event.rotation() {
                let next = i32::from(*minutes) + steps * i32::from(SLEEP_STEP_MINUTES);
                *minutes = next.clamp(0, i32::from(SLEEP_MAX_MINUTES)) as u16;
            }
        }
    }
    Ok(ModeStep::Continue)
}

fn alarm_edit<I2C: I2c>(
    editor: &mut AlarmEditor,
    event: &Event,
    ctx: &mut Context<'_, I2C>,
) -> TunerResult<ModeStep, I2C::Error> {
    match event {
        Event::ModeEnter => {
            *editor = AlarmEditor::new(editor.index);
            if let Some(alarm) = ctx.alarms.get(editor.index) {
                editor.time = alarm.time().unwrap_or(editor.time);
                editor.volume = alarm.volume();
            }
        }
        Event::RotaryRelease => match editor.field {
            AlarmField::Hour => editor.field = AlarmField::Minute,
            AlarmField::Minute => editor.field = AlarmField::Volume,
            AlarmField::Volume => {
                if let Some(alarm) = ctx.alarms.get_mut(editor.index) {
                    alarm.set_time(editor.time);
                    alarm.set_volume(editor.volume);
                    alarm.set_active(true);
                    info!("alarm {}: set {}", editor.index, editor.time);
                }
                return Ok(ModeStep::Exit);
            }
        },
        _ => {
            if let Some(steps) = event.rotation() {
                match editor.field {
                    AlarmField::Hour => editor.time = editor.time.add_hours(steps),
                    AlarmField::Minute => {
                        let steps = if event.is_fast() { steps * 5 } else { steps };
                        editor.time = editor.time.add_minutes(steps);
                    }
                    AlarmField::Volume => editor.volume = editor.volume.step(steps),
                }
            }
        }
    }
    Ok(ModeStep::Continue)
}

fn alarm_toggle<I2C: I2c>(index: usize, event: &Event, ctx: &mut Context<'_, I2C>) -> TunerResult<ModeStep, I2C::Error> {
    if *event == Event::ModeEnter {
        if let Some(alarm) = ctx.alarms.get_mut(index) {
            // An alarm without a time cannot be armed.
            let active = !alarm.is_active() && alarm.time().is_some();
            alarm.set_active(active);
        }
    }
    Ok(ModeStep::Exit)
}
