//! Application/mode navigation
//!
//! At the top level the encoder moves a cursor over applications and a
//! click selects one. Inside an application the encoder moves over its
//! modes and a click engages one. An engaged mode receives every event
//! until it exits. The side button always returns to the top level.

use embedded_hal::i2c::I2c;
use heapless::Vec;

use super::modes::{Mode, ModeStep};
use super::render;
use super::{Context, DisplaySurface};
use crate::config::ALARM_COUNT;
use crate::event::Event;
use crate::tuner::TunerResult;

/// Most modes one application can hold
pub const MAX_MODES: usize = 8;

/// Number of applications
pub const APP_COUNT: usize = 2;

/// Navigation depth of the selected application
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// Choosing an application
    Top,
    /// Choosing a mode
    ModeSelect,
    /// A mode is engaged
    Engaged,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Level {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Top => defmt::write!(f, "Top"),
            Self::ModeSelect => defmt::write!(f, "ModeSelect"),
            Self::Engaged => defmt::write!(f, "Engaged"),
        }
    }
}

/// What dispatching an event did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavOutcome {
    /// Nothing at the current level wanted the event
    Ignored,
    /// The event was used
    Handled,
    /// An engaged mode exited; settings may need saving
    ModeExited,
}

/// A named group of modes
#[derive(Clone, Debug)]
pub struct Application {
    name: &'static str,
    modes: Vec<Mode, MAX_MODES>,
    selected: bool,
    mode_cursor: usize,
    engaged: Option<usize>,
}

impl Application {
    /// Create an unselected application
    ///
    /// Modes past [`MAX_MODES`] are dropped.
    #[must_use]
    pub fn new(name: &'static str, modes: &[Mode]) -> Self {
        let mut list = Vec::new();
        for mode in modes.iter().take(MAX_MODES) {
            let _ = list.push(*mode);
        }
        Self {
            name,
            modes: list,
            selected: false,
            mode_cursor: 0,
            engaged: None,
        }
    }

    /// Radio application
    #[must_use]
    pub fn radio() -> Self {
        Self::new(
            "Radio",
            &[
                Mode::Power,
                Mode::Tune,
                Mode::seek(),
                Mode::scan(),
                Mode::Stations,
                Mode::sleep(),
            ],
        )
    }

    /// Alarm application: an editor and a toggle per alarm
    #[must_use]
    pub fn alarm() -> Self {
        let mut app = Self::new("Alarm", &[]);
        for index in 0..ALARM_COUNT {
            let _ = app.modes.push(Mode::alarm_edit(index));
            let _ = app.modes.push(Mode::AlarmToggle { index });
        }
        app
    }

    /// Get name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Get modes
    #[must_use]
    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    /// Check if selected
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.selected
    }

    /// Highlighted mode index
    #[must_use]
    pub const fn mode_cursor(&self) -> usize {
        self.mode_cursor
    }

    /// Engaged mode index
    #[must_use]
    pub const fn engaged(&self) -> Option<usize> {
        self.engaged
    }

    /// Engaged mode
    #[must_use]
    pub fn engaged_mode(&self) -> Option<&Mode> {
        self.engaged.and_then(|index| self.modes.get(index))
    }

    /// Navigation depth
    #[must_use]
    pub const fn level(&self) -> Level {
        match (self.selected, self.engaged) {
            (false, _) => Level::Top,
            (true, None) => Level::ModeSelect,
            (true, Some(_)) => Level::Engaged,
        }
    }

    fn select(&mut self) {
        self.selected = true;
        self.mode_cursor = 0;
        self.engaged = None;
    }

    fn deselect(&mut self) {
        self.selected = false;
        self.engaged = None;
    }

    fn move_cursor(&mut self, steps: i32) {
        let count = self.modes.len();
        if count > 0 {
            self.mode_cursor = (self.mode_cursor as i32 + steps).rem_euclid(count as i32) as usize;
        }
    }

    fn engage<I2C: I2c>(&mut self, ctx: &mut Context<'_, I2C>) -> TunerResult<NavOutcome, I2C::Error> {
        let index = self.mode_cursor;
        let Some(mode) = self.modes.get_mut(index) else {
            return Ok(NavOutcome::Ignored);
        };
        self.engaged = Some(index);
        debug!("nav: engage {}", mode);
        match mode.handle_event(&Event::ModeEnter, ctx)? {
            ModeStep::Continue => Ok(NavOutcome::Handled),
            ModeStep::Exit => {
                self.engaged = None;
                Ok(NavOutcome::ModeExited)
            }
        }
    }

    fn forward<I2C: I2c>(&mut self, event: &Event, ctx: &mut Context<'_, I2C>) -> TunerResult<NavOutcome, I2C::Error> {
        let Some(mode) = self.engaged.and_then(|index| self.modes.get_mut(index)) else {
            return Ok(NavOutcome::Ignored);
        };
        match mode.handle_event(event, ctx)? {
            ModeStep::Continue => Ok(NavOutcome::Handled),
            ModeStep::Exit => {
                debug!("nav: {} exited", mode);
                self.engaged = None;
                Ok(NavOutcome::ModeExited)
            }
        }
    }

    fn leave<I2C: I2c>(&mut self, ctx: &mut Context<'_, I2C>) -> TunerResult<(), I2C::Error> {
        if let Some(mode) = self.engaged.and_then(|index| self.modes.get_mut(index)) {
            mode.leave(ctx)?;
        }
        self.deselect();
        Ok(())
    }
}

/// Top-level navigation state
#[derive(Clone, Debug)]
pub struct Navigator {
    apps: Vec<Application, APP_COUNT>,
    cursor: usize,
    needs_update: bool,
}

impl Navigator {
    /// Radio and Alarm applications, cursor on the first
    #[must_use]
    pub fn new() -> Self {
        let mut apps = Vec::new();
        let _ = apps.push(Application::radio());
        let _ = apps.push(Application::alarm());
        Self::with_apps(apps)
    }

    /// Custom application list
    #[must_use]
    pub const fn with_apps(apps: Vec<Application, APP_COUNT>) -> Self {
        Self {
            apps,
            cursor: 0,
            needs_update: true,
        }
    }

    /// Get applications
    #[must_use]
    pub fn apps(&self) -> &[Application] {
        &self.apps
    }

    /// Highlighted application index
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Selected application, if any
    #[must_use]
    pub fn selected(&self) -> Option<&Application> {
        self.apps.iter().find(|app| app.is_selected())
    }

    /// Current navigation depth
    #[must_use]
    pub fn level(&self) -> Level {
        self.selected().map_or(Level::Top, Application::level)
    }

    /// Check if the screen should be redrawn
    #[must_use]
    pub const fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Mark as drawn
    pub fn mark_updated(&mut self) {
        self.needs_update = false;
    }

    /// Force a redraw
    pub fn invalidate(&mut self) {
        self.needs_update = true;
    }

    /// Route an event that survived the interceptors
    pub fn dispatch<I2C: I2c>(&mut self, event: &Event, ctx: &mut Context<'_, I2C>) -> TunerResult<NavOutcome, I2C::Error> {
        let outcome = self.route(event, ctx)?;
        if outcome != NavOutcome::Ignored {
            self.needs_update = true;
        }
        Ok(outcome)
    }

    fn route<I2C: I2c>(&mut self, event: &Event, ctx: &mut Context<'_, I2C>) -> TunerResult<NavOutcome, I2C::Error> {
        let count = self.apps.len();
        let Some(app) = self.apps.iter_mut().find(|app| app.is_selected()) else {
            // Top level
            if let Some(steps) = event.rotation() {
                if count > 0 {
                    self.cursor = (self.cursor as i32 + steps).rem_euclid(count as i32) as usize;
                }
                return Ok(NavOutcome::Handled);
            }
            if *event == Event::RotaryRelease {
                if let Some(app) = self.apps.get_mut(self.cursor) {
                    app.select();
                    debug!("nav: select {}", app.name());
                    return Ok(NavOutcome::Handled);
                }
            }
            return Ok(NavOutcome::Ignored);
        };

        if *event == Event::SidePush {
            app.leave(ctx)?;
            ctx.out.push(Event::Exit);
            debug!("nav: back to top");
            return Ok(NavOutcome::Handled);
        }

        match app.level() {
            Level::Engaged => app.forward(event, ctx),
            _ => {
                if let Some(steps) = event.rotation() {
                    app.move_cursor(steps);
                    Ok(NavOutcome::Handled)
                } else if *event == Event::RotaryRelease {
                    app.engage(ctx)
                } else {
                    Ok(NavOutcome::Ignored)
                }
            }
        }
    }

    /// Return to the top level without notifying anything
    pub fn reset(&mut self) {
        for app in &mut self.apps {
            app.deselect();
        }
        self.needs_update = true;
    }

    /// Draw the screen for the current level
    pub fn render<S: DisplaySurface, I2C: I2c>(&self, surface: &mut S, ctx: &Context<'_, I2C>) {
        surface.clear();
        match self.selected() {
            None => {
                render::title(surface, "FM Clock");
                render::menu(surface, self.apps.iter().map(Application::name), self.cursor);
                let radio = ctx.radio.is_on().then(|| ctx.radio.status());
                render::status_bar(surface, &ctx.now, radio);
            }
            Some(app) => match app.engaged_mode() {
                Some(mode) => mode.render(surface, ctx),
                None => {
                    render::title(surface, app.name());
                    let names: Vec<_, MAX_MODES> = app.modes().iter().map(Mode::name).collect();
                    render::menu(surface, names.iter().map(|name| name.as_str()), app.mode_cursor());
                }
            },
        }
        if ctx.alarms.any_ringing() {
            render::banner(surface, "WAKE UP");
        }
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}
