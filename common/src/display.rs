//! Screen layout and display power state.
//!
//! Every render call checks the power state itself, so callers may render freely while
//! the display sleeps; the next wake redraws everything anyway.

use core::fmt::Write;

use heapless::String;
use tracing::debug;

use crate::{
    hal::{CharSize, CharacterDisplay},
    types::{ActuatorState, DisplayStatus, Trend},
};

const VALUE_COLUMN: u8 = 7;
const CURRENT_TEMP_COLUMN: u8 = 5;

const ROW_CURRENT: u8 = 0;
const ROW_SETPOINT: u8 = 3;
const ROW_MODE: u8 = 4;
const ROW_DIFF: u8 = 5;
const ROW_CHANGE: u8 = 6;
const ROW_STATUS: u8 = 7;

/// Shown in place of the temperature until the first good reading.
const NO_READING: &str = "--.--°C  ";
const NO_DIFF: &str = "<--.--°C>     ";

type Line = String<32>;

/// Everything the value rows show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub current_c: Option<f32>,
    pub setpoint_c: f32,
    pub mode: ActuatorState,
    pub trend: Trend,
    pub uptime: u32,
}

#[derive(Debug)]
pub struct DisplaySession<D> {
    display: D,
    status: DisplayStatus,
}

impl<D: CharacterDisplay> DisplaySession<D> {
    pub fn new(display: D) -> Self {
        Self {
            display,
            status: DisplayStatus::Off,
        }
    }

    pub fn status(&self) -> DisplayStatus {
        self.status
    }

    pub fn is_on(&self) -> bool {
        self.status == DisplayStatus::On
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Powers on if off. With a view, the static layout and then every value are drawn.
    /// Returns whether the display was woken.
    pub fn wake(&mut self, redraw: Option<&View>) -> bool {
        if self.is_on() {
            return false;
        }

        self.display.power_on();
        self.status = DisplayStatus::On;
        debug!("display on");

        if let Some(view) = redraw {
            self.render_static();
            self.render_values(view);
        }
        true
    }

    pub fn sleep(&mut self) -> bool {
        if !self.is_on() {
            return false;
        }

        self.display.power_off();
        self.status = DisplayStatus::Off;
        debug!("display off");
        true
    }

    pub fn render_loading(&mut self) {
        if !self.is_on() {
            return;
        }
        self.display.set_char_size(CharSize::Double);
        self.display.move_cursor(0, 0);
        self.display.write_text("Loading...");
    }

    pub fn render_static(&mut self) {
        if !self.is_on() {
            return;
        }
        self.display.set_char_size(CharSize::Double);
        self.display.move_cursor(0, ROW_CURRENT);
        self.display.write_text("T: ");

        self.display.set_char_size(CharSize::Normal);
        for (row, label) in [
            (ROW_SETPOINT, "Set to "),
            (ROW_MODE, "Mode "),
            (ROW_DIFF, "Diff "),
            (ROW_CHANGE, "Change <none>"),
            (ROW_STATUS, "Status "),
        ] {
            self.display.move_cursor(0, row);
            self.display.write_text(label);
        }
    }

    pub fn render_values(&mut self, view: &View) {
        if !self.is_on() {
            return;
        }
        match view.current_c {
            Some(current_c) => self.render_current(current_c),
            None => self.put(CharSize::Double, CURRENT_TEMP_COLUMN, ROW_CURRENT, NO_READING),
        }
        self.render_setpoint(view.setpoint_c);
        self.render_mode(view.mode);
        match view.current_c {
            Some(current_c) => self.render_diff(current_c, view.setpoint_c),
            None => self.put(CharSize::Normal, VALUE_COLUMN, ROW_DIFF, NO_DIFF),
        }
        self.render_trend(view.trend);
        self.render_uptime(view.uptime);
    }

    pub fn render_current(&mut self, current_c: f32) {
        if !self.is_on() {
            return;
        }
        let mut line = Line::new();
        let _ = write!(line, "{current_c:.2}°C  ");
        self.put(CharSize::Double, CURRENT_TEMP_COLUMN, ROW_CURRENT, &line);
    }

    pub fn render_setpoint(&mut self, setpoint_c: f32) {
        if !self.is_on() {
            return;
        }
        let mut line = Line::new();
        let _ = write!(line, "<{setpoint_c:.2}°C>     ");
        self.put(CharSize::Normal, VALUE_COLUMN, ROW_SETPOINT, &line);
    }

    pub fn render_mode(&mut self, mode: ActuatorState) {
        if !self.is_on() {
            return;
        }
        self.put(CharSize::Normal, VALUE_COLUMN, ROW_MODE, mode.indicator());
    }

    pub fn render_diff(&mut self, current_c: f32, setpoint_c: f32) {
        if !self.is_on() {
            return;
        }
        let mut line = Line::new();
        let _ = write!(line, "<{:.2}°C>     ", (current_c - setpoint_c).abs());
        self.put(CharSize::Normal, VALUE_COLUMN, ROW_DIFF, &line);
    }

    pub fn render_trend(&mut self, trend: Trend) {
        if !self.is_on() {
            return;
        }
        self.put(CharSize::Normal, VALUE_COLUMN, ROW_CHANGE, trend.indicator());
    }

    pub fn render_uptime(&mut self, uptime: u32) {
        if !self.is_on() {
            return;
        }
        let mut line = Line::new();
        let _ = write!(line, "<{uptime}>");
        self.put(CharSize::Normal, VALUE_COLUMN, ROW_STATUS, &line);
    }

    fn put(&mut self, size: CharSize, column: u8, row: u8, text: &str) {
        self.display.set_char_size(size);
        self.display.move_cursor(column, row);
        self.display.write_text(text);
    }
}
