//! Capabilities the control loop consumes. Board glue implements these; the core never
//! sees registers, buses or pin numbers.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HalError {
    #[error("storage access failed: {0}")]
    Storage(String),
    #[error("temperature sensor did not answer")]
    SensorUnavailable,
    #[error("temperature reading {0} is outside the sensor range")]
    SensorOutOfRange(f32),
}

pub trait TemperatureSensor {
    /// Begins an asynchronous measurement.
    fn start_conversion(&mut self);

    /// Only meaningful once the conversion has completed.
    fn read_temperature(&mut self) -> Result<f32, HalError>;

    /// Busy-waits for the running conversion. Used at startup only.
    fn wait_until_ready(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharSize {
    Normal,
    Double,
}

pub trait CharacterDisplay {
    fn power_on(&mut self);
    fn power_off(&mut self);
    fn set_char_size(&mut self, size: CharSize);
    fn move_cursor(&mut self, column: u8, row: u8);
    fn write_text(&mut self, text: &str);
}

pub trait BlockStorage {
    fn read_block(&mut self, address: u16, buf: &mut [u8]) -> Result<(), HalError>;
    fn write_block(&mut self, address: u16, data: &[u8]) -> Result<(), HalError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pin {
    ButtonUp,
    ButtonDown,
    ButtonWake,
    HeatRelay,
    CoolRelay,
    Beeper,
}

pub trait DigitalIo {
    /// True while an (active-low) input is pulled down, i.e. pressed.
    fn is_asserted(&mut self, pin: Pin) -> bool;
    fn set_output(&mut self, pin: Pin, on: bool);
    fn output(&self, pin: Pin) -> bool;
}

pub trait Delay {
    fn delay_ms(&mut self, ms: u32);
}
