pub mod buttons;
pub mod config;
pub mod controller;
pub mod display;
pub mod events;
pub mod hal;
#[cfg(test)]
mod mock;
pub mod scheduler;
pub mod store;
pub mod thermostat;
pub mod timers;
pub mod types;

pub use buttons::{ButtonPress, ButtonSampler};
pub use config::{ConfigError, ControllerConfig};
pub use controller::{Controller, Peripherals, Step, ITERATION_ORDER};
pub use display::{DisplaySession, View};
pub use events::{Event, EventFlags};
pub use hal::{
    BlockStorage, CharSize, CharacterDisplay, Delay, DigitalIo, HalError, Pin, TemperatureSensor,
};
pub use scheduler::{SharedState, TickScheduler};
pub use store::{SetpointStore, StoreError};
pub use thermostat::ThermostatEngine;
pub use timers::{Countdown, CountdownBank};
pub use types::{ActuatorState, DisplayStatus, SetpointRecord, TemperatureSample, Trend};
