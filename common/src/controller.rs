//! The main control loop: one context object owning every piece of loop-side state,
//! driven by [`Controller::iterate`] at a fixed throttle.

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::{
    buttons::{ButtonPress, ButtonSampler},
    config::ControllerConfig,
    display::{DisplaySession, View},
    events::Event,
    hal::{BlockStorage, CharacterDisplay, Delay, DigitalIo, HalError, Pin, TemperatureSensor},
    scheduler::SharedState,
    store::SetpointStore,
    thermostat::ThermostatEngine,
    timers::Countdown,
    types::{ActuatorState, SetpointRecord, TemperatureSample, Trend},
};

/// Physical range of the probe; anything outside is a bad read.
const SENSOR_MIN_C: f32 = -55.0;
const SENSOR_MAX_C: f32 = 125.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Drain(Event),
    SampleButtons,
    EvaluateThermostat,
}

/// Handling order within one iteration. Sensor updates come before buttons and the
/// thermostat so neither acts on a temperature older than the iteration.
pub const ITERATION_ORDER: [Step; 8] = [
    Step::Drain(Event::DisplaySleep),
    Step::Drain(Event::DisplayWake),
    Step::Drain(Event::SensorStartConversion),
    Step::Drain(Event::SensorReadReady),
    Step::SampleButtons,
    Step::EvaluateThermostat,
    Step::Drain(Event::UpdateStore),
    Step::Drain(Event::HeartbeatSecond),
];

pub struct Peripherals<S, D, N, I> {
    pub sensor: S,
    pub display: D,
    pub storage: N,
    pub io: I,
}

pub struct Controller<S, D, N, I> {
    config: ControllerConfig,
    shared: Arc<SharedState>,
    sensor: S,
    display: DisplaySession<D>,
    store: SetpointStore<N>,
    io: I,
    engine: ThermostatEngine,
    buttons: ButtonSampler,
    record: SetpointRecord,
    /// `None` until a reading has been accepted.
    sample: Option<TemperatureSample>,
    failed_reads: u8,
}

impl<S, D, N, I> Controller<S, D, N, I>
where
    S: TemperatureSensor,
    D: CharacterDisplay,
    N: BlockStorage,
    I: DigitalIo,
{
    pub fn new(
        mut config: ControllerConfig,
        shared: Arc<SharedState>,
        peripherals: Peripherals<S, D, N, I>,
    ) -> Self {
        config.sanitize();
        let store = SetpointStore::new(
            peripherals.storage,
            config.store_address,
            config.store_delay_sec,
            config.store_retry_sec,
        );
        let engine = ThermostatEngine::new(config.hysteresis_c, config.relay_lockout_sec);
        let record = SetpointRecord::new(config.default_setpoint_c);

        Self {
            config,
            shared,
            sensor: peripherals.sensor,
            display: DisplaySession::new(peripherals.display),
            store,
            io: peripherals.io,
            engine,
            buttons: ButtonSampler,
            record,
            sample: None,
            failed_reads: 0,
        }
    }

    /// Power-on sequence: outputs released, beep, loading screen, setpoint load and one
    /// blocking sensor conversion, then the full screen.
    pub fn startup<T: Delay>(&mut self, delay: &mut T) {
        self.engine.release(&mut self.io);
        self.shared
            .timers
            .arm(Countdown::DisplaySleep, self.config.display_off_sec);

        self.io.set_output(Pin::Beeper, true);
        delay.delay_ms(self.config.beep_ms);
        self.io.set_output(Pin::Beeper, false);

        self.display.wake(None);
        self.display.render_loading();

        self.record = self
            .store
            .load(self.config.default_setpoint_c, &self.shared.timers);

        self.sensor.start_conversion();
        self.sensor.wait_until_ready();
        match self.read_sensor() {
            Ok(reading) => self.sample = Some(TemperatureSample::first(reading)),
            Err(err) => {
                warn!("initial temperature read failed: {err}");
                self.failed_reads = self.config.sensor_fault_reads;
                self.engine.set_sensor_fault(true);
            }
        }

        self.display.render_static();
        let view = self.view();
        self.display.render_values(&view);

        match self.current_c() {
            Some(current_c) => info!(
                "controller started: setpoint {:.2}, temperature {current_c:.2}",
                self.record.setpoint_c
            ),
            None => info!(
                "controller started: setpoint {:.2}, no temperature yet",
                self.record.setpoint_c
            ),
        }
    }

    /// One pass over [`ITERATION_ORDER`]. Never blocks; the caller throttles.
    pub fn iterate(&mut self) {
        for step in ITERATION_ORDER {
            self.run(step);
        }
    }

    /// Writes a pending debounced setpoint right away and drops the actuators.
    pub fn shutdown(&mut self) {
        if self.store.save_pending(&self.shared.timers) {
            self.shared.timers.cancel(Countdown::PersistenceDebounce);
            self.store.flush(&self.record, &self.shared.timers);
        }
        self.engine.release(&mut self.io);
        self.display.sleep();
        info!("controller stopped");
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    pub fn setpoint_c(&self) -> f32 {
        self.record.setpoint_c
    }

    pub fn current_c(&self) -> Option<f32> {
        self.sample.map(|sample| sample.current)
    }

    pub fn actuator(&self) -> ActuatorState {
        self.engine.state()
    }

    pub fn is_sensor_fault(&self) -> bool {
        self.engine.is_sensor_fault()
    }

    pub fn display(&self) -> &DisplaySession<D> {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut DisplaySession<D> {
        &mut self.display
    }

    pub fn store(&self) -> &SetpointStore<N> {
        &self.store
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn io(&self) -> &I {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut I {
        &mut self.io
    }

    pub fn view(&self) -> View {
        View {
            current_c: self.current_c(),
            setpoint_c: self.record.setpoint_c,
            mode: self.engine.state(),
            trend: self.sample.map_or(Trend::Unchanged, |sample| sample.trend()),
            uptime: self.shared.uptime(),
        }
    }

    fn run(&mut self, step: Step) {
        match step {
            Step::Drain(event) => {
                if self.shared.flags.is_pending(event) {
                    self.handle(event);
                    self.shared.flags.clear(event);
                }
            }
            Step::SampleButtons => self.sample_buttons(),
            Step::EvaluateThermostat => {
                let Some(current_c) = self.current_c() else {
                    return;
                };
                if let Some(mode) = self.engine.evaluate(
                    &mut self.io,
                    current_c,
                    self.record.setpoint_c,
                    &self.shared.timers,
                ) {
                    self.display.render_mode(mode);
                }
            }
        }
    }

    fn handle(&mut self, event: Event) {
        trace!("handling {event:?}");
        match event {
            Event::DisplaySleep => {
                self.display.sleep();
            }
            Event::DisplayWake => {
                let view = self.view();
                self.display.wake(Some(&view));
            }
            Event::SensorStartConversion => self.sensor.start_conversion(),
            Event::SensorReadReady => self.accept_reading(),
            Event::UpdateStore => self.store.flush(&self.record, &self.shared.timers),
            Event::HeartbeatSecond => self.display.render_uptime(self.shared.uptime()),
        }
    }

    fn accept_reading(&mut self) {
        match self.read_sensor() {
            Ok(reading) => {
                let trend = match self.sample.as_mut() {
                    Some(sample) => {
                        let trend = sample.trend_to(reading);
                        sample.accept(reading);
                        trend
                    }
                    None => {
                        self.sample = Some(TemperatureSample::first(reading));
                        Trend::Unchanged
                    }
                };
                self.display.render_trend(trend);
                self.display.render_current(reading);
                self.display.render_diff(reading, self.record.setpoint_c);

                self.failed_reads = 0;
                self.engine.set_sensor_fault(false);
                debug!("temperature {reading:.2}");
            }
            Err(err) => {
                self.failed_reads = self.failed_reads.saturating_add(1);
                warn!(
                    "temperature read failed ({} in a row): {err}",
                    self.failed_reads
                );
                if self.failed_reads >= self.config.sensor_fault_reads {
                    self.engine.set_sensor_fault(true);
                }
            }
        }
    }

    fn read_sensor(&mut self) -> Result<f32, HalError> {
        let reading = self.sensor.read_temperature()?;
        if !reading.is_finite() || !(SENSOR_MIN_C..=SENSOR_MAX_C).contains(&reading) {
            return Err(HalError::SensorOutOfRange(reading));
        }
        Ok(reading)
    }

    fn sample_buttons(&mut self) {
        match self.buttons.sample(&mut self.io) {
            Some(ButtonPress::Raise) => self.adjust_setpoint(self.config.button_step_c),
            Some(ButtonPress::Lower) => self.adjust_setpoint(-self.config.button_step_c),
            Some(ButtonPress::Wake) => self.keep_display_awake(),
            None => {}
        }
    }

    fn adjust_setpoint(&mut self, delta_c: f32) {
        self.record.setpoint_c = self
            .config
            .clamp_setpoint(self.record.setpoint_c + delta_c);
        self.store.request_save(&self.shared.timers);
        self.keep_display_awake();

        self.display.render_setpoint(self.record.setpoint_c);
        if let Some(current_c) = self.current_c() {
            self.display.render_diff(current_c, self.record.setpoint_c);
        }
    }

    fn keep_display_awake(&mut self) {
        self.shared
            .timers
            .arm(Countdown::DisplaySleep, self.config.display_off_sec);
        self.shared.flags.raise(Event::DisplayWake);
    }
}
