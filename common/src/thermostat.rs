use tracing::{info, warn};

use crate::{
    hal::{DigitalIo, Pin},
    timers::{Countdown, CountdownBank},
    types::ActuatorState,
};

/// Two-output hysteresis controller with relay lockout.
///
/// Turn-on needs the temperature to leave the hysteresis band *and* the lockout to be
/// idle; turn-off happens as soon as the setpoint is reached and re-arms the lockout.
#[derive(Debug, Clone)]
pub struct ThermostatEngine {
    state: ActuatorState,
    hysteresis_c: f32,
    lockout_sec: u16,
    sensor_fault: bool,
}

impl ThermostatEngine {
    pub fn new(hysteresis_c: f32, lockout_sec: u16) -> Self {
        Self {
            state: ActuatorState::Off,
            hysteresis_c,
            lockout_sec,
            sensor_fault: false,
        }
    }

    pub fn state(&self) -> ActuatorState {
        self.state
    }

    pub fn is_sensor_fault(&self) -> bool {
        self.sensor_fault
    }

    /// While set, nothing turns on and whatever runs is turned off.
    pub fn set_sensor_fault(&mut self, fault: bool) {
        if fault != self.sensor_fault {
            if fault {
                warn!("sensor fault, holding actuators off");
            } else {
                info!("sensor recovered");
            }
        }
        self.sensor_fault = fault;
    }

    /// Drives both outputs low and forgets the current mode.
    pub fn release<I: DigitalIo>(&mut self, io: &mut I) {
        io.set_output(Pin::HeatRelay, false);
        io.set_output(Pin::CoolRelay, false);
        self.state = ActuatorState::Off;
    }

    /// One evaluation per loop iteration. Returns the new state on a transition.
    pub fn evaluate<I: DigitalIo>(
        &mut self,
        io: &mut I,
        current_c: f32,
        setpoint_c: f32,
        timers: &CountdownBank,
    ) -> Option<ActuatorState> {
        let locked = !timers.is_idle(Countdown::RelayLockout);

        let next = match self.state {
            ActuatorState::Off if self.sensor_fault || locked => None,
            ActuatorState::Off if current_c < setpoint_c - self.hysteresis_c => {
                Some(ActuatorState::Heating)
            }
            ActuatorState::Off if current_c > setpoint_c + self.hysteresis_c => {
                Some(ActuatorState::Cooling)
            }
            ActuatorState::Off => None,
            ActuatorState::Heating if self.sensor_fault || current_c >= setpoint_c => {
                Some(ActuatorState::Off)
            }
            ActuatorState::Cooling if self.sensor_fault || current_c <= setpoint_c => {
                Some(ActuatorState::Off)
            }
            ActuatorState::Heating | ActuatorState::Cooling => None,
        }?;

        self.apply(io, next);
        if next == ActuatorState::Off {
            timers.arm(Countdown::RelayLockout, self.lockout_sec);
        }

        info!(
            "actuator {} -> {} at {current_c:.2} (setpoint {setpoint_c:.2})",
            self.state.as_str(),
            next.as_str()
        );
        self.state = next;
        Some(next)
    }

    fn apply<I: DigitalIo>(&self, io: &mut I, next: ActuatorState) {
        match next {
            ActuatorState::Heating => {
                if io.output(Pin::CoolRelay) {
                    io.set_output(Pin::CoolRelay, false);
                }
                io.set_output(Pin::HeatRelay, true);
            }
            ActuatorState::Cooling => {
                if io.output(Pin::HeatRelay) {
                    io.set_output(Pin::HeatRelay, false);
                }
                io.set_output(Pin::CoolRelay, true);
            }
            ActuatorState::Off => {
                io.set_output(Pin::HeatRelay, false);
                io.set_output(Pin::CoolRelay, false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockIo;

    fn engine() -> ThermostatEngine {
        ThermostatEngine::new(0.25, 3)
    }

    fn slow_tick(timers: &CountdownBank) {
        timers.tick(Countdown::RelayLockout);
    }

    #[test]
    fn heats_exactly_below_band() {
        let mut engine = engine();
        let mut io = MockIo::default();
        let timers = CountdownBank::new();

        for temp in [22.1, 22.0, 21.9, 21.8, 21.75] {
            assert_eq!(engine.evaluate(&mut io, temp, 22.0, &timers), None);
        }
        assert_eq!(
            engine.evaluate(&mut io, 21.5, 22.0, &timers),
            Some(ActuatorState::Heating)
        );
        assert!(io.output(Pin::HeatRelay));
        assert!(!io.output(Pin::CoolRelay));
    }

    #[test]
    fn heating_stops_at_setpoint_and_arms_lockout() {
        let mut engine = engine();
        let mut io = MockIo::default();
        let timers = CountdownBank::new();
        engine.evaluate(&mut io, 21.0, 22.0, &timers);

        assert_eq!(engine.evaluate(&mut io, 21.9, 22.0, &timers), None);
        assert_eq!(
            engine.evaluate(&mut io, 22.0, 22.0, &timers),
            Some(ActuatorState::Off)
        );
        assert_eq!(timers.remaining(Countdown::RelayLockout), 3);
        assert!(!io.output(Pin::HeatRelay));
    }

    #[test]
    fn cooling_mirrors_heating() {
        let mut engine = engine();
        let mut io = MockIo::default();
        let timers = CountdownBank::new();

        assert_eq!(engine.evaluate(&mut io, 22.25, 22.0, &timers), None);
        assert_eq!(
            engine.evaluate(&mut io, 22.3, 22.0, &timers),
            Some(ActuatorState::Cooling)
        );
        assert_eq!(engine.evaluate(&mut io, 22.01, 22.0, &timers), None);
        assert_eq!(
            engine.evaluate(&mut io, 22.0, 22.0, &timers),
            Some(ActuatorState::Off)
        );
        assert_eq!(timers.remaining(Countdown::RelayLockout), 3);
    }

    #[test]
    fn lockout_blocks_turn_on_until_expired() {
        let mut engine = engine();
        let mut io = MockIo::default();
        let timers = CountdownBank::new();
        engine.evaluate(&mut io, 21.0, 22.0, &timers);
        engine.evaluate(&mut io, 22.5, 22.0, &timers);

        // Overshoot would call for cooling right away, the lockout says no.
        for _ in 0..3 {
            assert_eq!(engine.evaluate(&mut io, 25.0, 22.0, &timers), None);
            assert_eq!(engine.state(), ActuatorState::Off);
            slow_tick(&timers);
        }

        assert_eq!(
            engine.evaluate(&mut io, 25.0, 22.0, &timers),
            Some(ActuatorState::Cooling)
        );
    }

    #[test]
    fn outputs_are_never_both_on() {
        let mut engine = engine();
        let mut io = MockIo::default();
        let timers = CountdownBank::new();
        let temps = [
            30.0, 10.0, 22.0, 21.0, 23.0, 19.0, 25.0, 22.0, 22.3, 21.7, 40.0, -5.0,
        ];
        let setpoints = [22.0, 22.0, 21.5, 23.0, 20.0];

        for (i, temp) in temps.iter().cycle().take(200).enumerate() {
            engine.evaluate(&mut io, *temp, setpoints[i % setpoints.len()], &timers);
            assert!(!(io.output(Pin::HeatRelay) && io.output(Pin::CoolRelay)));
            if i % 2 == 0 {
                slow_tick(&timers);
            }
        }
    }

    #[test]
    fn turn_on_clears_the_opposite_output_first() {
        let mut engine = engine();
        let mut io = MockIo::default();
        let timers = CountdownBank::new();
        io.set_output(Pin::CoolRelay, true);
        io.output_log.clear();

        engine.evaluate(&mut io, 20.0, 22.0, &timers);

        assert_eq!(
            io.output_log,
            vec![(Pin::CoolRelay, false), (Pin::HeatRelay, true)]
        );
    }

    #[test]
    fn sensor_fault_turns_off_and_blocks() {
        let mut engine = engine();
        let mut io = MockIo::default();
        let timers = CountdownBank::new();
        engine.evaluate(&mut io, 20.0, 22.0, &timers);

        engine.set_sensor_fault(true);
        assert_eq!(
            engine.evaluate(&mut io, 20.0, 22.0, &timers),
            Some(ActuatorState::Off)
        );
        timers.cancel(Countdown::RelayLockout);
        assert_eq!(engine.evaluate(&mut io, 20.0, 22.0, &timers), None);

        engine.set_sensor_fault(false);
        assert_eq!(
            engine.evaluate(&mut io, 20.0, 22.0, &timers),
            Some(ActuatorState::Heating)
        );
    }
}
