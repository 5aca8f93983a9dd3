use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid controller config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub hysteresis_c: f32,
    pub button_step_c: f32,
    pub relay_lockout_sec: u16,
    pub sensor_interval_ticks: u8,
    pub display_off_sec: u16,
    pub store_delay_sec: u16,
    pub store_retry_sec: u16,
    pub default_setpoint_c: f32,
    pub min_setpoint_c: f32,
    pub max_setpoint_c: f32,
    pub sensor_fault_reads: u8,
    pub loop_delay_ms: u64,
    pub fast_tick_ms: u64,
    pub slow_tick_ms: u64,
    pub beep_ms: u32,
    pub store_address: u16,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            hysteresis_c: 0.25,
            button_step_c: 0.05,
            relay_lockout_sec: 3,
            sensor_interval_ticks: 10,
            display_off_sec: 30,
            store_delay_sec: 5,
            store_retry_sec: 5,
            default_setpoint_c: 22.0,
            min_setpoint_c: -30.0,
            max_setpoint_c: 60.0,
            sensor_fault_reads: 3,
            loop_delay_ms: 25,
            fast_tick_ms: 32,
            slow_tick_ms: 1_000,
            beep_ms: 100,
            store_address: 0,
        }
    }
}

impl ControllerConfig {
    pub fn from_json(raw: &[u8]) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_slice(raw)?;
        config.sanitize();
        Ok(config)
    }

    pub fn sanitize(&mut self) {
        let defaults = Self::default();

        if !self.hysteresis_c.is_finite() || self.hysteresis_c < 0.0 {
            self.hysteresis_c = defaults.hysteresis_c;
        }
        if !self.button_step_c.is_finite() || self.button_step_c <= 0.0 {
            self.button_step_c = defaults.button_step_c;
        }

        if !self.min_setpoint_c.is_finite()
            || !self.max_setpoint_c.is_finite()
            || self.min_setpoint_c >= self.max_setpoint_c
        {
            self.min_setpoint_c = defaults.min_setpoint_c;
            self.max_setpoint_c = defaults.max_setpoint_c;
        }
        if !self.default_setpoint_c.is_finite() {
            self.default_setpoint_c = defaults.default_setpoint_c;
        }
        self.default_setpoint_c = self.clamp_setpoint(self.default_setpoint_c);

        // Zero would mean "never" for the sensor and "idle" for the countdowns.
        self.sensor_interval_ticks = self.sensor_interval_ticks.max(1);
        self.store_delay_sec = self.store_delay_sec.max(1);
        self.store_retry_sec = self.store_retry_sec.max(1);
        self.display_off_sec = self.display_off_sec.max(1);
        self.sensor_fault_reads = self.sensor_fault_reads.max(1);

        self.loop_delay_ms = self.loop_delay_ms.clamp(1, 1_000);
        self.fast_tick_ms = self.fast_tick_ms.max(1);
        self.slow_tick_ms = self.slow_tick_ms.max(1);
    }

    pub fn clamp_setpoint(&self, setpoint_c: f32) -> f32 {
        setpoint_c.clamp(self.min_setpoint_c, self.max_setpoint_c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ControllerConfig::from_json(br#"{"hysteresis_c": 0.5}"#).unwrap();

        assert_eq!(
            config,
            ControllerConfig {
                hysteresis_c: 0.5,
                ..ControllerConfig::default()
            }
        );
    }

    #[test]
    fn sanitize_repairs_inverted_range_and_zero_periods() {
        let mut config = ControllerConfig {
            min_setpoint_c: 40.0,
            max_setpoint_c: 10.0,
            sensor_interval_ticks: 0,
            store_delay_sec: 0,
            slow_tick_ms: 0,
            default_setpoint_c: 99.0,
            ..ControllerConfig::default()
        };
        config.sanitize();

        assert_eq!(config.min_setpoint_c, -30.0);
        assert_eq!(config.max_setpoint_c, 60.0);
        assert_eq!(config.default_setpoint_c, 60.0);
        assert_eq!(config.sensor_interval_ticks, 1);
        assert_eq!(config.store_delay_sec, 1);
        assert_eq!(config.slow_tick_ms, 1);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            ControllerConfig::from_json(b"{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
