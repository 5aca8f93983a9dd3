use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActuatorState {
    Off,
    Heating,
    Cooling,
}

impl ActuatorState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Heating => "HEATING",
            Self::Cooling => "COOLING",
        }
    }

    /// Mode indicator text, padded to a fixed width so it overwrites the previous one.
    pub fn indicator(self) -> &'static str {
        match self {
            Self::Off => "<off> ",
            Self::Heating => "<heat>",
            Self::Cooling => "<cool>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Unchanged,
}

impl Trend {
    pub fn indicator(self) -> &'static str {
        match self {
            Self::Up => "<up>  ",
            Self::Down => "<down>",
            Self::Unchanged => "<none>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureSample {
    pub current: f32,
    pub previous: f32,
}

impl TemperatureSample {
    pub fn first(reading: f32) -> Self {
        Self {
            current: reading,
            previous: reading,
        }
    }

    /// Direction of the pending reading relative to the accepted one.
    pub fn trend_to(&self, reading: f32) -> Trend {
        if reading > self.current {
            Trend::Up
        } else if reading < self.current {
            Trend::Down
        } else {
            Trend::Unchanged
        }
    }

    pub fn accept(&mut self, reading: f32) {
        self.previous = self.current;
        self.current = reading;
    }

    pub fn trend(&self) -> Trend {
        if self.current > self.previous {
            Trend::Up
        } else if self.current < self.previous {
            Trend::Down
        } else {
            Trend::Unchanged
        }
    }
}

/// Validity marker written next to the setpoint once it has been initialized.
pub const SETPOINT_SENTINEL: u8 = 28;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetpointRecord {
    pub setpoint_c: f32,
    pub marker: u8,
}

impl SetpointRecord {
    /// Stored layout: little-endian `f32` setpoint followed by the marker byte.
    pub const SIZE: usize = 5;

    pub fn new(setpoint_c: f32) -> Self {
        Self {
            setpoint_c,
            marker: SETPOINT_SENTINEL,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.marker == SETPOINT_SENTINEL && self.setpoint_c.is_finite()
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0_u8; Self::SIZE];
        bytes[..4].copy_from_slice(&self.setpoint_c.to_le_bytes());
        bytes[4] = self.marker;
        bytes
    }

    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        Self {
            setpoint_c: f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            marker: bytes[4],
        }
    }
}
