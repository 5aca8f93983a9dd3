//! In-memory capability fakes for unit tests.

use std::collections::{HashSet, VecDeque};

use crate::hal::{
    BlockStorage, CharSize, CharacterDisplay, Delay, DigitalIo, HalError, Pin, TemperatureSensor,
};

pub struct MemStorage {
    bytes: Vec<u8>,
    writes: u32,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemStorage {
    pub fn erased() -> Self {
        Self {
            bytes: vec![0xFF; 64],
            writes: 0,
            fail_reads: false,
            fail_writes: false,
        }
    }

    pub fn preload(&mut self, address: u16, data: &[u8]) {
        let start = address as usize;
        self.bytes[start..start + data.len()].copy_from_slice(data);
    }

    pub fn bytes(&self, address: u16, len: usize) -> Vec<u8> {
        let start = address as usize;
        self.bytes[start..start + len].to_vec()
    }

    pub fn writes(&self) -> u32 {
        self.writes
    }

    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl BlockStorage for MemStorage {
    fn read_block(&mut self, address: u16, buf: &mut [u8]) -> Result<(), HalError> {
        if self.fail_reads {
            return Err(HalError::Storage("read refused".to_string()));
        }
        let start = address as usize;
        buf.copy_from_slice(&self.bytes[start..start + buf.len()]);
        Ok(())
    }

    fn write_block(&mut self, address: u16, data: &[u8]) -> Result<(), HalError> {
        if self.fail_writes {
            return Err(HalError::Storage("write refused".to_string()));
        }
        self.preload(address, data);
        self.writes += 1;
        Ok(())
    }
}

/// Returns queued readings; repeats the last one once the queue runs dry.
pub struct ScriptedSensor {
    readings: VecDeque<Result<f32, HalError>>,
    last: Result<f32, HalError>,
    pub conversions: u32,
    pub waits: u32,
}

impl ScriptedSensor {
    pub fn new(first: f32) -> Self {
        Self {
            readings: VecDeque::new(),
            last: Ok(first),
            conversions: 0,
            waits: 0,
        }
    }

    pub fn push(&mut self, reading: f32) {
        self.readings.push_back(Ok(reading));
    }

    pub fn push_failure(&mut self) {
        self.readings.push_back(Err(HalError::SensorUnavailable));
    }
}

impl TemperatureSensor for ScriptedSensor {
    fn start_conversion(&mut self) {
        self.conversions += 1;
    }

    fn read_temperature(&mut self) -> Result<f32, HalError> {
        if let Some(next) = self.readings.pop_front() {
            self.last = next;
        }
        self.last.clone()
    }

    fn wait_until_ready(&mut self) {
        self.waits += 1;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayOp {
    PowerOn,
    PowerOff,
    Size(CharSize),
    Cursor(u8, u8),
    Text(String),
}

#[derive(Default)]
pub struct RecordingDisplay {
    pub ops: Vec<DisplayOp>,
}

impl RecordingDisplay {
    pub fn take(&mut self) -> Vec<DisplayOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DisplayOp::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, text: &str) -> usize {
        self.texts().iter().filter(|t| **t == text).count()
    }
}

impl CharacterDisplay for RecordingDisplay {
    fn power_on(&mut self) {
        self.ops.push(DisplayOp::PowerOn);
    }

    fn power_off(&mut self) {
        self.ops.push(DisplayOp::PowerOff);
    }

    fn set_char_size(&mut self, size: CharSize) {
        self.ops.push(DisplayOp::Size(size));
    }

    fn move_cursor(&mut self, column: u8, row: u8) {
        self.ops.push(DisplayOp::Cursor(column, row));
    }

    fn write_text(&mut self, text: &str) {
        self.ops.push(DisplayOp::Text(text.to_string()));
    }
}

#[derive(Default)]
pub struct MockIo {
    pressed: HashSet<Pin>,
    outputs: HashSet<Pin>,
    pub output_log: Vec<(Pin, bool)>,
}

impl MockIo {
    pub fn press(&mut self, pin: Pin) {
        self.pressed.insert(pin);
    }

    pub fn release(&mut self, pin: Pin) {
        self.pressed.remove(&pin);
    }
}

impl DigitalIo for MockIo {
    fn is_asserted(&mut self, pin: Pin) -> bool {
        self.pressed.contains(&pin)
    }

    fn set_output(&mut self, pin: Pin, on: bool) {
        self.output_log.push((pin, on));
        if on {
            self.outputs.insert(pin);
        } else {
            self.outputs.remove(&pin);
        }
    }

    fn output(&self, pin: Pin) -> bool {
        self.outputs.contains(&pin)
    }
}

#[derive(Default)]
pub struct NoDelay {
    pub total_ms: u32,
}

impl Delay for NoDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += ms;
    }
}
