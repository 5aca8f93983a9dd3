//! Simulated board for running the controller on a workstation.

use std::{
    io::ErrorKind,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use tracing::{debug, info};

use relaystat_common::{
    BlockStorage, CharSize, CharacterDisplay, Delay, DigitalIo, HalError, Pin, TemperatureSensor,
};

const CONVERSION_TIME: Duration = Duration::from_millis(750);
/// 12-bit probe resolution.
const SENSOR_STEP_C: f32 = 0.0625;

const HEAT_RATE_C_PER_SEC: f32 = 0.02;
const COOL_RATE_C_PER_SEC: f32 = 0.02;
const LEAK_PER_SEC: f32 = 0.002;

const EEPROM_SIZE: usize = 512;

const DISPLAY_COLUMNS: usize = 21;
const DISPLAY_ROWS: usize = 8;

/// Relay and button lines shared between the controller and the stdin task.
#[derive(Debug, Default)]
pub struct Board {
    heat: AtomicBool,
    cool: AtomicBool,
    beep: AtomicBool,
    up: AtomicU32,
    down: AtomicU32,
    wake: AtomicU32,
}

impl Board {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Holds a button down for `iterations` loop iterations.
    pub fn hold(&self, pin: Pin, iterations: u32) {
        if let Some(line) = self.button(pin) {
            line.store(iterations, Ordering::Release);
        }
    }

    fn button(&self, pin: Pin) -> Option<&AtomicU32> {
        match pin {
            Pin::ButtonUp => Some(&self.up),
            Pin::ButtonDown => Some(&self.down),
            Pin::ButtonWake => Some(&self.wake),
            _ => None,
        }
    }

    fn relay(&self, pin: Pin) -> Option<&AtomicBool> {
        match pin {
            Pin::HeatRelay => Some(&self.heat),
            Pin::CoolRelay => Some(&self.cool),
            Pin::Beeper => Some(&self.beep),
            _ => None,
        }
    }
}

pub struct SimIo {
    board: Arc<Board>,
}

impl SimIo {
    pub fn new(board: Arc<Board>) -> Self {
        Self { board }
    }
}

impl DigitalIo for SimIo {
    fn is_asserted(&mut self, pin: Pin) -> bool {
        let Some(line) = self.board.button(pin) else {
            return false;
        };
        line.fetch_update(Ordering::AcqRel, Ordering::Acquire, |held| held.checked_sub(1))
            .is_ok()
    }

    fn set_output(&mut self, pin: Pin, on: bool) {
        if let Some(line) = self.board.relay(pin) {
            if line.swap(on, Ordering::AcqRel) != on {
                info!("{pin:?} {}", if on { "on" } else { "off" });
            }
        }
    }

    fn output(&self, pin: Pin) -> bool {
        self.board
            .relay(pin)
            .map(|line| line.load(Ordering::Acquire))
            .unwrap_or(false)
    }
}

/// First-order room model: drifts toward ambient, pushed by whichever relay is on.
pub struct SimSensor {
    board: Arc<Board>,
    ambient_c: f32,
    room_c: f32,
    last_update: Instant,
    conversion_started: Option<Instant>,
}

impl SimSensor {
    pub fn new(board: Arc<Board>, ambient_c: f32) -> Self {
        Self {
            board,
            ambient_c,
            room_c: ambient_c,
            last_update: Instant::now(),
            conversion_started: None,
        }
    }

    fn advance(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update).as_secs_f32();
        self.last_update = now;

        let mut delta = (self.ambient_c - self.room_c) * LEAK_PER_SEC * dt;
        if self.board.heat.load(Ordering::Acquire) {
            delta += HEAT_RATE_C_PER_SEC * dt;
        }
        if self.board.cool.load(Ordering::Acquire) {
            delta -= COOL_RATE_C_PER_SEC * dt;
        }
        self.room_c += delta;
    }
}

impl TemperatureSensor for SimSensor {
    fn start_conversion(&mut self) {
        self.conversion_started = Some(Instant::now());
    }

    fn read_temperature(&mut self) -> Result<f32, HalError> {
        if self.conversion_started.take().is_none() {
            return Err(HalError::SensorUnavailable);
        }
        self.advance();
        Ok((self.room_c / SENSOR_STEP_C).round() * SENSOR_STEP_C)
    }

    fn wait_until_ready(&mut self) {
        if let Some(started) = self.conversion_started {
            let elapsed = started.elapsed();
            if elapsed < CONVERSION_TIME {
                std::thread::sleep(CONVERSION_TIME - elapsed);
            }
        }
    }
}

/// Character grid that logs each row as it changes.
pub struct GridDisplay {
    rows: [[char; DISPLAY_COLUMNS]; DISPLAY_ROWS],
    column: usize,
    row: usize,
    size: CharSize,
}

impl GridDisplay {
    pub fn new() -> Self {
        Self {
            rows: [[' '; DISPLAY_COLUMNS]; DISPLAY_ROWS],
            column: 0,
            row: 0,
            size: CharSize::Normal,
        }
    }

    fn line(&self, row: usize) -> String {
        self.rows[row].iter().collect::<String>().trim_end().to_string()
    }
}

impl CharacterDisplay for GridDisplay {
    fn power_on(&mut self) {
        info!("display powered on");
    }

    fn power_off(&mut self) {
        self.rows = [[' '; DISPLAY_COLUMNS]; DISPLAY_ROWS];
        info!("display powered off");
    }

    fn set_char_size(&mut self, size: CharSize) {
        self.size = size;
    }

    fn move_cursor(&mut self, column: u8, row: u8) {
        self.column = column as usize;
        self.row = (row as usize).min(DISPLAY_ROWS - 1);
    }

    fn write_text(&mut self, text: &str) {
        let stride = match self.size {
            CharSize::Normal => 1,
            CharSize::Double => 2,
        };
        for ch in text.chars() {
            if self.column >= DISPLAY_COLUMNS {
                break;
            }
            self.rows[self.row][self.column] = ch;
            self.column += stride;
        }
        debug!(row = self.row, "|{}|", self.line(self.row));
    }
}

/// EEPROM image kept in a file; unwritten cells read as 0xFF.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn image(&self) -> Result<Vec<u8>, HalError> {
        match std::fs::read(&self.path) {
            Ok(mut raw) => {
                raw.resize(EEPROM_SIZE, 0xFF);
                Ok(raw)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(vec![0xFF; EEPROM_SIZE]),
            Err(err) => Err(HalError::Storage(err.to_string())),
        }
    }

    fn range(address: u16, len: usize) -> Result<std::ops::Range<usize>, HalError> {
        let start = address as usize;
        let end = start + len;
        if end > EEPROM_SIZE {
            return Err(HalError::Storage(format!(
                "block {start}..{end} exceeds {EEPROM_SIZE} bytes"
            )));
        }
        Ok(start..end)
    }
}

impl BlockStorage for FileStorage {
    fn read_block(&mut self, address: u16, buf: &mut [u8]) -> Result<(), HalError> {
        let range = Self::range(address, buf.len())?;
        buf.copy_from_slice(&self.image()?[range]);
        Ok(())
    }

    fn write_block(&mut self, address: u16, data: &[u8]) -> Result<(), HalError> {
        let range = Self::range(address, data.len())?;
        let mut image = self.image()?;
        image[range].copy_from_slice(data);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| HalError::Storage(err.to_string()))?;
        }
        std::fs::write(&self.path, image).map_err(|err| HalError::Storage(err.to_string()))
    }
}

pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms.into()));
    }
}
