use thiserror::Error;
use tracing::{info, warn};

use crate::{
    hal::{BlockStorage, HalError},
    timers::{Countdown, CountdownBank},
    types::SetpointRecord,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read setpoint block")]
    Read(#[source] HalError),
    #[error("failed to write setpoint block")]
    Write(#[source] HalError),
}

impl StoreError {
    pub fn hal(&self) -> &HalError {
        match self {
            Self::Read(source) | Self::Write(source) => source,
        }
    }
}

/// Mirrors one [`SetpointRecord`] at a fixed address, written at most once per
/// debounce window.
#[derive(Debug)]
pub struct SetpointStore<N> {
    storage: N,
    address: u16,
    delay_sec: u16,
    retry_sec: u16,
    writes: u32,
}

impl<N: BlockStorage> SetpointStore<N> {
    pub fn new(storage: N, address: u16, delay_sec: u16, retry_sec: u16) -> Self {
        Self {
            storage,
            address,
            delay_sec,
            retry_sec,
            writes: 0,
        }
    }

    pub fn storage(&self) -> &N {
        &self.storage
    }

    pub fn writes(&self) -> u32 {
        self.writes
    }

    /// Reads the stored record. An unrecognized marker or a failed read is a first
    /// boot: the default is returned and a write is armed.
    pub fn load(&mut self, default_setpoint_c: f32, timers: &CountdownBank) -> SetpointRecord {
        match self.read() {
            Ok(record) if record.is_valid() => {
                info!("loaded setpoint {:.2}", record.setpoint_c);
                return record;
            }
            Ok(_) => info!("no stored setpoint, using default {default_setpoint_c:.2}"),
            Err(err) => warn!("{err}: {}, using default", err.hal()),
        }

        self.request_save(timers);
        SetpointRecord::new(default_setpoint_c)
    }

    pub fn request_save(&self, timers: &CountdownBank) {
        timers.arm(Countdown::PersistenceDebounce, self.delay_sec);
    }

    pub fn save_pending(&self, timers: &CountdownBank) -> bool {
        !timers.is_idle(Countdown::PersistenceDebounce)
    }

    /// Called when the debounce has expired. A failed write is re-armed.
    pub fn flush(&mut self, record: &SetpointRecord, timers: &CountdownBank) {
        match self.write(record) {
            Ok(()) => info!("stored setpoint {:.2}", record.setpoint_c),
            Err(err) => {
                warn!("{err}: {}, retrying in {}s", err.hal(), self.retry_sec);
                timers.arm(Countdown::PersistenceDebounce, self.retry_sec);
            }
        }
    }

    fn read(&mut self) -> Result<SetpointRecord, StoreError> {
        let mut bytes = [0_u8; SetpointRecord::SIZE];
        self.storage
            .read_block(self.address, &mut bytes)
            .map_err(StoreError::Read)?;
        Ok(SetpointRecord::from_bytes(&bytes))
    }

    fn write(&mut self, record: &SetpointRecord) -> Result<(), StoreError> {
        self.storage
            .write_block(self.address, &record.to_bytes())
            .map_err(StoreError::Write)?;
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mock::MemStorage, types::SETPOINT_SENTINEL};

    fn store(storage: MemStorage) -> SetpointStore<MemStorage> {
        SetpointStore::new(storage, 16, 5, 2)
    }

    #[test]
    fn first_boot_uses_default_and_arms_a_write() {
        let timers = CountdownBank::new();
        let mut store = store(MemStorage::erased());

        let record = store.load(22.0, &timers);

        assert_eq!(record.setpoint_c, 22.0);
        assert_eq!(record.marker, SETPOINT_SENTINEL);
        assert_eq!(timers.remaining(Countdown::PersistenceDebounce), 5);
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn valid_record_is_loaded_without_write() {
        let timers = CountdownBank::new();
        let mut storage = MemStorage::erased();
        storage.preload(16, &SetpointRecord::new(18.5).to_bytes());
        let mut store = store(storage);

        let record = store.load(22.0, &timers);

        assert_eq!(record.setpoint_c, 18.5);
        assert!(timers.is_idle(Countdown::PersistenceDebounce));
    }

    #[test]
    fn flush_writes_record_at_fixed_address() {
        let timers = CountdownBank::new();
        let mut store = store(MemStorage::erased());

        store.flush(&SetpointRecord::new(19.25), &timers);

        assert_eq!(store.writes(), 1);
        assert_eq!(
            store.storage().bytes(16, SetpointRecord::SIZE),
            SetpointRecord::new(19.25).to_bytes().to_vec()
        );
    }

    #[test]
    fn failed_write_is_rearmed_with_retry_delay() {
        let timers = CountdownBank::new();
        let mut storage = MemStorage::erased();
        storage.fail_writes(true);
        let mut store = store(storage);

        store.flush(&SetpointRecord::new(19.0), &timers);

        assert_eq!(store.writes(), 0);
        assert_eq!(timers.remaining(Countdown::PersistenceDebounce), 2);
    }

    #[test]
    fn failed_read_is_treated_as_first_boot() {
        let timers = CountdownBank::new();
        let mut storage = MemStorage::erased();
        storage.fail_reads(true);
        let mut store = store(storage);

        let record = store.load(22.0, &timers);

        assert_eq!(record.setpoint_c, 22.0);
        assert!(store.save_pending(&timers));
    }
}
