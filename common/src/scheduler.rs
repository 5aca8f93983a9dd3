//! Fast and slow tick handlers.
//!
//! Both entry points may preempt the main loop at any instruction (they run on timer
//! interrupts on target, and on separate tokio workers on the host), so they only touch
//! the atomics in [`SharedState`]: no rendering, no storage, no sensor I/O, no logging.

use std::sync::{
    atomic::{AtomicU16, AtomicU32, Ordering},
    Arc,
};

use crate::{
    events::{Event, EventFlags},
    timers::{Countdown, CountdownBank},
};

#[derive(Debug, Default)]
pub struct SharedState {
    pub flags: EventFlags,
    pub timers: CountdownBank,
    uptime: AtomicU32,
    heartbeats: AtomicU32,
    sensor_phase: AtomicU16,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slow ticks since power-on.
    pub fn uptime(&self) -> u32 {
        self.uptime.load(Ordering::Acquire)
    }

    pub fn heartbeats(&self) -> u32 {
        self.heartbeats.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct TickScheduler {
    shared: Arc<SharedState>,
    sensor_interval: u16,
}

impl TickScheduler {
    /// `sensor_interval` slow ticks until a conversion starts; the read follows one tick later.
    pub fn new(shared: Arc<SharedState>, sensor_interval: u8) -> Self {
        Self {
            shared,
            sensor_interval: u16::from(sensor_interval.max(1)),
        }
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    pub fn on_fast_tick(&self) {
        self.shared.heartbeats.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_slow_tick(&self) {
        let shared = &*self.shared;

        // Wider than the configured interval so the read tick after a start at u8::MAX exists.
        let phase = shared.sensor_phase.load(Ordering::Relaxed) + 1;
        if phase == self.sensor_interval {
            shared.flags.raise(Event::SensorStartConversion);
            shared.sensor_phase.store(phase, Ordering::Relaxed);
        } else if phase > self.sensor_interval {
            shared.flags.raise(Event::SensorReadReady);
            shared.sensor_phase.store(0, Ordering::Relaxed);
        } else {
            shared.sensor_phase.store(phase, Ordering::Relaxed);
        }

        if shared.timers.tick(Countdown::PersistenceDebounce) {
            shared.flags.raise(Event::UpdateStore);
        }
        if shared.timers.tick(Countdown::DisplaySleep) {
            shared.flags.raise(Event::DisplaySleep);
        }
        // Lockout expiry is polled by the thermostat, not signalled.
        shared.timers.tick(Countdown::RelayLockout);

        shared.uptime.fetch_add(1, Ordering::AcqRel);
        shared.flags.raise(Event::HeartbeatSecond);
    }
}
