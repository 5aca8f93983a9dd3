//! Pending-event markers shared between the tick handlers and the main loop.
//!
//! Producers only ever set bits and the consumer only ever clears them, each with a
//! single atomic read-modify-write, so a bit raised between the consumer's check and
//! its clear of a *different* bit is never lost.

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Event {
    UpdateStore = 0,
    DisplaySleep = 1,
    DisplayWake = 2,
    SensorStartConversion = 3,
    SensorReadReady = 4,
    HeartbeatSecond = 5,
}

impl Event {
    fn mask(self) -> u8 {
        1 << self as u8
    }
}

#[derive(Debug, Default)]
pub struct EventFlags {
    bits: AtomicU8,
}

impl EventFlags {
    pub const fn new() -> Self {
        Self {
            bits: AtomicU8::new(0),
        }
    }

    /// Idempotent; safe from handler context.
    pub fn raise(&self, event: Event) {
        self.bits.fetch_or(event.mask(), Ordering::Release);
    }

    pub fn is_pending(&self, event: Event) -> bool {
        self.bits.load(Ordering::Acquire) & event.mask() != 0
    }

    /// Consumer side only. Call after the event has been fully handled.
    pub fn clear(&self, event: Event) {
        self.bits.fetch_and(!event.mask(), Ordering::AcqRel);
    }
}
