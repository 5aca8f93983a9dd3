use std::sync::atomic::{AtomicU16, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    PersistenceDebounce,
    DisplaySleep,
    RelayLockout,
}

/// Three one-second countdowns. Zero means idle ("nothing pending" / "not locked").
#[derive(Debug, Default)]
pub struct CountdownBank {
    persistence_debounce: AtomicU16,
    display_sleep: AtomicU16,
    relay_lockout: AtomicU16,
}

impl CountdownBank {
    pub const fn new() -> Self {
        Self {
            persistence_debounce: AtomicU16::new(0),
            display_sleep: AtomicU16::new(0),
            relay_lockout: AtomicU16::new(0),
        }
    }

    fn slot(&self, countdown: Countdown) -> &AtomicU16 {
        match countdown {
            Countdown::PersistenceDebounce => &self.persistence_debounce,
            Countdown::DisplaySleep => &self.display_sleep,
            Countdown::RelayLockout => &self.relay_lockout,
        }
    }

    /// Restart from `seconds`. Repeated arming does not accumulate.
    pub fn arm(&self, countdown: Countdown, seconds: u16) {
        self.slot(countdown).store(seconds, Ordering::Release);
    }

    pub fn cancel(&self, countdown: Countdown) {
        self.arm(countdown, 0);
    }

    pub fn remaining(&self, countdown: Countdown) -> u16 {
        self.slot(countdown).load(Ordering::Acquire)
    }

    pub fn is_idle(&self, countdown: Countdown) -> bool {
        self.remaining(countdown) == 0
    }

    /// One slow tick for one countdown. Returns true on the 1 -> 0 transition only.
    pub fn tick(&self, countdown: Countdown) -> bool {
        self.slot(countdown)
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |value| {
                value.checked_sub(1)
            })
            .map(|previous| previous == 1)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_once_and_clamps_at_zero() {
        let bank = CountdownBank::new();
        bank.arm(Countdown::PersistenceDebounce, 2);

        assert!(!bank.tick(Countdown::PersistenceDebounce));
        assert!(bank.tick(Countdown::PersistenceDebounce));
        assert!(!bank.tick(Countdown::PersistenceDebounce));
        assert!(!bank.tick(Countdown::PersistenceDebounce));
        assert_eq!(bank.remaining(Countdown::PersistenceDebounce), 0);
    }

    #[test]
    fn rearming_restarts_instead_of_accumulating() {
        let bank = CountdownBank::new();
        bank.arm(Countdown::DisplaySleep, 5);
        bank.tick(Countdown::DisplaySleep);
        bank.arm(Countdown::DisplaySleep, 5);
        bank.arm(Countdown::DisplaySleep, 5);

        assert_eq!(bank.remaining(Countdown::DisplaySleep), 5);
    }

    #[test]
    fn countdowns_are_independent() {
        let bank = CountdownBank::new();
        bank.arm(Countdown::RelayLockout, 3);

        bank.tick(Countdown::RelayLockout);
        bank.tick(Countdown::DisplaySleep);

        assert_eq!(bank.remaining(Countdown::RelayLockout), 2);
        assert!(bank.is_idle(Countdown::DisplaySleep));
        assert!(bank.is_idle(Countdown::PersistenceDebounce));
    }
}
