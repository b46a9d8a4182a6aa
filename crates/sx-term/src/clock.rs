// SPDX-License-Identifier: MIT
//
// Millisecond time source.
//
// Everything above this crate measures time as a `u32` count of
// milliseconds that is allowed to wrap (about every 49.7 days). Consumers
// must compare timestamps with wrapping subtraction, never with `<`.

use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

/// A monotonic millisecond clock.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin, wrapping at `u32::MAX`.
    fn now_ms(&self) -> u32;

    /// Suspend the caller for `ms` milliseconds.
    fn sleep_ms(&self, ms: u32);
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }

    #[inline]
    fn sleep_ms(&self, ms: u32) {
        (**self).sleep_ms(ms);
    }
}

// ─── SystemClock ─────────────────────────────────────────────────────────────

/// Wall-independent clock anchored at construction time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[allow(clippy::cast_possible_truncation)] // Wrapping is the contract.
    fn now_ms(&self) -> u32 {
        self.origin.elapsed().as_millis() as u32
    }

    fn sleep_ms(&self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

// ─── ManualClock ─────────────────────────────────────────────────────────────

/// Clock that only moves when told to. Sleeping advances it instantly.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u32>,
}

impl ManualClock {
    #[must_use]
    pub const fn starting_at(ms: u32) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn set(&self, ms: u32) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }

    fn sleep_ms(&self, ms: u32) {
        self.advance(ms);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
