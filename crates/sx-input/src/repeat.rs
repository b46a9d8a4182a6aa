// SPDX-License-Identifier: MIT
//
// Key repeat inference.
//
// A terminal only reports key presses. Holding a key produces one press,
// a pause (the repeat delay), then a steady stream of presses (the repeat
// rate), and nothing at all when the key is let go. A game needs press and
// release events, so releases have to be inferred from silence, and how
// long a silence counts as "released" depends on the user's keyboard
// settings, which the terminal never tells us.
//
// So we measure them. Every key keeps the timestamps of its last five
// presses. When the three deltas between presses 2 through 5 agree to
// within 10 ms each on average, the key is auto-repeating: their mean is
// the repeat rate and the first delta is the repeat delay. Each newly
// confirmed repeat contributes one sample to a shared 16-slot history, and
// the estimate used for release timing is the sample closest to the
// history's mean, which shrugs off the odd outlier.
//
// Per-key states:
//
//     off ──press──▶ down ──press──▶ repeating
//                     │                  │
//                  silence            silence
//                     ▼                  ▼
//                  waiting ──press──▶ repeating   (release sent on leaving down)
//                     │
//                  silence ──▶ off
//
// `waiting` covers the gap between the first press and the first repeat:
// a release has already been sent, but a repeat may still arrive and
// should then count as a press of a held key.

use crate::keys::KeyCode;
use crate::queue::{EventQueue, KeyEvent};

/// Press timestamps kept per key.
const HISTORY: usize = 5;

/// Deltas compared when classifying, the first delta excluded.
const INTERIOR: u32 = 3;

/// Repeat samples kept across all keys.
const MEASUREMENTS: usize = 16;

/// Tolerated average deviation between repeat deltas, in milliseconds.
pub const THRESHOLD_MS: u32 = 10;

pub const DEFAULT_DELAY_MS: u32 = 500;
pub const DEFAULT_RATE_MS: u32 = 100;
pub const MAX_DELAY_MS: u32 = 500;
pub const MAX_RATE_MS: u32 = 500;

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyState {
    /// Released.
    #[default]
    Off,
    /// First press sent.
    Down,
    /// Release sent, still listening for the first repeat.
    Waiting,
    /// Auto-repeating.
    Repeating,
}

/// Inferred keyboard repeat timing, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatTiming {
    pub delay_ms: u32,
    pub rate_ms: u32,
}

impl Default for RepeatTiming {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
            rate_ms: DEFAULT_RATE_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct KeyInfo {
    times: [u32; HISTORY],
    next: usize,
    count: usize,
    state: KeyState,
    detected: bool,
}

impl KeyInfo {
    fn record(&mut self, now: u32) {
        self.times[self.next] = now;
        self.next = (self.next + 1) % HISTORY;
        if self.count < HISTORY {
            self.count += 1;
        }
    }

    fn last_press(&self) -> u32 {
        self.times[(self.next + HISTORY - 1) % HISTORY]
    }

    /// Delta between the `i`th and `i+1`th oldest recorded presses.
    fn delta(&self, i: usize) -> u32 {
        let n = self.next;
        self.times[(n + i + 1) % HISTORY].wrapping_sub(self.times[(n + i) % HISTORY])
    }

    /// `(delay, rate)` if the history looks like an auto-repeat.
    fn repeat_sample(&self) -> Option<RepeatTiming> {
        let interior = 1..HISTORY - 1;
        let mean = interior.clone().map(|i| self.delta(i)).sum::<u32>() / INTERIOR;
        let deviation: u32 = interior.map(|i| self.delta(i).abs_diff(mean)).sum();
        if deviation > THRESHOLD_MS * INTERIOR {
            return None;
        }
        Some(RepeatTiming {
            delay_ms: self.delta(0),
            rate_ms: mean,
        })
    }
}

// ─── Measurements ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct Measurements {
    delays: [u32; MEASUREMENTS],
    rates: [u32; MEASUREMENTS],
    next: usize,
    count: usize,
}

impl Measurements {
    /// Add a sample and return the new best estimate.
    fn add(&mut self, sample: RepeatTiming) -> RepeatTiming {
        self.delays[self.next] = sample.delay_ms;
        self.rates[self.next] = sample.rate_ms;
        self.next = (self.next + 1) % MEASUREMENTS;
        if self.count < MEASUREMENTS {
            self.count += 1;
        }

        RepeatTiming {
            delay_ms: closest_to_mean(&self.delays[..self.count]).min(MAX_DELAY_MS),
            rate_ms: closest_to_mean(&self.rates[..self.count]).min(MAX_RATE_MS),
        }
    }
}

/// The element nearest the integer mean. Earlier elements win ties.
fn closest_to_mean(samples: &[u32]) -> u32 {
    if samples.is_empty() {
        return 0;
    }
    let sum: u64 = samples.iter().map(|&s| u64::from(s)).sum();
    let mean = u32::try_from(sum / samples.len() as u64).unwrap_or(u32::MAX);

    let mut best = 0;
    let mut best_error = u32::MAX;
    for &s in samples {
        let error = s.abs_diff(mean);
        if error < best_error {
            best = s;
            best_error = error;
        }
    }
    best
}

// ─── RepeatEngine ────────────────────────────────────────────────────────────

/// Press history and state for every key code, plus the shared estimate.
#[derive(Debug, Clone)]
pub struct RepeatEngine {
    keys: [KeyInfo; 256],
    measurements: Measurements,
    timing: RepeatTiming,
}

impl RepeatEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: [KeyInfo::default(); 256],
            measurements: Measurements::default(),
            timing: RepeatTiming::default(),
        }
    }

    /// Current repeat delay and rate estimate.
    #[inline]
    #[must_use]
    pub const fn timing(&self) -> RepeatTiming {
        self.timing
    }

    #[inline]
    #[must_use]
    pub fn state(&self, code: KeyCode) -> KeyState {
        self.keys[usize::from(code)].state
    }

    /// Handle one press of `code` at `now`.
    ///
    /// A `duplicate` press is a second code sent for the same physical key
    /// (`Z` is both a letter and fire). It moves the key's state but does
    /// not take part in repeat classification, so one key is not measured
    /// twice.
    pub fn press(&mut self, code: KeyCode, duplicate: bool, now: u32, queue: &mut EventQueue) {
        self.keys[usize::from(code)].record(now);
        if !duplicate {
            self.classify(code);
        }

        let info = &mut self.keys[usize::from(code)];
        let (state, send) = match info.state {
            KeyState::Off => (KeyState::Down, true),
            KeyState::Waiting => (KeyState::Repeating, true),
            KeyState::Down | KeyState::Repeating => (KeyState::Repeating, false),
        };
        info.state = state;
        if send {
            queue.push(KeyEvent::press(code));
        }
    }

    fn classify(&mut self, code: KeyCode) {
        let info = &mut self.keys[usize::from(code)];
        if info.count != HISTORY {
            return;
        }
        let Some(sample) = info.repeat_sample() else {
            info.detected = false;
            return;
        };
        // One measurement per press cycle. Later repeats would overwrite the
        // delay with a rate-sized delta.
        if info.detected {
            return;
        }
        info.detected = true;
        self.timing = self.measurements.add(sample);
        tracing::debug!(
            key = code,
            sample_delay = sample.delay_ms,
            sample_rate = sample.rate_ms,
            delay = self.timing.delay_ms,
            rate = self.timing.rate_ms,
            "key repeat detected"
        );
    }

    /// Send releases for keys that have been silent longer than a repeat
    /// should take.
    pub fn simulate_releases(&mut self, now: u32, queue: &mut EventQueue) {
        let RepeatTiming { delay_ms, rate_ms } = self.timing;
        for (code, info) in (0..=u8::MAX).zip(self.keys.iter_mut()) {
            if info.state == KeyState::Off {
                continue;
            }
            let wait = if info.state == KeyState::Repeating { rate_ms } else { delay_ms };
            let expected = 2 * THRESHOLD_MS + wait;
            if now.wrapping_sub(info.last_press()) < expected {
                continue;
            }
            if info.state != KeyState::Waiting {
                queue.push(KeyEvent::release(code));
            }
            info.state = if info.state == KeyState::Down {
                KeyState::Waiting
            } else {
                KeyState::Off
            };
        }
    }
}

impl Default for RepeatEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
