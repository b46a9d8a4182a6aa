// SPDX-License-Identifier: MIT
//
// The input side of the host boundary: decoder, repeat engine, and event
// queue wired together.

use sx_term::{ByteSource, Clock};

use crate::decoder::Decoder;
use crate::keys::KeyCode;
use crate::queue::{EventQueue, KeyEvent};
use crate::repeat::{KeyState, RepeatEngine, RepeatTiming};

#[derive(Debug, Default)]
pub struct InputEngine {
    decoder: Decoder,
    repeat: RepeatEngine,
    queue: EventQueue,
}

impl InputEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode all ready input into presses, stamped with the clock's time
    /// at the moment each is decoded.
    pub fn poll(&mut self, source: &mut impl ByteSource, clock: &impl Clock) {
        let Self {
            decoder,
            repeat,
            queue,
        } = self;
        decoder.poll(source, |press| {
            repeat.press(press.code, press.duplicate, clock.now_ms(), queue);
        });
    }

    pub fn simulate_releases(&mut self, now: u32) {
        self.repeat.simulate_releases(now, &mut self.queue);
    }

    /// Poll input, infer releases, then take the oldest event.
    pub fn get_key(&mut self, source: &mut impl ByteSource, clock: &impl Clock) -> Option<KeyEvent> {
        self.poll(source, clock);
        self.simulate_releases(clock.now_ms());
        self.queue.pop()
    }

    #[inline]
    #[must_use]
    pub const fn timing(&self) -> RepeatTiming {
        self.repeat.timing()
    }

    #[inline]
    #[must_use]
    pub fn key_state(&self, code: KeyCode) -> KeyState {
        self.repeat.state(code)
    }

    /// Events waiting for the host.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use pretty_assertions::assert_eq;
    use sx_term::{ManualClock, MemorySource};

    #[test]
    fn arrow_press_then_release() {
        let mut input = InputEngine::new();
        let clock = ManualClock::starting_at(10_000);
        let mut src = MemorySource::from_bytes(b"\x1b[A");

        assert_eq!(input.get_key(&mut src, &clock), Some(KeyEvent::press(keys::UP_ARROW)));
        assert_eq!(input.get_key(&mut src, &clock), None);

        clock.advance(519);
        assert_eq!(input.get_key(&mut src, &clock), None);
        clock.advance(1);
        assert_eq!(input.get_key(&mut src, &clock), Some(KeyEvent::release(keys::UP_ARROW)));
        assert_eq!(input.key_state(keys::UP_ARROW), KeyState::Waiting);
    }

    #[test]
    fn one_event_per_call() {
        let mut input = InputEngine::new();
        let clock = ManualClock::default();
        let mut src = MemorySource::from_bytes(b"ab");

        input.poll(&mut src, &clock);
        assert_eq!(input.pending(), 2);
        assert_eq!(input.get_key(&mut src, &clock), Some(KeyEvent::press(b'A')));
        assert_eq!(input.get_key(&mut src, &clock), Some(KeyEvent::press(b'B')));
        assert_eq!(input.get_key(&mut src, &clock), None);
    }

    #[test]
    fn held_key_is_learned_and_released_on_time() {
        let mut input = InputEngine::new();
        let clock = ManualClock::default();
        let mut src = MemorySource::new();

        // A held key at 300 ms delay and 30 ms rate.
        let mut events = Vec::new();
        for gap in [0, 300, 30, 30, 30, 30, 30] {
            clock.advance(gap);
            src.push(b"d");
            events.extend(input.get_key(&mut src, &clock));
        }
        assert_eq!(input.timing(), RepeatTiming { delay_ms: 300, rate_ms: 30 });

        // Silence: released after the learned rate plus slack.
        clock.advance(2 * crate::repeat::THRESHOLD_MS + 30);
        events.extend(std::iter::from_fn(|| input.get_key(&mut src, &clock)));

        assert_eq!(events, vec![KeyEvent::press(b'D'), KeyEvent::release(b'D')]);
        assert_eq!(input.key_state(b'D'), KeyState::Off);
    }
}
