// SPDX-License-Identifier: MIT
//
// Bounded key event queue.
//
// Producers are the decoder (presses) and the release simulator; the
// consumer is the host, which takes one event per `get_key`. When the host
// falls behind by a full queue, the oldest unread event is dropped.

use std::collections::VecDeque;

use crate::keys::{self, KeyCode};

/// Events held before the oldest is dropped.
pub const CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEventKind {
    Press,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    #[inline]
    #[must_use]
    pub const fn press(code: KeyCode) -> Self {
        Self {
            code,
            kind: KeyEventKind::Press,
        }
    }

    #[inline]
    #[must_use]
    pub const fn release(code: KeyCode) -> Self {
        Self {
            code,
            kind: KeyEventKind::Release,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_press(self) -> bool {
        matches!(self.kind, KeyEventKind::Press)
    }
}

#[derive(Debug)]
pub struct EventQueue {
    events: VecDeque<KeyEvent>,
    dropped: u64,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: VecDeque::with_capacity(CAPACITY),
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: KeyEvent) {
        if self.events.len() == CAPACITY {
            if let Some(lost) = self.events.pop_front() {
                self.dropped += 1;
                tracing::warn!(
                    key = %keys::describe(lost.code),
                    kind = ?lost.kind,
                    dropped = self.dropped,
                    "key event queue full, dropping oldest event"
                );
            }
        }
        tracing::trace!(key = %keys::describe(event.code), kind = ?event.kind, "queued");
        self.events.push_back(event);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<KeyEvent> {
        self.events.pop_front()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events lost to overflow since creation.
    #[inline]
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fifo_order() {
        let mut q = EventQueue::new();
        q.push(KeyEvent::press(b'A'));
        q.push(KeyEvent::release(b'A'));
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(KeyEvent::press(b'A')));
        assert_eq!(q.pop(), Some(KeyEvent::release(b'A')));
        assert_eq!(q.pop(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut q = EventQueue::new();
        for code in 0..=64u8 {
            q.push(KeyEvent::press(code));
        }
        assert_eq!(q.len(), CAPACITY);
        assert_eq!(q.dropped(), 1);
        assert_eq!(q.pop(), Some(KeyEvent::press(1)));

        let last = std::iter::from_fn(|| q.pop()).last();
        assert_eq!(last, Some(KeyEvent::press(64)));
    }
}
