// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Non-blocking input bytes.
//
// The renderer is single-threaded, so input is polled rather than pushed:
// the decoder asks for one byte at a time and gets `None` the moment the
// terminal has nothing more to give. The only time the caller is willing
// to wait is right after a lone ESC, when the rest of an escape sequence
// may still be in flight. `settle` is that wait.
//
// `StdinSource` reads from fd 0, which `TtySession` has put into
// `O_NONBLOCK` mode. Reads go through a small local buffer so a burst of
// keystrokes costs one syscall, not one per byte.
//
// `MemorySource` replays scripted bytes. Bytes queued with `push_delayed`
// only become visible after the next `settle`, which models the tail of
// an escape sequence arriving a few milliseconds after its ESC.

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

/// A non-blocking source of input bytes.
pub trait ByteSource {
    /// The next available byte, or `None` if nothing is ready right now.
    fn next_byte(&mut self) -> Option<u8>;

    /// Give slow input a chance to arrive. Bounded by `wait`.
    fn settle(&mut self, wait: Duration);
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    #[inline]
    fn next_byte(&mut self) -> Option<u8> {
        (**self).next_byte()
    }

    #[inline]
    fn settle(&mut self, wait: Duration) {
        (**self).settle(wait);
    }
}

// ─── StdinSource ─────────────────────────────────────────────────────────────

/// Bytes read from the process's stdin.
///
/// Only non-blocking when stdin has `O_NONBLOCK` set (see
/// [`TtySession::enter`](crate::terminal::TtySession::enter)). On a
/// blocking stdin, `next_byte` waits for input like a plain `read`.
pub struct StdinSource {
    buf: [u8; 64],
    pos: usize,
    len: usize,
}

impl StdinSource {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: [0; 64],
            pos: 0,
            len: 0,
        }
    }

    /// Refill the local buffer. Returns `false` if nothing was read.
    #[cfg(unix)]
    fn fill(&mut self) -> bool {
        let n = unsafe {
            libc::read(
                libc::STDIN_FILENO,
                self.buf.as_mut_ptr().cast::<libc::c_void>(),
                self.buf.len(),
            )
        };
        // -1 covers EAGAIN (nothing ready) and real errors alike; 0 is EOF.
        if n <= 0 {
            return false;
        }
        #[allow(clippy::cast_sign_loss)] // n > 0 checked above.
        {
            self.len = n as usize;
        }
        self.pos = 0;
        true
    }

    #[cfg(not(unix))]
    fn fill(&mut self) -> bool {
        false
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteSource for StdinSource {
    fn next_byte(&mut self) -> Option<u8> {
        if self.pos == self.len && !self.fill() {
            return None;
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Some(b)
    }

    fn settle(&mut self, wait: Duration) {
        thread::sleep(wait);
    }
}

// ─── MemorySource ────────────────────────────────────────────────────────────

/// Scripted input for tests and replays.
#[derive(Debug, Default)]
pub struct MemorySource {
    ready: VecDeque<u8>,
    delayed: VecDeque<u8>,
    settled: Duration,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Source with `bytes` immediately available.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut src = Self::new();
        src.push(bytes);
        src
    }

    /// Make `bytes` available right away.
    pub fn push(&mut self, bytes: &[u8]) {
        self.ready.extend(bytes);
    }

    /// Queue `bytes` to become available on the next [`settle`](ByteSource::settle).
    pub fn push_delayed(&mut self, bytes: &[u8]) {
        self.delayed.extend(bytes);
    }

    /// Bytes not yet consumed, delayed ones included.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.ready.len() + self.delayed.len()
    }

    /// Total time callers have spent in `settle`.
    #[must_use]
    pub const fn settled(&self) -> Duration {
        self.settled
    }
}

impl ByteSource for MemorySource {
    fn next_byte(&mut self) -> Option<u8> {
        self.ready.pop_front()
    }

    fn settle(&mut self, wait: Duration) {
        self.settled += wait;
        self.ready.append(&mut self.delayed);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn drain(src: &mut impl ByteSource) -> Vec<u8> {
        std::iter::from_fn(|| src.next_byte()).collect()
    }

    #[test]
    fn memory_source_yields_in_order() {
        let mut src = MemorySource::from_bytes(b"abc");
        assert_eq!(drain(&mut src), b"abc");
        assert_eq!(src.next_byte(), None);
    }

    #[test]
    fn delayed_bytes_wait_for_settle() {
        let mut src = MemorySource::from_bytes(b"\x1b");
        src.push_delayed(b"[A");
        assert_eq!(src.remaining(), 3);
        assert_eq!(drain(&mut src), b"\x1b");

        src.settle(Duration::from_millis(5));
        assert_eq!(drain(&mut src), b"[A");
        assert_eq!(src.settled(), Duration::from_millis(5));
        assert_eq!(src.remaining(), 0);
    }

    #[test]
    fn source_through_mut_reference() {
        let mut src = MemorySource::from_bytes(b"q");
        let mut by_ref = &mut src;
        assert_eq!(drain(&mut by_ref), b"q");
        by_ref.settle(Duration::from_millis(1));
        assert_eq!(src.settled(), Duration::from_millis(1));
    }

    #[test]
    fn stdin_source_starts_empty() {
        let src = StdinSource::new();
        assert_eq!(src.pos, src.len);
    }
}
