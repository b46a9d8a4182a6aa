// SPDX-License-Identifier: MIT
//
// Frame output buffering.
//
// Every byte of a frame (escape sequences, glyphs, the statistics footer)
// goes into an `OutputBuffer` first. At the end of the frame the whole blob
// is written to the terminal in as few `write()` calls as the kernel allows,
// so the terminal never sees half a frame.
//
// Growth is explicit: the logical capacity doubles until the pending append
// fits. Running out of memory while growing the render buffer has no
// recovery path, so it aborts the process.
//
// Flushing tolerates a non-blocking stdout. `WouldBlock`, `Interrupted`, and
// zero-length writes are transient backpressure: sleep a microsecond and try
// again, forever. Anything else is a real I/O error and is returned.

use std::fmt;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

/// Initial capacity: one mebibyte, enough for a large 24-bit sextant frame.
pub const DEFAULT_CAPACITY: usize = 1024 * 1024;

/// Upper bound on the bytes produced by one [`OutputBuffer::append_fmt`] call.
pub const FORMAT_LIMIT: usize = 256;

/// Pause between retries when the output stream would block.
const STALL_RETRY: Duration = Duration::from_micros(1);

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// Append-only byte sink for one frame.
///
/// Invariant: `capacity() >= len()`. The capacity only changes by doubling.
pub struct OutputBuffer {
    buf: Vec<u8>,
    capacity: usize,
}

impl OutputBuffer {
    /// Create an empty buffer with [`DEFAULT_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty buffer with the given starting capacity (at least 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Current logical capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// The accumulated bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Drop the contents, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Append raw bytes, growing if needed.
    #[inline]
    pub fn append(&mut self, bytes: &[u8]) {
        self.reserve_for(bytes.len());
        self.buf.extend_from_slice(bytes);
    }

    /// Append a string's UTF-8 bytes.
    #[inline]
    pub fn append_str(&mut self, s: &str) {
        self.append(s.as_bytes());
    }

    /// Append formatted text, truncated to [`FORMAT_LIMIT`] bytes.
    ///
    /// Returns the number of bytes appended, which callers feed to
    /// [`append_padding`](Self::append_padding) to build fixed-width columns.
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) -> usize {
        let mut local = Bounded {
            bytes: [0; FORMAT_LIMIT],
            len: 0,
        };
        // `Bounded` never reports an error, it truncates instead.
        let _ = fmt::Write::write_fmt(&mut local, args);
        let len = local.len;
        self.append(&local.bytes[..len]);
        len
    }

    /// Append spaces until `actual` reaches `desired`. No-op if already wide enough.
    pub fn append_padding(&mut self, actual: usize, desired: usize) {
        if actual >= desired {
            return;
        }
        let pad = desired - actual;
        self.reserve_for(pad);
        self.buf.resize(self.buf.len() + pad, b' ');
    }

    /// Write everything to `w`, then reset the length to zero.
    ///
    /// Retries transient stalls indefinitely.
    ///
    /// # Errors
    ///
    /// Returns any non-transient error from `w`. The buffer keeps its
    /// contents in that case.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        let mut pending = &self.buf[..];
        while !pending.is_empty() {
            match w.write(pending) {
                Ok(0) => thread::sleep(STALL_RETRY),
                Ok(n) => pending = &pending[n..],
                Err(e) if is_transient(&e) => thread::sleep(STALL_RETRY),
                Err(e) => return Err(e),
            }
        }
        loop {
            match w.flush() {
                Ok(()) => break,
                Err(e) if is_transient(&e) => thread::sleep(STALL_RETRY),
                Err(e) => return Err(e),
            }
        }
        self.buf.clear();
        Ok(())
    }

    /// Make room for `additional` more bytes by doubling the capacity.
    fn reserve_for(&mut self, additional: usize) {
        let total = self.buf.len() + additional;
        if total <= self.capacity {
            return;
        }

        let mut capacity = self.capacity;
        while total > capacity {
            capacity = capacity.checked_mul(2).unwrap_or_else(|| out_of_memory(total));
        }
        if self.buf.try_reserve_exact(capacity - self.buf.len()).is_err() {
            out_of_memory(capacity);
        }
        self.capacity = capacity;
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Real flushing happens in flush_to().
        Ok(())
    }
}

/// Whether an I/O error is backpressure rather than failure.
fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

fn out_of_memory(requested: usize) -> ! {
    tracing::error!(requested, "out of memory growing output buffer");
    std::process::abort();
}

/// Fixed stack buffer that silently truncates at [`FORMAT_LIMIT`].
struct Bounded {
    bytes: [u8; FORMAT_LIMIT],
    len: usize,
}

impl fmt::Write for Bounded {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = FORMAT_LIMIT - self.len;
        let take = s.len().min(room);
        self.bytes[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
