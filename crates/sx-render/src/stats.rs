// SPDX-License-Identifier: MIT
//
// Frame statistics footer.
//
// A ring of the last 20 frames' timestamps and sizes. Once the ring is full,
// each frame gets a line of averages under the picture: frame size, frame
// rate, and data rate, each left-aligned in a 25-column field. A second line
// shows the current key repeat estimates, so a user can see what the input
// engine has inferred about their keyboard.

use sx_term::OutputBuffer;

/// Frames averaged over.
pub const WINDOW: usize = 20;

/// Width of each footer field.
const FIELD_WIDTH: usize = 25;

/// Key repeat estimates shown in the footer, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTiming {
    pub delay_ms: u32,
    pub rate_ms: u32,
}

/// Averages over the last [`WINDOW`] frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub frame_bytes: u64,
    pub fps: u64,
    pub kilobytes_per_sec: u64,
}

#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    times: [u32; WINDOW],
    sizes: [usize; WINDOW],
    next: usize,
    count: usize,
}

impl FrameStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame of `size` bytes finished at `now`.
    ///
    /// Returns averages once a full window has been recorded before this one.
    pub fn record(&mut self, now: u32, size: usize) -> Option<Summary> {
        self.times[self.next] = now;
        self.sizes[self.next] = size;
        self.next = (self.next + 1) % WINDOW;

        if self.count < WINDOW {
            self.count += 1;
            return None;
        }

        let frame_bytes = self.sizes.iter().map(|&s| s as u64).sum::<u64>() / WINDOW as u64;
        let elapsed = u64::from(now.wrapping_sub(self.times[self.next]));
        let fps = if elapsed == 0 {
            0
        } else {
            1000 * WINDOW as u64 / elapsed
        };
        Some(Summary {
            frame_bytes,
            fps,
            kilobytes_per_sec: fps * frame_bytes / 1000,
        })
    }
}

/// Append the footer: the summary line (if any), then the key timing line.
pub fn write_footer(out: &mut OutputBuffer, summary: Option<Summary>, keys: KeyTiming) {
    if let Some(s) = summary {
        let n = out.append_fmt(format_args!("frame size: {} B", s.frame_bytes));
        out.append_padding(n, FIELD_WIDTH);
        let n = out.append_fmt(format_args!("frame rate: {} FPS", s.fps));
        out.append_padding(n, FIELD_WIDTH);
        let n = out.append_fmt(format_args!("data rate: {} kB/s", s.kilobytes_per_sec));
        out.append_padding(n, FIELD_WIDTH);
    }
    out.append(b"\n");
    out.append_fmt(format_args!(
        "key repeat delay: {} ms    key repeat rate: {} ms\n",
        keys.delay_ms, keys.rate_ms
    ));
}

// ─── Tests ───────────────────────────────────────────────────────────────────
