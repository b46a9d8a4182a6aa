// SPDX-License-Identifier: MIT
//
// sx-term: terminal plumbing for sextant.
//
// The lowest layer of the renderer: a growable frame buffer that is written
// out in one blob per frame, byte-level ANSI encoders (with a precomputed
// decimal table for the per-cell color sequences), termios and file-status
// control for a non-blocking tty, and the two seams the upper layers are
// tested through: `ByteSource` for input bytes and `Clock` for time.
//
// No framework sits between this crate and the terminal. Escape sequences
// are written by hand and the tty is configured with raw libc calls.

pub mod ansi;
pub mod clock;
pub mod output;
pub mod reader;
pub mod terminal;

pub use clock::{Clock, ManualClock, SystemClock};
pub use output::OutputBuffer;
pub use reader::{ByteSource, MemorySource};
