// SPDX-License-Identifier: MIT
//
// Input byte decoder.
//
// Reads whatever stdin has right now and turns it into key presses. Only
// three shapes of input matter:
//
// - Plain bytes, uppercased, pressed as their ASCII code. A few of them
//   also press a game key first (`Z` fires, space uses, and so on) so they
//   still work for typing savegame names.
// - `ESC [ params final`, the CSI form of the arrow keys. Parameters are
//   skipped; only `A`–`D` produce a key.
// - A lone ESC, which is the escape key.
//
// A CSI sequence can be cut anywhere by the non-blocking read. If the
// bytes run out after `ESC [`, the decoder remembers that it is inside a
// sequence and resumes on the next poll. If they run out right after ESC,
// it waits once, briefly, for the `[` before deciding the ESC was a key.

use std::time::Duration;

use sx_term::ByteSource;

use crate::keys::{self, KeyCode};

/// How long a lone ESC waits for the rest of a sequence.
pub const ESCAPE_WAIT: Duration = Duration::from_millis(5);

const ESC: u8 = 0x1b;

/// One decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Press {
    pub code: KeyCode,
    /// A second code for a key that already sends its ASCII code.
    pub duplicate: bool,
}

impl Press {
    const fn primary(code: KeyCode) -> Self {
        Self {
            code,
            duplicate: false,
        }
    }

    const fn duplicate(code: KeyCode) -> Self {
        Self {
            code,
            duplicate: true,
        }
    }
}

/// Escape-sequence state carried between polls.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    csi_pending: bool,
}

impl Decoder {
    #[must_use]
    pub const fn new() -> Self {
        Self { csi_pending: false }
    }

    /// Whether the last poll ended inside a CSI sequence.
    #[inline]
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.csi_pending
    }

    /// Decode every byte `source` has ready, handing each press to `press`.
    pub fn poll(&mut self, source: &mut impl ByteSource, mut press: impl FnMut(Press)) {
        let mut next = source.next_byte();
        while let Some(byte) = next {
            if self.csi_pending {
                let mut cur = Some(byte);
                while matches!(cur, Some(b'0'..=b'9')) {
                    cur = source.next_byte();
                }
                let Some(terminator) = cur else {
                    return;
                };
                self.csi_pending = false;
                if let Some(code) = arrow(terminator) {
                    press(Press::primary(code));
                }
                next = source.next_byte();
                continue;
            }

            if byte != ESC {
                dispatch(byte, &mut press);
                next = source.next_byte();
                continue;
            }

            let mut second = source.next_byte();
            if second.is_none() {
                source.settle(ESCAPE_WAIT);
                second = source.next_byte();
            }
            if second == Some(b'[') {
                self.csi_pending = true;
                next = source.next_byte();
            } else {
                dispatch(ESC, &mut press);
                next = second;
            }
        }
    }
}

const fn arrow(terminator: u8) -> Option<KeyCode> {
    match terminator {
        b'A' => Some(keys::UP_ARROW),
        b'B' => Some(keys::DOWN_ARROW),
        b'C' => Some(keys::RIGHT_ARROW),
        b'D' => Some(keys::LEFT_ARROW),
        _ => None,
    }
}

/// Press a plain byte, and its game key first if it has one.
fn dispatch(byte: u8, press: &mut impl FnMut(Press)) {
    let c = byte.to_ascii_uppercase();
    let game_key = match c {
        b'\n' => Some(keys::ENTER),
        b'Z' => Some(keys::FIRE),
        b' ' => Some(keys::USE),
        b'X' => Some(keys::LALT),
        b'-' => Some(keys::MINUS),
        b'+' | b'=' => Some(keys::EQUALS),
        _ => None,
    };
    // `-` and `=` are their own game key; pressing them twice would make
    // one keystroke look like two.
    if let Some(code) = game_key.filter(|&code| code != c) {
        press(Press::duplicate(code));
    }
    if c.is_ascii() {
        press(Press::primary(c));
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
