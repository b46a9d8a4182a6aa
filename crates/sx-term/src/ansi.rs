// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit. The frame driver decides; this module
// only knows the byte-level encoding.
//
// The SGR color encoders sit on the hot path (one call per terminal cell),
// so they avoid `write!` formatting. Decimal channel values come from a
// table built at compile time.
use std::io::{self, Write};

// ─── Decimal Table ───────────────────────────────────────────────────────────

/// ASCII decimal spelling of every byte value, with its length.
static DECIMAL: [(u8, [u8; 3]); 256] = build_decimal();

#[allow(clippy::cast_possible_truncation)] // i < 256 and every digit < 10.
const fn build_decimal() -> [(u8, [u8; 3]); 256] {
    let mut table = [(0u8, [0u8; 3]); 256];
    let mut i = 0;
    while i < 256 {
        let v = i as u8;
        table[i] = if v >= 100 {
            (3, [b'0' + v / 100, b'0' + v / 10 % 10, b'0' + v % 10])
        } else if v >= 10 {
            (2, [b'0' + v / 10, b'0' + v % 10, 0])
        } else {
            (1, [b'0' + v, 0, 0])
        };
        i += 1;
    }
    table
}

/// The decimal digits of `v` (`b"0"` through `b"255"`).
#[inline]
#[must_use]
pub fn decimal(v: u8) -> &'static [u8] {
    let entry = &DECIMAL[v as usize];
    &entry.1[..entry.0 as usize]
}

// ─── Cursor & Screen ─────────────────────────────────────────────────────────

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

/// Clear the screen (ED 2) and home the cursor (CUP 1;1).
#[inline]
pub fn clear_and_home(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J\x1b[1;1H")
}

/// Reset attributes and move to the next line. Ends every rendered row.
#[inline]
pub fn reset_newline(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m\n")
}

/// Bold (SGR 1). Many terminals render the eight basic colors brighter in bold.
#[inline]
pub fn bold(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[1m")
}

// ─── Synchronized Output ─────────────────────────────────────────────────────

/// Begin synchronized output (DEC Private Mode 2026).
///
/// A newline follows the marker so a terminal that ignores the mode
/// still starts the frame on a fresh line.
#[inline]
pub fn begin_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026h\n")
}

/// End synchronized output. The terminal paints the buffered frame.
#[inline]
pub fn end_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026l")
}

// ─── Window Title ────────────────────────────────────────────────────────────

/// Set the window title (OSC 0).
///
/// The title is written verbatim. Control characters inside it are not
/// escaped and reach the terminal as-is.
pub fn set_title(w: &mut impl Write, title: &str) -> io::Result<()> {
    w.write_all(b"\x1b]0;")?;
    w.write_all(title.as_bytes())?;
    w.write_all(b"\x07")
}

// ─── Colors ──────────────────────────────────────────────────────────────────

/// 24-bit foreground + background: `ESC[38;2;R;G;Bm ESC[48;2;R;G;Bm`.
pub fn rgb_pair(w: &mut impl Write, fg: [u8; 3], bg: [u8; 3]) -> io::Result<()> {
    w.write_all(b"\x1b[38;2;")?;
    channels(w, fg)?;
    w.write_all(b"m\x1b[48;2;")?;
    channels(w, bg)?;
    w.write_all(b"m")
}

/// 24-bit foreground only: `ESC[38;2;R;G;Bm`.
pub fn rgb_fg(w: &mut impl Write, fg: [u8; 3]) -> io::Result<()> {
    w.write_all(b"\x1b[38;2;")?;
    channels(w, fg)?;
    w.write_all(b"m")
}

/// 24-bit background only: `ESC[48;2;R;G;Bm`.
pub fn rgb_bg(w: &mut impl Write, bg: [u8; 3]) -> io::Result<()> {
    w.write_all(b"\x1b[48;2;")?;
    channels(w, bg)?;
    w.write_all(b"m")
}

/// 256-color foreground + background: `ESC[38;5;Fm ESC[48;5;Bm`.
pub fn indexed_pair(w: &mut impl Write, fg: u8, bg: u8) -> io::Result<()> {
    w.write_all(b"\x1b[38;5;")?;
    w.write_all(decimal(fg))?;
    w.write_all(b"m\x1b[48;5;")?;
    w.write_all(decimal(bg))?;
    w.write_all(b"m")
}

/// 256-color foreground only: `ESC[38;5;Fm`.
pub fn indexed_fg(w: &mut impl Write, fg: u8) -> io::Result<()> {
    w.write_all(b"\x1b[38;5;")?;
    w.write_all(decimal(fg))?;
    w.write_all(b"m")
}

/// 256-color background only: `ESC[48;5;Bm`.
pub fn indexed_bg(w: &mut impl Write, bg: u8) -> io::Result<()> {
    w.write_all(b"\x1b[48;5;")?;
    w.write_all(decimal(bg))?;
    w.write_all(b"m")
}

/// 8/16-color pair in one sequence: `ESC[F;Bm`.
///
/// Both arguments are *foreground* SGR codes (30–37, 90–97); the
/// background code is derived by adding 10.
pub fn sgr_pair(w: &mut impl Write, fg: u8, bg: u8) -> io::Result<()> {
    w.write_all(b"\x1b[")?;
    w.write_all(decimal(fg))?;
    w.write_all(b";")?;
    w.write_all(decimal(bg + 10))?;
    w.write_all(b"m")
}

/// 8/16-color foreground only: `ESC[Fm`.
pub fn sgr_fg(w: &mut impl Write, fg: u8) -> io::Result<()> {
    w.write_all(b"\x1b[")?;
    w.write_all(decimal(fg))?;
    w.write_all(b"m")
}

/// 8/16-color background only: `ESC[Bm`, `bg` given as a foreground code.
pub fn sgr_bg(w: &mut impl Write, bg: u8) -> io::Result<()> {
    w.write_all(b"\x1b[")?;
    w.write_all(decimal(bg + 10))?;
    w.write_all(b"m")
}

#[inline]
fn channels(w: &mut impl Write, [r, g, b]: [u8; 3]) -> io::Result<()> {
    w.write_all(decimal(r))?;
    w.write_all(b";")?;
    w.write_all(decimal(g))?;
    w.write_all(b";")?;
    w.write_all(decimal(b))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Run an encoder against a Vec and return the output as a String.
    fn emit(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    // ── Decimal table ─────────────────────────────────────────────────

    #[test]
    fn decimal_matches_formatting_for_every_byte() {
        for v in 0..=255u8 {
            assert_eq!(decimal(v), v.to_string().as_bytes(), "value {v}");
        }
    }

    // ── Sequences ─────────────────────────────────────────────────────

    #[test]
    fn cursor_and_screen() {
        assert_eq!(emit(|w| cursor_hide(w)), "\x1b[?25l");
        assert_eq!(emit(|w| cursor_show(w)), "\x1b[?25h");
        assert_eq!(emit(|w| clear_and_home(w)), "\x1b[2J\x1b[1;1H");
        assert_eq!(emit(|w| reset_newline(w)), "\x1b[0m\n");
        assert_eq!(emit(|w| bold(w)), "\x1b[1m");
    }

    #[test]
    fn sync_markers() {
        assert_eq!(emit(|w| begin_sync(w)), "\x1b[?2026h\n");
        assert_eq!(emit(|w| end_sync(w)), "\x1b[?2026l");
    }

    #[test]
    fn title_is_osc_zero() {
        assert_eq!(emit(|w| set_title(w, "sextant")), "\x1b]0;sextant\x07");
    }

    // ── Colors ────────────────────────────────────────────────────────

    #[test]
    fn rgb_pair_encoding() {
        assert_eq!(
            emit(|w| rgb_pair(w, [255, 0, 7], [10, 200, 99])),
            "\x1b[38;2;255;0;7m\x1b[48;2;10;200;99m"
        );
    }

    #[test]
    fn rgb_bg_encoding() {
        assert_eq!(emit(|w| rgb_bg(w, [1, 22, 133])), "\x1b[48;2;1;22;133m");
        assert_eq!(emit(|w| rgb_fg(w, [0, 9, 10])), "\x1b[38;2;0;9;10m");
    }

    #[test]
    fn indexed_encoding() {
        assert_eq!(emit(|w| indexed_pair(w, 16, 255)), "\x1b[38;5;16m\x1b[48;5;255m");
        assert_eq!(emit(|w| indexed_bg(w, 232)), "\x1b[48;5;232m");
        assert_eq!(emit(|w| indexed_fg(w, 0)), "\x1b[38;5;0m");
    }

    #[test]
    fn sgr_encoding_offsets_background() {
        assert_eq!(emit(|w| sgr_pair(w, 31, 30)), "\x1b[31;40m");
        assert_eq!(emit(|w| sgr_pair(w, 97, 90)), "\x1b[97;100m");
        assert_eq!(emit(|w| sgr_bg(w, 37)), "\x1b[47m");
        assert_eq!(emit(|w| sgr_fg(w, 93)), "\x1b[93m");
    }
}
