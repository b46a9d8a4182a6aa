// SPDX-License-Identifier: MIT
//
// Color quantization to the terminal's palette.
//
// Colors arrive as signed channel values because dithering pushes them
// outside 0–255; every path clamps first. From there:
//
//   - 24-bit passes the clamped triple through.
//   - 3-bit and 4-bit search a small fixed palette for the smallest
//     weighted squared distance, first entry winning ties.
//   - 8-bit compares the nearest 6×6×6 cube level against the nearest
//     gray ramp step and takes the cube only if it is strictly closer.
//     Both guesses are cheap integer approximations; they are kept as-is
//     because the dithering noise is tuned against them.
//
// Results are foreground codes. Background SGR codes are the same value
// plus 10, which the ANSI encoders add.

use std::io::{self, Write};

use sx_term::ansi;

use crate::mode::ColorDepth;

/// An sRGB triple, red first.
pub type Rgb = [u8; 3];

// ─── Weights ─────────────────────────────────────────────────────────────────

/// Luma weights as fractions of 255 (ITU BT.709): red, green, blue.
const LUMA_WEIGHTS: [u32; 3] = [54, 183, 18];

/// Channel weights for color distance, as fractions of 16.
const DIFF_WEIGHTS: [i32; 3] = [5, 7, 4];

/// Brightness of a pixel, 0 through 65 025.
#[inline]
#[must_use]
pub const fn luma([r, g, b]: Rgb) -> u32 {
    b as u32 * LUMA_WEIGHTS[2] + g as u32 * LUMA_WEIGHTS[1] + r as u32 * LUMA_WEIGHTS[0]
}

/// Weighted squared distance between two colors.
#[inline]
const fn distance(r: i32, g: i32, b: i32, target: Rgb) -> i32 {
    let dr = (r - target[0] as i32) * DIFF_WEIGHTS[0];
    let dg = (g - target[1] as i32) * DIFF_WEIGHTS[1];
    let db = (b - target[2] as i32) * DIFF_WEIGHTS[2];
    dr * dr + dg * dg + db * db
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Clamped to 0..=255.
const fn clamp_channel(v: i32) -> u8 {
    if v < 0 {
        0
    } else if v > 255 {
        255
    } else {
        v as u8
    }
}

/// Clamp a signed triple into range.
#[inline]
#[must_use]
pub const fn clamp_rgb(r: i32, g: i32, b: i32) -> Rgb {
    [clamp_channel(r), clamp_channel(g), clamp_channel(b)]
}

// ─── Palettes ────────────────────────────────────────────────────────────────

/// One palette slot: the foreground SGR code and the color it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub code: u8,
    pub rgb: Rgb,
}

const fn entry(code: u8, r: u8, g: u8, b: u8) -> PaletteEntry {
    PaletteEntry { code, rgb: [r, g, b] }
}

/// The eight basic colors, stretched for contrast. Sent together with bold,
/// which most terminals render brighter.
pub const ANSI8: [PaletteEntry; 8] = [
    entry(30, 0, 0, 0),
    entry(31, 255, 0, 0),
    entry(32, 0, 255, 0),
    entry(33, 255, 128, 0),
    entry(34, 0, 0, 255),
    entry(35, 255, 0, 255),
    entry(36, 0, 255, 255),
    entry(37, 255, 255, 255),
];

/// The sixteen VGA colors.
pub const ANSI16: [PaletteEntry; 16] = [
    entry(30, 0, 0, 0),
    entry(31, 170, 0, 0),
    entry(32, 0, 170, 0),
    entry(33, 170, 85, 0), // dark orange, not dark yellow
    entry(34, 0, 0, 170),
    entry(35, 170, 0, 170),
    entry(36, 0, 170, 170),
    entry(37, 170, 170, 170),
    entry(90, 85, 85, 85),
    entry(91, 255, 85, 85),
    entry(92, 85, 255, 85),
    entry(93, 255, 255, 85),
    entry(94, 85, 85, 255),
    entry(95, 255, 85, 255),
    entry(96, 85, 255, 255),
    entry(97, 255, 255, 255),
];

/// Code of the palette entry nearest to `(r, g, b)`. Ties go to the earlier entry.
#[must_use]
pub fn nearest(palette: &[PaletteEntry], r: i32, g: i32, b: i32) -> u8 {
    let mut best_code = 0;
    let mut best_error = i32::MAX;
    for e in palette {
        let error = distance(r, g, b, e.rgb);
        if error < best_error {
            best_error = error;
            best_code = e.code;
        }
    }
    best_code
}

/// xterm 256-color index for a color: cube 16–231 or gray ramp 232–255.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_possible_wrap)] // All values ≤ 65 025.
pub const fn ansi256(rgb: Rgb) -> u8 {
    let gray = ((luma(rgb) * 24) >> 16) as i32;
    let gray256 = gray * 256 / 24;
    let (r, g, b) = (rgb[0] as i32, rgb[1] as i32, rgb[2] as i32);

    let (r6, g6, b6) = (r / 43, g / 43, b / 43);
    let cube_error = distance(r - r6 * 43, g - g6 * 43, b - b6 * 43, [0, 0, 0]);
    let gray_error = distance(r - gray256, g - gray256, b - gray256, [0, 0, 0]);

    if cube_error < gray_error {
        (16 + r6 * 36 + g6 * 6 + b6) as u8
    } else {
        (232 + gray) as u8
    }
}

// ─── Quantize ────────────────────────────────────────────────────────────────

/// A color as the terminal will receive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantized {
    /// 24-bit passthrough.
    Rgb(Rgb),
    /// xterm 256-color index.
    Indexed(u8),
    /// Foreground SGR code (30–37, 90–97).
    Sgr(u8),
}

/// Map a possibly out-of-range color to the nearest representable one.
#[must_use]
pub fn quantize(depth: ColorDepth, r: i32, g: i32, b: i32) -> Quantized {
    let rgb = clamp_rgb(r, g, b);
    let [r, g, b] = rgb.map(i32::from);
    match depth {
        ColorDepth::TrueColor => Quantized::Rgb(rgb),
        ColorDepth::Ansi256 => Quantized::Indexed(ansi256(rgb)),
        ColorDepth::Ansi16 => Quantized::Sgr(nearest(&ANSI16, r, g, b)),
        ColorDepth::Ansi8 => Quantized::Sgr(nearest(&ANSI8, r, g, b)),
    }
}

impl Quantized {
    /// Write as a foreground color.
    pub fn write_fg(self, w: &mut impl Write) -> io::Result<()> {
        match self {
            Self::Rgb(c) => ansi::rgb_fg(w, c),
            Self::Indexed(i) => ansi::indexed_fg(w, i),
            Self::Sgr(code) => ansi::sgr_fg(w, code),
        }
    }

    /// Write as a background color.
    pub fn write_bg(self, w: &mut impl Write) -> io::Result<()> {
        match self {
            Self::Rgb(c) => ansi::rgb_bg(w, c),
            Self::Indexed(i) => ansi::indexed_bg(w, i),
            Self::Sgr(code) => ansi::sgr_bg(w, code),
        }
    }

    /// Write `fg` and `bg` together, in one SGR sequence where the encoding allows.
    pub fn write_pair(fg: Self, bg: Self, w: &mut impl Write) -> io::Result<()> {
        match (fg, bg) {
            (Self::Rgb(f), Self::Rgb(b)) => ansi::rgb_pair(w, f, b),
            (Self::Indexed(f), Self::Indexed(b)) => ansi::indexed_pair(w, f, b),
            (Self::Sgr(f), Self::Sgr(b)) => ansi::sgr_pair(w, f, b),
            _ => {
                fg.write_fg(w)?;
                bg.write_bg(w)
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
