// SPDX-License-Identifier: MIT
//
// Block glyph synthesis.
//
// A terminal cell can show two colors: the glyph's foreground and the
// cell's background. Block glyphs split the cell into sub-pixels (2×2
// quadrants, 2×3 sextants) and light some of them, so one cell can show a
// two-color approximation of several source pixels.
//
// Choosing the split: sub-pixels brighter than the block's average luma are
// lit (foreground), the rest are unlit (background). Each side's color is
// the integer mean of its pixels. A uniform block lights nothing and is
// drawn as a plain background space.
//
// Mask bits run row-major, left to right then top to bottom:
//
//     quadrant    sextant
//      1  2        1  2
//      4  8        4  8
//                 16 32
//
// The tables below are indexed by that mask. Unicode orders the sextant
// block by a different scheme and unifies four sextants with older block
// characters (empty, left half, right half, full), so the table is spelled
// out rather than computed.

use std::io::{self, Write};

use crate::color::{Quantized, Rgb, luma, quantize};
use crate::mode::ColorDepth;
use crate::noise::Noise;

// ─── Tables ──────────────────────────────────────────────────────────────────

/// U+2580 UPPER HALF BLOCK, used by the half strategy.
pub const UPPER_HALF: &str = "\u{2580}";

/// Quadrant glyph for each 4-bit mask.
pub static QUADRANTS: [&str; 16] = [
    " ", "\u{2598}", "\u{259D}", "\u{2580}",
    "\u{2596}", "\u{258C}", "\u{259E}", "\u{259B}",
    "\u{2597}", "\u{259A}", "\u{2590}", "\u{259C}",
    "\u{2584}", "\u{2599}", "\u{259F}", "\u{2588}",
];

/// Sextant glyph for each 6-bit mask.
pub static SEXTANTS: [&str; 64] = [
    " ", "\u{1FB00}", "\u{1FB01}", "\u{1FB02}",
    "\u{1FB03}", "\u{1FB04}", "\u{1FB05}", "\u{1FB06}",
    "\u{1FB07}", "\u{1FB08}", "\u{1FB09}", "\u{1FB0A}",
    "\u{1FB0B}", "\u{1FB0C}", "\u{1FB0D}", "\u{1FB0E}",
    "\u{1FB0F}", "\u{1FB10}", "\u{1FB11}", "\u{1FB12}",
    "\u{1FB13}", "\u{258C}", "\u{1FB14}", "\u{1FB15}",
    "\u{1FB16}", "\u{1FB17}", "\u{1FB18}", "\u{1FB19}",
    "\u{1FB1A}", "\u{1FB1B}", "\u{1FB1C}", "\u{1FB1D}",
    "\u{1FB1E}", "\u{1FB1F}", "\u{1FB20}", "\u{1FB21}",
    "\u{1FB22}", "\u{1FB23}", "\u{1FB24}", "\u{1FB25}",
    "\u{1FB26}", "\u{1FB27}", "\u{2590}", "\u{1FB28}",
    "\u{1FB29}", "\u{1FB2A}", "\u{1FB2B}", "\u{1FB2C}",
    "\u{1FB2D}", "\u{1FB2E}", "\u{1FB2F}", "\u{1FB30}",
    "\u{1FB31}", "\u{1FB32}", "\u{1FB33}", "\u{1FB34}",
    "\u{1FB35}", "\u{1FB36}", "\u{1FB37}", "\u{1FB38}",
    "\u{1FB39}", "\u{1FB3A}", "\u{1FB3B}", "\u{2588}",
];

/// Monochrome threshold on the 0–255 luma scale. Lit means strictly above.
const MONO_THRESHOLD: i32 = 127;

// ─── Split ───────────────────────────────────────────────────────────────────

/// A block reduced to one cell: which sub-pixels are lit, and the two colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub mask: u8,
    /// Mean of the lit pixels. Black when nothing is lit.
    pub fg: Rgb,
    /// Mean of the unlit pixels.
    pub bg: Rgb,
}

/// Split a 2×2 block `[tl, tr, bl, br]`.
#[must_use]
pub fn quadrant(px: &[Rgb; 4]) -> Split {
    let lumas = px.map(luma);
    let average = lumas.iter().sum::<u32>() >> 2;
    split(px, &lumas, average)
}

/// Split a 2×3 block `[tl, tr, ml, mr, bl, br]`.
#[must_use]
pub fn sextant(px: &[Rgb; 6]) -> Split {
    let lumas = px.map(luma);
    let average = lumas.iter().sum::<u32>() / 6;
    split(px, &lumas, average)
}

fn split(px: &[Rgb], lumas: &[u32], average: u32) -> Split {
    let mut mask = 0u8;
    let mut sums = [[0u32; 3]; 2];
    let mut counts = [0u32; 2];

    for (bit, (p, &l)) in px.iter().zip(lumas).enumerate() {
        let lit = l > average;
        if lit {
            mask |= 1 << bit;
        }
        let side = usize::from(!lit);
        for (sum, &c) in sums[side].iter_mut().zip(p) {
            *sum += u32::from(c);
        }
        counts[side] += 1;
    }

    Split {
        mask,
        fg: mean(sums[0], counts[0]),
        bg: mean(sums[1], counts[1]),
    }
}

#[allow(clippy::cast_possible_truncation)] // A mean of u8 values fits in u8.
fn mean(sum: [u32; 3], count: u32) -> Rgb {
    if count == 0 {
        return [0; 3];
    }
    sum.map(|s| (s / count) as u8)
}

/// Sextant mask for the monochrome modes.
///
/// Each sub-pixel's luma (scaled to 0–255) is offset by its own entry in
/// `offsets`, clamped, and lit if above the threshold. `light` inverts the
/// result so lit sub-pixels are the dark ones.
#[must_use]
#[allow(clippy::cast_possible_wrap)] // luma >> 8 ≤ 254.
pub fn sextant_mono(px: &[Rgb; 6], offsets: &[i32; 6], light: bool) -> u8 {
    let mut mask = 0u8;
    for (bit, (&p, &offset)) in px.iter().zip(offsets).enumerate() {
        let l = ((luma(p) >> 8) as i32 + offset).clamp(0, 255);
        if l > MONO_THRESHOLD {
            mask |= 1 << bit;
        }
    }
    if light { !mask & 0x3f } else { mask }
}

// ─── Emission ────────────────────────────────────────────────────────────────

/// Write the color codes for one cell.
///
/// Both colors get the dither offset of the cell's top-left pixel `(x, y)`
/// before quantizing. With no `fg`, only the background is set.
pub fn emit(
    out: &mut impl Write,
    noise: &Noise,
    depth: ColorDepth,
    (x, y): (usize, usize),
    fg: Option<Rgb>,
    bg: Rgb,
) -> io::Result<()> {
    let offset = noise.offset(x, y);
    let dither = |c: Rgb| {
        quantize(
            depth,
            i32::from(c[0]) + offset[0],
            i32::from(c[1]) + offset[1],
            i32::from(c[2]) + offset[2],
        )
    };
    let bg = dither(bg);
    match fg {
        Some(fg) => Quantized::write_pair(dither(fg), bg, out),
        None => bg.write_bg(out),
    }
}

/// Write one split cell: colors and glyph, or background and a space when
/// nothing is lit.
pub fn emit_split(
    out: &mut impl Write,
    noise: &Noise,
    depth: ColorDepth,
    at: (usize, usize),
    split: Split,
    table: &[&str],
) -> io::Result<()> {
    if split.mask == 0 {
        emit(out, noise, depth, at, None, split.bg)?;
        return out.write_all(b" ");
    }
    emit(out, noise, depth, at, Some(split.fg), split.bg)?;
    out.write_all(table[usize::from(split.mask)].as_bytes())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use unicode_width::UnicodeWidthStr;

    fn gray(v: u8) -> Rgb {
        [v, v, v]
    }

    fn emitted(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    // ── Tables ────────────────────────────────────────────────────────

    #[test]
    fn glyphs_are_single_column() {
        for g in QUADRANTS.iter().chain(&SEXTANTS).chain([&UPPER_HALF]) {
            assert_eq!(g.chars().count(), 1, "{g:?}");
            assert_eq!(g.width(), 1, "{g:?}");
        }
    }

    #[test]
    fn glyphs_are_distinct() {
        let mut all: Vec<&str> = SEXTANTS.to_vec();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 64);

        let mut all: Vec<&str> = QUADRANTS.to_vec();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 16);
    }

    #[test]
    fn unified_sextants() {
        assert_eq!(SEXTANTS[0], " ");
        assert_eq!(SEXTANTS[1 | 4 | 16], "▌");
        assert_eq!(SEXTANTS[2 | 8 | 32], "▐");
        assert_eq!(SEXTANTS[63], "█");
        assert_eq!(SEXTANTS[1], "\u{1FB00}");
        assert_eq!(SEXTANTS[62], "\u{1FB3B}");
    }

    #[test]
    fn quadrant_table_layout() {
        assert_eq!(QUADRANTS[1], "▘");
        assert_eq!(QUADRANTS[3], "▀");
        assert_eq!(QUADRANTS[5], "▌");
        assert_eq!(QUADRANTS[12], "▄");
        assert_eq!(QUADRANTS[15], "█");
    }

    // ── Quadrant ──────────────────────────────────────────────────────

    #[test]
    fn quadrant_top_bright() {
        let px = [[210, 200, 190], [190, 200, 210], [40, 50, 60], [60, 50, 40]];
        let s = quadrant(&px);
        assert_eq!(s.mask, 0b0011);
        assert_eq!(s.fg, gray(200));
        assert_eq!(s.bg, gray(50));
        assert_eq!(QUADRANTS[usize::from(s.mask)], UPPER_HALF);
    }

    #[test]
    fn quadrant_uniform_is_empty() {
        let s = quadrant(&[[9, 80, 200]; 4]);
        assert_eq!(s.mask, 0);
        assert_eq!(s.bg, [9, 80, 200]);
        assert_eq!(s.fg, [0, 0, 0]);
    }

    #[test]
    fn quadrant_single_bright_pixel() {
        let s = quadrant(&[gray(0), gray(0), gray(0), gray(255)]);
        assert_eq!(s.mask, 0b1000);
        assert_eq!(s.fg, gray(255));
        assert_eq!(s.bg, gray(0));
    }

    #[test]
    fn quadrant_means_round_down() {
        let s = quadrant(&[gray(0), gray(1), gray(2), gray(200)]);
        assert_eq!(s.mask, 0b1000);
        assert_eq!(s.bg, gray(1));
    }

    // ── Sextant ───────────────────────────────────────────────────────

    #[test]
    fn sextant_uniform_is_empty() {
        let s = sextant(&[gray(77); 6]);
        assert_eq!(s.mask, 0);
        assert_eq!(s.bg, gray(77));
    }

    #[test]
    fn sextant_left_column() {
        let s = sextant(&[gray(250), gray(10), gray(250), gray(10), gray(250), gray(10)]);
        assert_eq!(s.mask, 1 | 4 | 16);
        assert_eq!(s.fg, gray(250));
        assert_eq!(s.bg, gray(10));
        assert_eq!(SEXTANTS[usize::from(s.mask)], "▌");
    }

    #[test]
    fn sextant_bottom_row() {
        let s = sextant(&[gray(0), gray(0), gray(0), gray(0), gray(90), gray(100)]);
        assert_eq!(s.mask, 16 | 32);
        assert_eq!(s.fg, gray(95));
    }

    // ── Monochrome ────────────────────────────────────────────────────

    #[test]
    fn mono_threshold_is_strict() {
        // luma([128; 3]) >> 8 == 127, not lit; 129 gives 128, lit.
        let px = [gray(128), gray(129), gray(0), gray(255), gray(0), gray(0)];
        assert_eq!(sextant_mono(&px, &[0; 6], false), 0b00_1010);
    }

    #[test]
    fn mono_light_inverts() {
        let px = [gray(128), gray(129), gray(0), gray(255), gray(0), gray(0)];
        assert_eq!(sextant_mono(&px, &[0; 6], true), 0b11_0101);
    }

    #[test]
    fn mono_offsets_push_across_threshold() {
        let px = [gray(128); 6];
        let offsets = [1, -1, 200, -200, 0, 0];
        assert_eq!(sextant_mono(&px, &offsets, false), 0b00_0101);
    }

    // ── Emission ──────────────────────────────────────────────────────

    #[test]
    fn emit_truecolor_pair() {
        let noise = Noise::off();
        let s = emitted(|w| emit(w, &noise, ColorDepth::TrueColor, (0, 0), Some(gray(200)), gray(50)));
        assert_eq!(s, "\x1b[38;2;200;200;200m\x1b[48;2;50;50;50m");
    }

    #[test]
    fn emit_background_only() {
        let noise = Noise::off();
        let s = emitted(|w| emit(w, &noise, ColorDepth::Ansi16, (3, 3), None, [170, 0, 0]));
        assert_eq!(s, "\x1b[41m");
    }

    #[test]
    fn emit_split_uniform_block_is_background_space() {
        let noise = Noise::off();
        let split = sextant(&[[1, 2, 3]; 6]);
        let s = emitted(|w| emit_split(w, &noise, ColorDepth::Ansi256, (0, 0), split, &SEXTANTS));
        assert_eq!(s, format!("\x1b[48;5;{}m ", crate::color::ansi256([1, 2, 3])));
    }

    #[test]
    fn emit_split_quadrant_glyph() {
        let noise = Noise::off();
        let px = [[210, 200, 190], [190, 200, 210], [40, 50, 60], [60, 50, 40]];
        let s = emitted(|w| {
            emit_split(w, &noise, ColorDepth::TrueColor, (0, 0), quadrant(&px), &QUADRANTS)
        });
        assert_eq!(s, "\x1b[38;2;200;200;200m\x1b[48;2;50;50;50m▀");
    }
}
