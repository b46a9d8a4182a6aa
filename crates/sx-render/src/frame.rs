// SPDX-License-Identifier: MIT
//
// Frame driver: source framebuffer in, one terminal frame out.
//
// The pipeline per frame:
//
//   1. Rotate the dither texture if its interval has passed.
//   2. Downsample the palette-indexed source to the destination pixel grid
//      (nearest pixel, looked up through the palette).
//   3. Write the header: begin synchronized update, clear + home, hide cursor.
//   4. For each cell row: let the host poll input, then synthesize every
//      cell of the row and end it with an attribute reset and newline.
//   5. Optionally append the statistics footer.
//   6. Show the cursor, end the synchronized update.
//   7. The caller flushes the whole blob with `flush_to`.
//
// Rendering a large frame over a slow link can take longer than a key
// repeat interval. Polling input between rows keeps key timestamps accurate
// to within one row instead of one frame.
//
// Every frame repaints the whole screen. There is no diffing against the
// previous frame: dithering changes most cells every few frames anyway.

use std::io::{self, Write};

use sx_term::{Clock, OutputBuffer, ansi};
use thiserror::Error;

use crate::color::Rgb;
use crate::glyph::{self, QUADRANTS, SEXTANTS, UPPER_HALF};
use crate::mode::{ColorMode, RenderMode, Strategy};
use crate::noise::Noise;
use crate::stats::{self, FrameStats, KeyTiming};

// ─── Source ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("source frame has zero width or height")]
    Empty,
    #[error("source frame of {width}x{height} needs {} pixels, got {found}", width * height)]
    SizeMismatch {
        width: usize,
        height: usize,
        found: usize,
    },
}

/// The host's framebuffer: row-major palette indices plus the palette.
#[derive(Debug, Clone, Copy)]
pub struct SourceFrame<'a> {
    width: usize,
    height: usize,
    pixels: &'a [u8],
    palette: &'a [Rgb; 256],
}

impl<'a> SourceFrame<'a> {
    /// # Errors
    ///
    /// Dimensions must be non-zero and `pixels` must hold exactly
    /// `width * height` entries.
    pub fn new(
        width: usize,
        height: usize,
        pixels: &'a [u8],
        palette: &'a [Rgb; 256],
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::Empty);
        }
        if pixels.len() != width * height {
            return Err(FrameError::SizeMismatch {
                width,
                height,
                found: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            palette,
        })
    }

    #[inline]
    fn color_at(&self, x: usize, y: usize) -> Rgb {
        self.palette[usize::from(self.pixels[y * self.width + x])]
    }
}

// ─── Hooks ───────────────────────────────────────────────────────────────────

/// What the frame driver needs from the host while drawing.
pub trait FrameHooks {
    /// Called once before each cell row.
    fn poll_input(&mut self);

    /// Key repeat estimates for the statistics footer.
    fn key_timing(&self) -> KeyTiming;
}

// ─── Options & Report ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOptions {
    /// Bracket frames with DEC 2026 synchronized update markers.
    pub sync: bool,
    /// Append the statistics footer.
    pub stats: bool,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            sync: true,
            stats: true,
        }
    }
}

/// What one `render` produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    pub rows: usize,
    pub cells: usize,
    pub bytes: usize,
}

// ─── FrameDriver ─────────────────────────────────────────────────────────────

/// Owns everything that lives across frames: the destination image, the
/// output buffer, the dither state, and the statistics ring.
pub struct FrameDriver {
    mode: RenderMode,
    width: usize,
    height: usize,
    dest: Vec<Rgb>,
    out: OutputBuffer,
    noise: Noise,
    stats: FrameStats,
    options: FrameOptions,
}

impl FrameDriver {
    /// Size the destination image for `columns` terminal columns.
    #[must_use]
    pub fn new(mode: RenderMode, columns: usize, noise: Noise, options: FrameOptions) -> Self {
        let (width, height) = mode.pixel_size(columns);
        tracing::info!(%mode, columns, width, height, "frame driver ready");
        Self {
            mode,
            width,
            height,
            dest: vec![[0; 3]; width * height],
            out: OutputBuffer::new(),
            noise,
            stats: FrameStats::new(),
            options,
        }
    }

    #[inline]
    #[must_use]
    pub const fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Destination image size in pixels.
    #[inline]
    #[must_use]
    pub const fn pixel_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// The downsampled image of the last frame.
    #[inline]
    #[must_use]
    pub fn pixels(&self) -> &[Rgb] {
        &self.dest
    }

    #[inline]
    #[must_use]
    pub const fn noise(&self) -> &Noise {
        &self.noise
    }

    /// Bytes produced by the last `render` and not yet flushed.
    #[inline]
    #[must_use]
    pub fn output(&self) -> &[u8] {
        self.out.as_bytes()
    }

    /// Build one frame into the output buffer.
    pub fn render(
        &mut self,
        frame: &SourceFrame<'_>,
        clock: &impl Clock,
        hooks: &mut impl FrameHooks,
    ) -> FrameReport {
        self.out.clear();
        self.noise.advance(clock.now_ms());
        self.downsample(frame);

        if self.options.sync {
            ansi::begin_sync(&mut self.out).ok();
        }
        ansi::clear_and_home(&mut self.out).ok();
        ansi::cursor_hide(&mut self.out).ok();

        let (rows, cells) = self.draw_rows(hooks);

        if self.options.stats {
            let summary = self.stats.record(clock.now_ms(), self.out.len());
            stats::write_footer(&mut self.out, summary, hooks.key_timing());
        }

        ansi::cursor_show(&mut self.out).ok();
        if self.options.sync {
            ansi::end_sync(&mut self.out).ok();
        }

        FrameReport {
            rows,
            cells,
            bytes: self.out.len(),
        }
    }

    /// Write the rendered frame to `w` and empty the buffer.
    ///
    /// # Errors
    ///
    /// Returns non-transient write errors.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        self.out.flush_to(w)
    }

    /// Nearest-pixel resample of the source into `dest`.
    fn downsample(&mut self, frame: &SourceFrame<'_>) {
        let (w, h) = (self.width, self.height);
        for (y, row) in self.dest.chunks_exact_mut(w.max(1)).enumerate().take(h) {
            let sy = y * frame.height / h;
            for (x, px) in row.iter_mut().enumerate() {
                *px = frame.color_at(x * frame.width / w, sy);
            }
        }
    }

    /// Emit every cell row. Returns `(rows, cells)`.
    fn draw_rows(&mut self, hooks: &mut impl FrameHooks) -> (usize, usize) {
        let Self {
            mode,
            width,
            height,
            dest,
            out,
            noise,
            ..
        } = self;
        let (w, h) = (*width, *height);
        let (cw, ch) = mode.strategy().cell_size();
        let color = mode.color();
        let px = |x: usize, y: usize| dest[y * w + x];

        let mut rows = 0;
        let mut cells = 0;
        for y in (0..h).step_by(ch) {
            hooks.poll_input();
            if color == ColorMode::Ansi8 {
                ansi::bold(out).ok();
            }

            for x in (0..w).step_by(cw) {
                let at = (x, y);
                match (mode.strategy(), color.depth()) {
                    (Strategy::Space, Some(depth)) => {
                        glyph::emit(out, noise, depth, at, None, px(x, y)).ok();
                        out.append(b" ");
                    }
                    (Strategy::Half, Some(depth)) => {
                        glyph::emit(out, noise, depth, at, Some(px(x, y)), px(x, y + 1)).ok();
                        out.append_str(UPPER_HALF);
                    }
                    (Strategy::Quadrant, Some(depth)) => {
                        let block = [px(x, y), px(x + 1, y), px(x, y + 1), px(x + 1, y + 1)];
                        let split = glyph::quadrant(&block);
                        glyph::emit_split(out, noise, depth, at, split, &QUADRANTS).ok();
                    }
                    (Strategy::Sextant, Some(depth)) => {
                        let split = glyph::sextant(&sextant_block(&px, x, y));
                        glyph::emit_split(out, noise, depth, at, split, &SEXTANTS).ok();
                    }
                    // RenderMode only pairs the monochrome colors with sextants.
                    (_, None) => {
                        let offsets = [
                            noise.mono_offset(x, y),
                            noise.mono_offset(x + 1, y),
                            noise.mono_offset(x, y + 1),
                            noise.mono_offset(x + 1, y + 1),
                            noise.mono_offset(x, y + 2),
                            noise.mono_offset(x + 1, y + 2),
                        ];
                        let light = color == ColorMode::Light;
                        let mask = glyph::sextant_mono(&sextant_block(&px, x, y), &offsets, light);
                        out.append_str(SEXTANTS[usize::from(mask)]);
                    }
                }
                cells += 1;
            }

            ansi::reset_newline(out).ok();
            rows += 1;
        }
        (rows, cells)
    }
}

fn sextant_block(px: &impl Fn(usize, usize) -> Rgb, x: usize, y: usize) -> [Rgb; 6] {
    [
        px(x, y),
        px(x + 1, y),
        px(x, y + 1),
        px(x + 1, y + 1),
        px(x, y + 2),
        px(x + 1, y + 2),
    ]
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::ColorMode;
    use crate::noise::NoiseTextures;
    use pretty_assertions::assert_eq;
    use sx_term::ManualClock;

    const HEADER: &str = "\x1b[?2026h\n\x1b[2J\x1b[1;1H\x1b[?25l";
    const TRAILER: &str = "\x1b[?25h\x1b[?2026l";

    #[derive(Default)]
    struct Hooks {
        polls: usize,
    }

    impl FrameHooks for Hooks {
        fn poll_input(&mut self) {
            self.polls += 1;
        }

        fn key_timing(&self) -> KeyTiming {
            KeyTiming {
                delay_ms: 250,
                rate_ms: 33,
            }
        }
    }

    /// Palette where index i is gray level i.
    fn gray_palette() -> [Rgb; 256] {
        std::array::from_fn(|i| {
            let v = u8::try_from(i).unwrap();
            [v, v, v]
        })
    }

    fn driver(strategy: Strategy, color: ColorMode, columns: usize, options: FrameOptions) -> FrameDriver {
        let mode = RenderMode::new(strategy, color).unwrap();
        FrameDriver::new(mode, columns, Noise::off(), options)
    }

    const QUIET: FrameOptions = FrameOptions {
        sync: true,
        stats: false,
    };

    fn text(d: &FrameDriver) -> String {
        String::from_utf8(d.output().to_vec()).unwrap()
    }

    // ── Layout ────────────────────────────────────────────────────────

    #[test]
    fn space_frame_exact_bytes() {
        let palette = gray_palette();
        let pixels = [7u8; 320 * 200];
        let frame = SourceFrame::new(320, 200, &pixels, &palette).unwrap();
        let mut d = driver(Strategy::Space, ColorMode::TrueColor, 3, QUIET);
        assert_eq!(d.pixel_size(), (3, 1));

        let report = d.render(&frame, &ManualClock::default(), &mut Hooks::default());
        let cell = "\x1b[48;2;7;7;7m ";
        assert_eq!(text(&d), format!("{HEADER}{cell}{cell}{cell}\x1b[0m\n{TRAILER}"));
        assert_eq!(report.rows, 1);
        assert_eq!(report.cells, 3);
        assert_eq!(report.bytes, d.output().len());
    }

    #[test]
    fn no_sync_markers_when_disabled() {
        let palette = gray_palette();
        let pixels = [0u8; 4];
        let frame = SourceFrame::new(2, 2, &pixels, &palette).unwrap();
        let options = FrameOptions {
            sync: false,
            stats: false,
        };
        let mut d = driver(Strategy::Half, ColorMode::Ansi256, 4, options);
        d.render(&frame, &ManualClock::default(), &mut Hooks::default());
        let out = text(&d);
        assert!(out.starts_with("\x1b[2J\x1b[1;1H\x1b[?25l"));
        assert!(out.ends_with("\x1b[0m\n\x1b[?25h"));
        assert!(!out.contains("2026"));
    }

    #[test]
    fn polls_once_per_row() {
        let palette = gray_palette();
        let pixels = [1u8; 64 * 48];
        let frame = SourceFrame::new(64, 48, &pixels, &palette).unwrap();
        let mut d = driver(Strategy::Sextant, ColorMode::TrueColor, 20, QUIET);
        let (_, h) = d.pixel_size();
        let mut hooks = Hooks::default();
        let report = d.render(&frame, &ManualClock::default(), &mut hooks);
        assert_eq!(hooks.polls, h / 3);
        assert_eq!(report.rows, h / 3);
        assert_eq!(report.cells, 20 * h / 3);
        assert_eq!(text(&d).matches("\x1b[0m\n").count(), h / 3);
    }

    #[test]
    fn ansi8_rows_start_bold() {
        let palette = gray_palette();
        let pixels = [200u8; 16];
        let frame = SourceFrame::new(4, 4, &pixels, &palette).unwrap();
        let mut d = driver(Strategy::Quadrant, ColorMode::Ansi8, 6, QUIET);
        d.render(&frame, &ManualClock::default(), &mut Hooks::default());
        let out = text(&d);
        let rows = out.matches("\x1b[0m\n").count();
        assert_eq!(out.matches("\x1b[0m\n\x1b[1m").count(), rows - 1);
        assert!(out.starts_with(&format!("{HEADER}\x1b[1m")));
    }

    #[test]
    fn half_cells_use_upper_half_block() {
        let palette = gray_palette();
        let pixels = [10, 10, 250, 250];
        let frame = SourceFrame::new(2, 2, &pixels, &palette).unwrap();
        let mut d = driver(Strategy::Half, ColorMode::TrueColor, 3, QUIET);
        assert_eq!(d.pixel_size(), (3, 2));
        d.render(&frame, &ManualClock::default(), &mut Hooks::default());
        let cell = "\x1b[38;2;10;10;10m\x1b[48;2;250;250;250m▀";
        assert_eq!(text(&d), format!("{HEADER}{cell}{cell}{cell}\x1b[0m\n{TRAILER}"));
    }

    // ── Downsampling ──────────────────────────────────────────────────

    #[test]
    fn downsample_picks_nearest_source_pixel() {
        let palette = gray_palette();
        // 6×3 source, each pixel's index encodes its position.
        let pixels: Vec<u8> = (0..18).collect();
        let frame = SourceFrame::new(6, 3, &pixels, &palette).unwrap();
        // Space at 3 columns: 3×1 destination.
        let mut d = driver(Strategy::Space, ColorMode::TrueColor, 3, QUIET);
        d.render(&frame, &ManualClock::default(), &mut Hooks::default());
        // sx = x * 6 / 3, sy = 0.
        assert_eq!(d.pixels(), &[[0; 3], [2; 3], [4; 3]]);
    }

    #[test]
    fn downsample_rows() {
        let palette = gray_palette();
        let pixels: Vec<u8> = (0..40).collect(); // 4 wide, 10 tall
        let frame = SourceFrame::new(4, 10, &pixels, &palette).unwrap();
        let mut d = driver(Strategy::Sextant, ColorMode::TrueColor, 6, QUIET);
        assert_eq!(d.pixel_size(), (12, 6));
        d.render(&frame, &ManualClock::default(), &mut Hooks::default());
        // Row 5 samples source row 5 * 10 / 6 = 8; column 11 samples 11 * 4 / 12 = 3.
        assert_eq!(d.pixels()[5 * 12 + 11], [8 * 4 + 3; 3]);
    }

    #[test]
    fn source_frame_validation() {
        let palette = gray_palette();
        assert_eq!(SourceFrame::new(0, 5, &[], &palette).unwrap_err(), FrameError::Empty);
        let err = SourceFrame::new(4, 4, &[0; 15], &palette).unwrap_err();
        assert_eq!(err.to_string(), "source frame of 4x4 needs 16 pixels, got 15");
    }

    // ── Monochrome ────────────────────────────────────────────────────

    #[test]
    fn dark_and_light_draw_glyphs_only() {
        let palette = gray_palette();
        let pixels = [255u8; 4];
        let frame = SourceFrame::new(2, 2, &pixels, &palette).unwrap();

        for (color, glyph) in [(ColorMode::Dark, "█"), (ColorMode::Light, " ")] {
            let mode = RenderMode::new(Strategy::Sextant, color).unwrap();
            let noise = Noise::new(NoiseTextures::builtin(), color, false, 75, 0);
            let mut d = FrameDriver::new(mode, 6, noise, QUIET);
            assert_eq!(d.pixel_size(), (12, 6));
            d.render(&frame, &ManualClock::default(), &mut Hooks::default());
            let row = format!("{}\x1b[0m\n", glyph.repeat(6));
            assert_eq!(text(&d), format!("{HEADER}{row}{row}{TRAILER}"));
        }
    }

    // ── Statistics ────────────────────────────────────────────────────

    #[test]
    fn footer_appears_after_window() {
        let palette = gray_palette();
        let pixels = [3u8; 4];
        let frame = SourceFrame::new(2, 2, &pixels, &palette).unwrap();
        let mut d = driver(Strategy::Space, ColorMode::Ansi16, 3, FrameOptions::default());
        let clock = ManualClock::starting_at(10_000);
        let mut hooks = Hooks::default();

        for _ in 0..stats::WINDOW {
            d.render(&frame, &clock, &mut hooks);
            let out = text(&d);
            assert!(!out.contains("frame rate"));
            assert!(out.ends_with(
                "\nkey repeat delay: 250 ms    key repeat rate: 33 ms\n\x1b[?25h\x1b[?2026l"
            ));
            d.flush_to(&mut Vec::new()).unwrap();
            clock.advance(40);
        }

        d.render(&frame, &clock, &mut hooks);
        let out = text(&d);
        assert!(out.contains("frame rate: 26 FPS"), "{out}");
    }

    // ── Noise ─────────────────────────────────────────────────────────

    #[test]
    fn noise_rotates_between_frames() {
        let palette = gray_palette();
        let pixels = [128u8; 4];
        let frame = SourceFrame::new(2, 2, &pixels, &palette).unwrap();
        let mode = RenderMode::new(Strategy::Quadrant, ColorMode::Ansi16).unwrap();
        let noise = Noise::new(NoiseTextures::builtin(), ColorMode::Ansi16, true, 75, 0);
        let mut d = FrameDriver::new(mode, 4, noise, QUIET);
        let clock = ManualClock::default();

        d.render(&frame, &clock, &mut Hooks::default());
        assert_eq!(d.noise().current(), 0);
        clock.advance(76);
        d.render(&frame, &clock, &mut Hooks::default());
        assert_eq!(d.noise().current(), 1);
        clock.advance(10);
        d.render(&frame, &clock, &mut Hooks::default());
        assert_eq!(d.noise().current(), 1);
    }

    #[test]
    fn flush_empties_output() {
        let palette = gray_palette();
        let pixels = [0u8; 4];
        let frame = SourceFrame::new(2, 2, &pixels, &palette).unwrap();
        let mut d = driver(Strategy::Quadrant, ColorMode::TrueColor, 4, QUIET);
        d.render(&frame, &ManualClock::default(), &mut Hooks::default());
        let expected = d.output().to_vec();
        let mut sink = Vec::new();
        d.flush_to(&mut sink).unwrap();
        assert_eq!(sink, expected);
        assert!(d.output().is_empty());
    }
}
