// SPDX-License-Identifier: MIT
//
// The backend an engine drives.
//
// An engine's platform layer needs six things: setup, present a frame,
// next key event, sleep, a millisecond tick, and a window title. `Backend`
// provides them on top of the frame driver and the input engine. It owns
// the output writer, the input byte source, and the clock, so the whole
// thing runs headless in tests with a `Vec<u8>`, a `MemorySource`, and a
// `ManualClock`.
//
// While a frame is being drawn, the driver calls back before every row and
// the backend drains stdin into the input engine. A slow terminal can take
// tens of milliseconds per frame, longer than a key repeat interval, and
// key timestamps taken only between frames would be too coarse to learn
// the repeat rate from.

use std::fs;
use std::io::Write;

use sx_input::{InputEngine, KeyEvent, RepeatTiming};
use sx_render::{FrameDriver, FrameHooks, FrameOptions, FrameReport, KeyTiming, Noise, NoiseTextures, SourceFrame};
use sx_term::{ByteSource, Clock, OutputBuffer, ansi};

use crate::config::Config;
use crate::error::{Error, Result};

pub struct Backend<W, S, C> {
    config: Config,
    driver: FrameDriver,
    input: InputEngine,
    out: W,
    source: S,
    clock: C,
}

impl<W: Write, S: ByteSource, C: Clock> Backend<W, S, C> {
    /// Load the dither textures and size the frame driver for `config`.
    ///
    /// # Errors
    ///
    /// Fails if a configured noise file cannot be read or has the wrong
    /// size.
    pub fn init(config: Config, out: W, source: S, clock: C) -> Result<Self> {
        let textures = match &config.noise_file {
            Some(path) => {
                let bytes = fs::read(path).map_err(|source| Error::NoiseRead {
                    path: path.clone(),
                    source,
                })?;
                NoiseTextures::from_le_bytes(&bytes).map_err(|source| Error::NoiseFormat {
                    path: path.clone(),
                    source,
                })?
            }
            None => NoiseTextures::builtin(),
        };
        let color = config.mode.color();
        let noise = Noise::new(textures, color, config.noise, config.noise_speed_ms, clock.now_ms());
        let options = FrameOptions {
            sync: config.sync,
            stats: config.stats,
        };
        let driver = FrameDriver::new(config.mode, config.columns, noise, options);

        tracing::info!(
            mode = %config.mode,
            columns = config.columns,
            noise = noise_label(driver.noise()),
            stats = config.stats,
            sync = config.sync,
            "backend initialized"
        );

        Ok(Self {
            config,
            driver,
            input: InputEngine::new(),
            out,
            source,
            clock,
        })
    }

    #[inline]
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Destination image size in pixels.
    #[inline]
    #[must_use]
    pub const fn pixel_size(&self) -> (usize, usize) {
        self.driver.pixel_size()
    }

    /// Render `frame` and write it out.
    ///
    /// # Errors
    ///
    /// Fails if the writer reports an error other than a transient stall.
    pub fn draw_frame(&mut self, frame: &SourceFrame<'_>) -> Result<FrameReport> {
        let Self {
            driver,
            input,
            out,
            source,
            clock,
            ..
        } = self;
        let mut hooks = PollHooks {
            input,
            source,
            clock: &*clock,
        };
        let report = driver.render(frame, &*clock, &mut hooks);
        driver.flush_to(out)?;
        tracing::trace!(bytes = report.bytes, cells = report.cells, "frame written");
        Ok(report)
    }

    /// Poll input, infer releases, and return the oldest pending key event.
    pub fn get_key(&mut self) -> Option<KeyEvent> {
        self.input.get_key(&mut self.source, &self.clock)
    }

    #[inline]
    pub fn sleep_ms(&self, ms: u32) {
        self.clock.sleep_ms(ms);
    }

    #[inline]
    #[must_use]
    pub fn ticks_ms(&self) -> u32 {
        self.clock.now_ms()
    }

    /// Set the terminal window title. The text is sent unescaped, so
    /// control characters in it reach the terminal.
    ///
    /// # Errors
    ///
    /// Fails if the writer does.
    pub fn set_window_title(&mut self, title: &str) -> Result<()> {
        let mut buf = OutputBuffer::with_capacity(title.len() + 8);
        ansi::set_title(&mut buf, title).ok();
        buf.flush_to(&mut self.out)?;
        Ok(())
    }

    /// Current repeat delay and rate estimate.
    #[inline]
    #[must_use]
    pub const fn repeat_timing(&self) -> RepeatTiming {
        self.input.timing()
    }

    #[inline]
    #[must_use]
    pub const fn writer(&self) -> &W {
        &self.out
    }

    #[inline]
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }
}

const fn noise_label(noise: &Noise) -> &'static str {
    if noise.is_enabled() { "on" } else { "off" }
}

/// Frame callbacks that feed stdin into the input engine between rows.
struct PollHooks<'a, S, C> {
    input: &'a mut InputEngine,
    source: &'a mut S,
    clock: &'a C,
}

impl<S: ByteSource, C: Clock> FrameHooks for PollHooks<'_, S, C> {
    fn poll_input(&mut self) {
        self.input.poll(&mut *self.source, self.clock);
    }

    fn key_timing(&self) -> KeyTiming {
        let RepeatTiming { delay_ms, rate_ms } = self.input.timing();
        KeyTiming { delay_ms, rate_ms }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sx_input::keys;
    use sx_render::Rgb;
    use sx_term::{ManualClock, MemorySource};

    type TestBackend = Backend<Vec<u8>, MemorySource, ManualClock>;

    fn backend(pairs: &[(&str, &str)], input: &[u8]) -> TestBackend {
        let config = Config::from_options(pairs.iter().copied()).unwrap();
        Backend::init(config, Vec::new(), MemorySource::from_bytes(input), ManualClock::default())
            .unwrap()
    }

    fn palette() -> [Rgb; 256] {
        std::array::from_fn(|i| {
            let v = u8::try_from(i).unwrap();
            [v, v / 2, 255 - v]
        })
    }

    #[test]
    fn draw_frame_writes_one_frame() {
        let mut b = backend(&[("columns", "10"), ("stats", "off")], b"");
        let palette = palette();
        let pixels = vec![40u8; 32 * 20];
        let frame = SourceFrame::new(32, 20, &pixels, &palette).unwrap();

        let report = b.draw_frame(&frame).unwrap();
        let written = b.writer();
        assert_eq!(written.len(), report.bytes);
        assert!(written.starts_with(b"\x1b[?2026h\n\x1b[2J\x1b[1;1H\x1b[?25l"));
        assert!(written.ends_with(b"\x1b[?25h\x1b[?2026l"));
        assert_eq!(b.pixel_size(), (20, 9));
        assert_eq!(report.rows, 3);
    }

    #[test]
    fn input_is_drained_while_drawing() {
        let mut b = backend(&[("columns", "10")], b"w\x1b[C");
        let palette = palette();
        let pixels = vec![0u8; 4];
        let frame = SourceFrame::new(2, 2, &pixels, &palette).unwrap();

        b.draw_frame(&frame).unwrap();
        assert_eq!(b.source().remaining(), 0);
        assert_eq!(b.get_key(), Some(KeyEvent::press(b'W')));
        assert_eq!(b.get_key(), Some(KeyEvent::press(keys::RIGHT_ARROW)));
        assert_eq!(b.get_key(), None);
    }

    #[test]
    fn footer_reports_repeat_estimate() {
        let mut b = backend(&[("columns", "4"), ("sync", "off")], b"");
        let palette = palette();
        let pixels = vec![9u8; 4];
        let frame = SourceFrame::new(2, 2, &pixels, &palette).unwrap();
        b.draw_frame(&frame).unwrap();
        let text = String::from_utf8(b.writer().clone()).unwrap();
        assert!(text.ends_with("key repeat delay: 500 ms    key repeat rate: 100 ms\n\x1b[?25h"));
    }

    #[test]
    fn ticks_and_sleep_share_the_clock() {
        let b = backend(&[], b"");
        let start = b.ticks_ms();
        b.sleep_ms(35);
        assert_eq!(b.ticks_ms().wrapping_sub(start), 35);
    }

    #[test]
    fn release_follows_silence() {
        let mut b = backend(&[], b"a");
        assert_eq!(b.get_key(), Some(KeyEvent::press(b'A')));
        b.sleep_ms(520);
        assert_eq!(b.get_key(), Some(KeyEvent::release(b'A')));
        assert_eq!(b.get_key(), None);
    }

    #[test]
    fn window_title() {
        let mut b = backend(&[], b"");
        b.set_window_title("sextant demo").unwrap();
        assert_eq!(b.writer().as_slice(), b"\x1b]0;sextant demo\x07");
    }

    #[test]
    fn missing_noise_file_is_fatal() {
        let path = std::env::temp_dir().join("sx-host-no-such-noise-file.bin");
        let config = Config {
            noise_file: Some(path),
            ..Config::default()
        };
        let err = Backend::init(config, Vec::new(), MemorySource::new(), ManualClock::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::NoiseRead { .. }), "{err}");
    }

    #[test]
    fn noise_file_is_loaded() {
        let path = std::env::temp_dir().join(format!("sx-host-noise-{}.bin", std::process::id()));
        let texels = sx_render::noise::TEXTURE_COUNT * 256;
        std::fs::write(&path, vec![0x80; texels * 4]).unwrap();

        let config = Config {
            noise_file: Some(path.clone()),
            mode: sx_render::RenderMode::new(sx_render::Strategy::Half, sx_render::ColorMode::Ansi8).unwrap(),
            ..Config::default()
        };
        let result = Backend::init(config, Vec::new(), MemorySource::new(), ManualClock::default());
        std::fs::remove_file(&path).ok();
        assert!(result.is_ok());

        std::fs::write(&path, [0u8; 6]).unwrap();
        let config = Config {
            noise_file: Some(path.clone()),
            ..Config::default()
        };
        let err = Backend::init(config, Vec::new(), MemorySource::new(), ManualClock::default())
            .err()
            .unwrap();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, Error::NoiseFormat { .. }), "{err}");
    }
}
