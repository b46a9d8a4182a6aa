// SPDX-License-Identifier: MIT
//
// sextant: render a palette-indexed framebuffer in the terminal.
//
// This binary is a stand-in engine for the renderer. It animates a 320×200
// plasma through a 256-entry palette, the same shape of framebuffer a
// classic game engine produces, and drives the backend the way such an
// engine's platform layer would:
//
//   get_key (until empty) → update → draw_frame → sleep out the tick
//
// Arrow keys pan the plasma for as long as they are held. The terminal
// never reports releases, so "held" ends when the input engine infers a
// release from the keyboard's repeat timing. `q` or Escape quits.
//
// Logs go to stderr unless `--log-file` is given. Raise verbosity with
// RUST_LOG (default `warn`); `RUST_LOG=sx_input=debug` shows repeat
// detection as it happens.

use std::fs::File;
use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use sx_host::{Backend, Config};
use sx_input::{KeyEvent, KeyEventKind, keys};
use sx_render::{Rgb, SourceFrame};
use sx_term::SystemClock;
use sx_term::reader::StdinSource;
use sx_term::terminal::{StdoutFd, TtySession};

/// Source framebuffer size.
const SOURCE_WIDTH: usize = 320;
const SOURCE_HEIGHT: usize = 200;

/// Source pixels panned per frame while an arrow is held.
const PAN_STEP: i32 = 4;

// ─── Arguments ───────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "sextant", version, about = "Render an animated framebuffer as block glyphs in the terminal")]
struct Args {
    /// Glyph strategy: space, half, quadrant, sextant [default: sextant]
    #[arg(long)]
    charset: Option<String>,

    /// Color encoding: 24bit, 8bit, 4bit, 3bit, light, dark [default: 24bit]
    #[arg(long)]
    color: Option<String>,

    /// Dither coarse palettes: on, off [default: on]
    #[arg(long)]
    noise: Option<String>,

    /// Milliseconds between dither texture changes [default: 75]
    #[arg(long)]
    noise_speed: Option<String>,

    /// Packed noise texture asset to use instead of the built-in set
    #[arg(long)]
    noise_file: Option<String>,

    /// Not implemented yet
    #[arg(long, hide = true)]
    noise_strength: Option<String>,

    /// Not implemented yet
    #[arg(long, hide = true)]
    filter: Option<String>,

    /// Terminal columns to render into [default: 80]
    #[arg(long)]
    columns: Option<String>,

    /// Statistics footer: on, off [default: on]
    #[arg(long)]
    stats: Option<String>,

    /// Do not bracket frames with synchronized update markers
    #[arg(long)]
    no_sync: bool,

    /// Frames per second to aim for
    #[arg(long, default_value_t = 35)]
    fps: u32,

    /// Quit after this many frames (0 runs until q is pressed)
    #[arg(long, default_value_t = 0)]
    frames: u64,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<String>,
}

impl Args {
    /// The renderer options that were given, as name/value pairs.
    fn options(&self) -> Vec<(&'static str, String)> {
        let named = [
            ("charset", &self.charset),
            ("color", &self.color),
            ("noise", &self.noise),
            ("noise-speed", &self.noise_speed),
            ("noise-file", &self.noise_file),
            ("noise-strength", &self.noise_strength),
            ("filter", &self.filter),
            ("columns", &self.columns),
            ("stats", &self.stats),
        ];
        let mut options: Vec<_> = named
            .into_iter()
            .filter_map(|(name, value)| value.clone().map(|v| (name, v)))
            .collect();
        if self.no_sync {
            options.push(("sync", "off".to_owned()));
        }
        options
    }
}

// ─── Plasma ──────────────────────────────────────────────────────────────────

/// The stand-in engine: a palette-indexed plasma with a pannable origin.
struct Plasma {
    pixels: Vec<u8>,
    palette: [Rgb; 256],
    origin: (i32, i32),
    /// Held arrows: left, right, up, down.
    held: [bool; 4],
}

impl Plasma {
    fn new() -> Self {
        Self {
            pixels: vec![0; SOURCE_WIDTH * SOURCE_HEIGHT],
            palette: palette(),
            origin: (0, 0),
            held: [false; 4],
        }
    }

    /// Track arrow keys. Returns false when the user asked to quit.
    fn handle(&mut self, event: KeyEvent) -> bool {
        let pressed = event.kind == KeyEventKind::Press;
        let arrow = match event.code {
            b'Q' | keys::ESCAPE if pressed => return false,
            keys::LEFT_ARROW => 0,
            keys::RIGHT_ARROW => 1,
            keys::UP_ARROW => 2,
            keys::DOWN_ARROW => 3,
            _ => return true,
        };
        self.held[arrow] = pressed;
        true
    }

    fn step(&mut self) {
        let [left, right, up, down] = self.held.map(i32::from);
        self.origin.0 += (right - left) * PAN_STEP;
        self.origin.1 += (down - up) * PAN_STEP;
    }

    // Coordinates are small enough for i32 and f32, and the sum is scaled into 0..=255.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )]
    fn draw(&mut self, now_ms: u32) {
        let t = (now_ms % 1_000_000) as f32 / 1000.0;
        let (ox, oy) = self.origin;
        for (y, row) in self.pixels.chunks_exact_mut(SOURCE_WIDTH).enumerate() {
            let fy = (y as i32 + oy) as f32;
            for (x, px) in row.iter_mut().enumerate() {
                let fx = (x as i32 + ox) as f32;
                let v = (fx / 23.0 + t).sin()
                    + (fy / 17.0 - t * 0.7).sin()
                    + ((fx + fy) / 29.0 + t * 0.4).sin()
                    + ((fx * fx + fy * fy).sqrt() / 13.0 - t * 1.3).sin();
                *px = ((v + 4.0) * 31.875) as u8;
            }
        }
    }
}

/// A looping gradient: deep blue, magenta, orange, pale yellow, and back.
fn palette() -> [Rgb; 256] {
    const STOPS: [Rgb; 5] = [
        [8, 12, 60],
        [150, 30, 140],
        [240, 120, 40],
        [250, 240, 170],
        [8, 12, 60],
    ];
    std::array::from_fn(|i| {
        let segment = i / 64;
        let frac = i % 64;
        let (a, b) = (STOPS[segment], STOPS[segment + 1]);
        std::array::from_fn(|c| lerp(a[c], b[c], frac))
    })
}

#[allow(clippy::cast_possible_truncation)] // A blend of two u8 values fits in u8.
fn lerp(a: u8, b: u8, frac: usize) -> u8 {
    let (a, b) = (usize::from(a), usize::from(b));
    ((a * (64 - frac) + b * frac) / 64) as u8
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn init_logging(log_file: Option<&Path>) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            registry
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .init();
        }
        None => registry.with(fmt::layer().with_writer(io::stderr)).init(),
    }
    Ok(())
}

fn run(args: &Args) -> sx_host::Result<()> {
    let config = Config::from_options(args.options())?;
    let _session = TtySession::enter()?;
    let mut backend = Backend::init(config, StdoutFd, StdinSource::new(), SystemClock::new())?;
    backend.set_window_title("sextant")?;

    let mut plasma = Plasma::new();
    let tick_ms = 1000 / args.fps.max(1);
    let mut frames = 0u64;

    loop {
        let start = backend.ticks_ms();
        while let Some(event) = backend.get_key() {
            if !plasma.handle(event) {
                return Ok(());
            }
        }

        plasma.step();
        plasma.draw(start);
        let frame = SourceFrame::new(SOURCE_WIDTH, SOURCE_HEIGHT, &plasma.pixels, &plasma.palette)?;
        backend.draw_frame(&frame)?;

        frames += 1;
        if args.frames != 0 && frames >= args.frames {
            return Ok(());
        }

        let spent = backend.ticks_ms().wrapping_sub(start);
        if spent < tick_ms {
            backend.sleep_ms(tick_ms - spent);
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(args.log_file.as_deref().map(Path::new)) {
        eprintln!("sextant: cannot open log file: {e}");
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "exiting");
            eprintln!("sextant: {e}");
            ExitCode::FAILURE
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
