// SPDX-License-Identifier: MIT
//
// Dither noise.
//
// Quantizing to 8 or 16 colors bands badly. Adding a small, spatially
// well-spread offset to each channel before quantizing trades the bands for
// fine grain, and cycling through several textures over time turns the grain
// into shimmer that the eye averages out.
//
// The texture set is 64 tiles of 16×16 texels, three channels each. Raw
// channel values are centered on 128. At startup every channel is squeezed
// toward the center by a per-color-mode strength,
//
//     channel' = channel * scale / 100 + 255 * (100 - scale) / 200
//
// so that `channel' - 128` is the offset added to a color channel. Scale 0
// (24-bit) turns dithering off altogether.
//
// The built-in set is a 16×16 Bayer matrix under 64 toroidal shifts, with a
// different shift per channel so the channels do not move in lockstep. A
// precomputed blue-noise pack can replace it through `from_packed`.

use thiserror::Error;

use crate::mode::ColorMode;

/// Number of textures in a set.
pub const TEXTURE_COUNT: usize = 64;

/// Width and height of one texture.
pub const TEXTURE_SIDE: usize = 16;

const TEXELS: usize = TEXTURE_SIDE * TEXTURE_SIDE;

/// Milliseconds between texture changes unless configured otherwise.
pub const DEFAULT_SPEED_MS: u32 = 75;

/// One texel: red, green, blue channel values.
pub type Texel = [u8; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NoiseError {
    #[error("noise data holds {found} texels, expected {}", TEXTURE_COUNT * TEXELS)]
    WrongTexelCount { found: usize },
    #[error("noise data length {0} is not a multiple of 4 bytes")]
    Misaligned(usize),
}

// ─── Bayer ───────────────────────────────────────────────────────────────────

/// 16×16 ordered-dither threshold matrix, values 0–255, row-major.
static BAYER: [u8; TEXELS] = build_bayer();

#[allow(clippy::cast_possible_truncation)] // Values fit in 8 bits.
const fn build_bayer() -> [u8; TEXELS] {
    let mut m = [0u8; TEXELS];
    let mut y = 0;
    while y < TEXTURE_SIDE {
        let mut x = 0;
        while x < TEXTURE_SIDE {
            // Interleave the bits of (x ^ y) and y, lowest coordinate bit
            // first, which ends up most significant.
            let mut v = 0;
            let mut bit = 0;
            while bit < 4 {
                v = (v << 2) | ((((x ^ y) >> bit) & 1) << 1) | ((y >> bit) & 1);
                bit += 1;
            }
            m[y * TEXTURE_SIDE + x] = v as u8;
            x += 1;
        }
        y += 1;
    }
    m
}

/// Per-channel extra shift of the built-in set, as `(dx, dy)`.
const CHANNEL_SHIFT: [(usize, usize); 3] = [(0, 0), (5, 9), (11, 3)];

// ─── NoiseTextures ───────────────────────────────────────────────────────────

/// The full texture set. Always exactly [`TEXTURE_COUNT`] tiles.
#[derive(Clone, PartialEq, Eq)]
pub struct NoiseTextures {
    tiles: Vec<[Texel; TEXELS]>,
}

impl std::fmt::Debug for NoiseTextures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseTextures")
            .field("tiles", &self.tiles.len())
            .finish()
    }
}

impl NoiseTextures {
    /// The built-in ordered-dither set.
    #[must_use]
    pub fn builtin() -> Self {
        let tiles = (0..TEXTURE_COUNT)
            .map(|t| {
                let (sx, sy) = ((t * 7) & 15, ((t * 13) >> 2) & 15);
                let mut tile = [[0; 3]; TEXELS];
                for (i, texel) in tile.iter_mut().enumerate() {
                    let (x, y) = (i % TEXTURE_SIDE, i / TEXTURE_SIDE);
                    for (c, &(dx, dy)) in CHANNEL_SHIFT.iter().enumerate() {
                        let bx = (x + sx + dx) & 15;
                        let by = (y + sy + dy) & 15;
                        texel[c] = BAYER[by * TEXTURE_SIDE + bx];
                    }
                }
                tile
            })
            .collect();
        Self { tiles }
    }

    /// Texels packed as `b | g << 8 | r << 16`, tile by tile, row-major.
    /// This is the layout of the blue-noise asset pack: the low byte dithers
    /// blue and doubles as the brightness offset in monochrome modes.
    ///
    /// # Errors
    ///
    /// The slice must hold exactly `64 × 256` texels.
    pub fn from_packed(packed: &[u32]) -> Result<Self, NoiseError> {
        if packed.len() != TEXTURE_COUNT * TEXELS {
            return Err(NoiseError::WrongTexelCount { found: packed.len() });
        }
        let tiles = packed
            .chunks_exact(TEXELS)
            .map(|chunk| {
                let mut tile = [[0; 3]; TEXELS];
                for (texel, &v) in tile.iter_mut().zip(chunk) {
                    let [b, g, r, _] = v.to_le_bytes();
                    *texel = [r, g, b];
                }
                tile
            })
            .collect();
        Ok(Self { tiles })
    }

    /// Packed texels stored as little-endian `u32`s, as in an asset file.
    ///
    /// # Errors
    ///
    /// Fails if the length is not a whole number of texels or the count
    /// is wrong.
    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, NoiseError> {
        if bytes.len() % 4 != 0 {
            return Err(NoiseError::Misaligned(bytes.len()));
        }
        let packed: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Self::from_packed(&packed)
    }

    /// Raw texel of `texture` at pixel `(x, y)`. The tile repeats every 16 pixels.
    #[inline]
    #[must_use]
    pub fn sample(&self, texture: usize, x: usize, y: usize) -> Texel {
        self.tiles[texture % TEXTURE_COUNT][(x & 15) + (y & 15) * TEXTURE_SIDE]
    }

    /// Squeeze every channel toward 128 by `scale` percent.
    #[allow(clippy::cast_possible_truncation)] // Result ≤ 255 for scale ≤ 100.
    pub fn rescale(&mut self, scale: u32) {
        let scale = scale.min(100);
        let base = 255 * (100 - scale) / 200;
        for tile in &mut self.tiles {
            for texel in tile.iter_mut() {
                for ch in texel.iter_mut() {
                    *ch = (u32::from(*ch) * scale / 100 + base) as u8;
                }
            }
        }
    }
}

// ─── Noise ───────────────────────────────────────────────────────────────────

/// The renderer's dither state: scaled textures plus the rotating selection.
#[derive(Debug, Clone)]
pub struct Noise {
    textures: NoiseTextures,
    enabled: bool,
    current: usize,
    last_advance: u32,
    speed_ms: u32,
}

impl Noise {
    /// Scale `textures` for `color` and start at texture 0.
    ///
    /// Dithering stays off if `requested` is false or the color mode wants
    /// no noise.
    #[must_use]
    pub fn new(
        mut textures: NoiseTextures,
        color: ColorMode,
        requested: bool,
        speed_ms: u32,
        now: u32,
    ) -> Self {
        let scale = color.noise_scale();
        let enabled = requested && scale != 0;
        if enabled {
            textures.rescale(scale);
        }
        tracing::debug!(enabled, scale, speed_ms, "noise initialized");
        Self {
            textures,
            enabled,
            current: 0,
            last_advance: now,
            speed_ms,
        }
    }

    /// Noise that never offsets anything.
    #[must_use]
    pub fn off() -> Self {
        Self::new(NoiseTextures::builtin(), ColorMode::TrueColor, false, DEFAULT_SPEED_MS, 0)
    }

    #[inline]
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Index of the texture in use.
    #[inline]
    #[must_use]
    pub const fn current(&self) -> usize {
        self.current
    }

    /// Rotate to the next texture if more than the speed interval has passed.
    ///
    /// Returns whether it rotated.
    pub fn advance(&mut self, now: u32) -> bool {
        if !self.enabled || now.wrapping_sub(self.last_advance) <= self.speed_ms {
            return false;
        }
        self.last_advance = now;
        self.current = (self.current + 1) % TEXTURE_COUNT;
        true
    }

    /// Signed per-channel offset at pixel `(x, y)`.
    #[inline]
    #[must_use]
    pub fn offset(&self, x: usize, y: usize) -> [i32; 3] {
        if !self.enabled {
            return [0; 3];
        }
        self.textures.sample(self.current, x, y).map(|c| i32::from(c) - 128)
    }

    /// Signed brightness offset at pixel `(x, y)`, from the blue channel
    /// (the low byte of a packed texel).
    #[inline]
    #[must_use]
    pub fn mono_offset(&self, x: usize, y: usize) -> i32 {
        if !self.enabled {
            return 0;
        }
        i32::from(self.textures.sample(self.current, x, y)[2]) - 128
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
