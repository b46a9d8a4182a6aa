// SPDX-License-Identifier: MIT
//
// Render mode: which glyph strategy, which color encoding.
//
// The two axes are independent closed enums, combined into a `RenderMode`
// that can only be built through `RenderMode::new`. Monochrome colors
// (dark, light) draw glyph shapes without color codes, and only the
// sextant strategy has a monochrome path, so every other pairing with
// them is rejected up front.
//
// Geometry lives here too: the strategy decides how many source pixels
// one terminal cell covers, and therefore how large the downsampled
// destination image is for a given number of columns.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// ─── Strategy ────────────────────────────────────────────────────────────────

/// How source pixels are packed into one terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    /// 1×1: background color and a space.
    Space,
    /// 1×2: upper half block, top pixel as foreground.
    Half,
    /// 2×2 quadrant glyphs.
    Quadrant,
    /// 2×3 sextant glyphs.
    #[default]
    Sextant,
}

impl Strategy {
    pub const ALL: [Self; 4] = [Self::Space, Self::Half, Self::Quadrant, Self::Sextant];

    /// Option-value spelling.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Space => "space",
            Self::Half => "half",
            Self::Quadrant => "quadrant",
            Self::Sextant => "sextant",
        }
    }

    /// Source pixels per cell as `(columns, rows)`.
    #[must_use]
    pub const fn cell_size(self) -> (usize, usize) {
        match self {
            Self::Space => (1, 1),
            Self::Half => (1, 2),
            Self::Quadrant => (2, 2),
            Self::Sextant => (2, 3),
        }
    }

    /// Destination pixel grid for `columns` terminal columns.
    ///
    /// Assumes a 4:9 character cell and a 4:3 source image. Heights are
    /// rounded down to a whole number of cell rows.
    #[must_use]
    pub const fn pixel_size(self, columns: usize) -> (usize, usize) {
        let width = columns * self.cell_size().0;
        let height = match self {
            Self::Space => width * 12 / 36,
            Self::Half => (width * 24 / 36) & !1,
            Self::Quadrant => (width * 12 / 36) & !1,
            Self::Sextant => width * 18 / 36 / 3 * 3,
        };
        (width, height)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|m| m.name() == s).ok_or(())
    }
}

// ─── Color ───────────────────────────────────────────────────────────────────

/// Escape-sequence color encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorDepth {
    /// `38;2;R;G;B`, no quantization.
    TrueColor,
    /// `38;5;N` over the xterm 256-color palette.
    Ansi256,
    /// SGR 30–37 and 90–97.
    Ansi16,
    /// SGR 30–37, sent with bold for brightness.
    Ansi8,
}

/// The `color` option: a depth, or a monochrome glyph-only rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorMode {
    #[default]
    TrueColor,
    Ansi256,
    Ansi16,
    Ansi8,
    /// Lit sub-pixels are bright; for light text on a dark terminal.
    Dark,
    /// Lit sub-pixels are dark; for dark text on a light terminal.
    Light,
}

impl ColorMode {
    pub const ALL: [Self; 6] = [
        Self::TrueColor,
        Self::Ansi256,
        Self::Ansi16,
        Self::Ansi8,
        Self::Light,
        Self::Dark,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TrueColor => "24bit",
            Self::Ansi256 => "8bit",
            Self::Ansi16 => "4bit",
            Self::Ansi8 => "3bit",
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    /// The color encoding, or `None` for the monochrome modes.
    #[must_use]
    pub const fn depth(self) -> Option<ColorDepth> {
        match self {
            Self::TrueColor => Some(ColorDepth::TrueColor),
            Self::Ansi256 => Some(ColorDepth::Ansi256),
            Self::Ansi16 => Some(ColorDepth::Ansi16),
            Self::Ansi8 => Some(ColorDepth::Ansi8),
            Self::Dark | Self::Light => None,
        }
    }

    #[must_use]
    pub const fn is_monochrome(self) -> bool {
        self.depth().is_none()
    }

    /// Dither strength in percent. Zero turns dithering off.
    ///
    /// Coarser palettes band more and get more noise; 24-bit needs none.
    #[must_use]
    pub const fn noise_scale(self) -> u32 {
        match self {
            Self::Dark | Self::Light => 95,
            Self::Ansi8 => 30,
            Self::Ansi16 => 20,
            Self::Ansi256 => 2,
            Self::TrueColor => 0,
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|m| m.name() == s).ok_or(())
    }
}

// ─── RenderMode ──────────────────────────────────────────────────────────────

/// A strategy/color pairing that the renderer can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderMode {
    strategy: Strategy,
    color: ColorMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModeError {
    #[error("the space charset is incompatible with the {0} color mode")]
    SpaceIsNotMonochrome(ColorMode),
    #[error("the {color} color mode is only implemented for the sextant charset, not {strategy}")]
    MonochromeNeedsSextant { strategy: Strategy, color: ColorMode },
}

impl RenderMode {
    /// Validate a pairing.
    ///
    /// # Errors
    ///
    /// Monochrome colors are only accepted together with [`Strategy::Sextant`].
    pub const fn new(strategy: Strategy, color: ColorMode) -> Result<Self, ModeError> {
        if color.is_monochrome() {
            match strategy {
                Strategy::Sextant => {}
                Strategy::Space => return Err(ModeError::SpaceIsNotMonochrome(color)),
                Strategy::Half | Strategy::Quadrant => {
                    return Err(ModeError::MonochromeNeedsSextant { strategy, color });
                }
            }
        }
        Ok(Self { strategy, color })
    }

    #[inline]
    #[must_use]
    pub const fn strategy(self) -> Strategy {
        self.strategy
    }

    #[inline]
    #[must_use]
    pub const fn color(self) -> ColorMode {
        self.color
    }

    #[inline]
    #[must_use]
    pub const fn pixel_size(self, columns: usize) -> (usize, usize) {
        self.strategy.pixel_size(columns)
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.strategy, self.color)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ── Parsing ───────────────────────────────────────────────────────

    #[test]
    fn names_round_trip() {
        for s in Strategy::ALL {
            assert_eq!(s.name().parse::<Strategy>(), Ok(s));
        }
        for c in ColorMode::ALL {
            assert_eq!(c.name().parse::<ColorMode>(), Ok(c));
        }
    }

    #[test]
    fn unknown_names_rejected() {
        assert_eq!("braille".parse::<Strategy>(), Err(()));
        assert_eq!("16bit".parse::<ColorMode>(), Err(()));
        assert_eq!("Sextant".parse::<Strategy>(), Err(()));
    }

    #[test]
    fn defaults() {
        let mode = RenderMode::default();
        assert_eq!(mode.strategy(), Strategy::Sextant);
        assert_eq!(mode.color(), ColorMode::TrueColor);
    }

    // ── Validation ────────────────────────────────────────────────────

    #[test]
    fn every_depth_works_with_every_strategy() {
        for s in Strategy::ALL {
            for c in ColorMode::ALL.into_iter().filter(|c| !c.is_monochrome()) {
                assert!(RenderMode::new(s, c).is_ok(), "{s} {c}");
            }
        }
    }

    #[test]
    fn monochrome_requires_sextant() {
        assert!(RenderMode::new(Strategy::Sextant, ColorMode::Dark).is_ok());
        assert!(RenderMode::new(Strategy::Sextant, ColorMode::Light).is_ok());
        assert_eq!(
            RenderMode::new(Strategy::Space, ColorMode::Light),
            Err(ModeError::SpaceIsNotMonochrome(ColorMode::Light))
        );
        assert_eq!(
            RenderMode::new(Strategy::Half, ColorMode::Dark),
            Err(ModeError::MonochromeNeedsSextant {
                strategy: Strategy::Half,
                color: ColorMode::Dark,
            })
        );
        assert!(RenderMode::new(Strategy::Quadrant, ColorMode::Dark).is_err());
    }

    #[test]
    fn error_messages_name_the_options() {
        let err = RenderMode::new(Strategy::Quadrant, ColorMode::Light).unwrap_err();
        assert_eq!(
            err.to_string(),
            "the light color mode is only implemented for the sextant charset, not quadrant"
        );
    }

    // ── Geometry ──────────────────────────────────────────────────────

    #[test]
    fn pixel_size_at_80_columns() {
        assert_eq!(Strategy::Space.pixel_size(80), (80, 26));
        assert_eq!(Strategy::Half.pixel_size(80), (80, 52));
        assert_eq!(Strategy::Quadrant.pixel_size(80), (160, 52));
        assert_eq!(Strategy::Sextant.pixel_size(80), (160, 78));
    }

    #[test]
    fn pixel_size_is_whole_cells() {
        for s in Strategy::ALL {
            let (cw, ch) = s.cell_size();
            for cols in 0..300 {
                let (w, h) = s.pixel_size(cols);
                assert_eq!(w % cw, 0, "{s} at {cols}");
                assert_eq!(h % ch, 0, "{s} at {cols}");
            }
        }
    }

    #[test]
    fn noise_scale_per_mode() {
        assert_eq!(ColorMode::TrueColor.noise_scale(), 0);
        assert_eq!(ColorMode::Ansi256.noise_scale(), 2);
        assert_eq!(ColorMode::Ansi16.noise_scale(), 20);
        assert_eq!(ColorMode::Ansi8.noise_scale(), 30);
        assert_eq!(ColorMode::Dark.noise_scale(), 95);
        assert_eq!(ColorMode::Light.noise_scale(), 95);
    }
}
