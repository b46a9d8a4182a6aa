// SPDX-License-Identifier: MIT
//
// sx-render: the raster-to-glyph renderer for sextant.
//
// Takes a palette-indexed framebuffer, resamples it to the terminal's cell
// grid, and writes each frame as one blob of escape sequences and block
// glyphs. Four glyph strategies (space, half block, quadrants, sextants)
// trade horizontal and vertical resolution against output size. Four color
// encodings (24-bit, 256, 16, 8) plus two monochrome modes cover terminals
// from modern emulators down to the Linux console. Coarse palettes are
// dithered with a rotating set of threshold textures so flat gradients
// shimmer instead of banding.

pub mod color;
pub mod frame;
pub mod glyph;
pub mod mode;
pub mod noise;
pub mod stats;

pub use color::Rgb;
pub use frame::{FrameDriver, FrameError, FrameHooks, FrameOptions, FrameReport, SourceFrame};
pub use mode::{ColorDepth, ColorMode, ModeError, RenderMode, Strategy};
pub use noise::{Noise, NoiseError, NoiseTextures};
pub use stats::KeyTiming;
