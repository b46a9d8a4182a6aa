// SPDX-License-Identifier: MIT
//
// sx-host: the boundary between a game engine and the terminal renderer.
//
// `Config` turns option strings into a validated setup; `Backend` is the
// platform layer an engine calls each tick (draw a frame, take a key,
// sleep, read the clock, set the title).

pub mod backend;
pub mod config;
pub mod error;

pub use backend::Backend;
pub use config::{Config, ConfigError};
pub use error::{Error, Result};
