// SPDX-License-Identifier: MIT
//
// Host errors. Everything here is fatal to startup or to the frame loop.

use std::io;
use std::path::PathBuf;

use sx_render::{FrameError, NoiseError};
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read noise texture {}: {source}", path.display())]
    NoiseRead { path: PathBuf, source: io::Error },

    #[error("bad noise texture {}: {source}", path.display())]
    NoiseFormat { path: PathBuf, source: NoiseError },

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("terminal output failed: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
