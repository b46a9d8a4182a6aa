// SPDX-License-Identifier: MIT
//
// Renderer configuration.
//
// Options arrive as name/value string pairs, however the front end
// collected them (command-line flags, an engine's own argument list, a
// test). Each value is validated as it is read; the strategy/color pairing
// is validated once all options are in, so the order they are given in
// does not matter. Any problem is fatal: there is no degraded startup.

use std::path::PathBuf;

use sx_render::noise::DEFAULT_SPEED_MS;
use sx_render::{ColorMode, ModeError, RenderMode, Strategy};
use thiserror::Error;

pub const DEFAULT_COLUMNS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unrecognized {option} option: \"{value}\"")]
    Unrecognized { option: &'static str, value: String },
    #[error("invalid number for {option}: \"{value}\"")]
    InvalidNumber { option: &'static str, value: String },
    #[error("unknown option: {0}")]
    UnknownOption(String),
    #[error(transparent)]
    Incompatible(#[from] ModeError),
    #[error("{0} option is not yet implemented")]
    NotImplemented(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mode: RenderMode,
    /// Dither coarse palettes.
    pub noise: bool,
    /// Milliseconds between dither texture changes.
    pub noise_speed_ms: u32,
    /// Terminal columns to render into.
    pub columns: usize,
    /// Packed texture asset replacing the built-in dither set.
    pub noise_file: Option<PathBuf>,
    /// Statistics footer under each frame.
    pub stats: bool,
    /// Synchronized update markers around each frame.
    pub sync: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: RenderMode::default(),
            noise: true,
            noise_speed_ms: DEFAULT_SPEED_MS,
            columns: DEFAULT_COLUMNS,
            noise_file: None,
            stats: true,
            sync: true,
        }
    }
}

impl Config {
    /// Build a configuration from `(name, value)` pairs. Later pairs
    /// override earlier ones.
    ///
    /// Recognized names: `charset`, `color`, `noise`, `noise-speed`,
    /// `columns`, `noise-file`, `stats`, `sync`. `filter` and
    /// `noise-strength` are recognized and always rejected.
    ///
    /// # Errors
    ///
    /// Fails on the first bad value or unknown name, or if the charset and
    /// color cannot be combined.
    pub fn from_options<I, K, V>(options: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        let mut strategy = Strategy::default();
        let mut color = ColorMode::default();

        for (name, value) in options {
            let value = value.as_ref();
            match name.as_ref() {
                "charset" => strategy = parse_named("charset", value)?,
                "color" => color = parse_named("color", value)?,
                "noise" => config.noise = parse_switch("noise", value)?,
                "noise-speed" => config.noise_speed_ms = parse_number("noise-speed", value)?,
                "columns" => {
                    config.columns = parse_number("columns", value)?;
                    if config.columns == 0 {
                        return Err(invalid_number("columns", value));
                    }
                }
                "noise-file" => config.noise_file = Some(PathBuf::from(value)),
                "stats" => config.stats = parse_switch("stats", value)?,
                "sync" => config.sync = parse_switch("sync", value)?,
                "filter" => return Err(ConfigError::NotImplemented("filter")),
                "noise-strength" => return Err(ConfigError::NotImplemented("noise strength")),
                other => return Err(ConfigError::UnknownOption(other.to_owned())),
            }
        }

        config.mode = RenderMode::new(strategy, color)?;
        Ok(config)
    }
}

fn parse_named<T: std::str::FromStr<Err = ()>>(
    option: &'static str,
    value: &str,
) -> Result<T, ConfigError> {
    value.parse().map_err(|()| ConfigError::Unrecognized {
        option,
        value: value.to_owned(),
    })
}

fn parse_switch(option: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err(ConfigError::Unrecognized {
            option,
            value: value.to_owned(),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(option: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid_number(option, value))
}

fn invalid_number(option: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidNumber {
        option,
        value: value.to_owned(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
