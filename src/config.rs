//! Configuration for default row filters, duration queries and rendering.
//!
//! Configuration is loaded in the following order (later sources override
//! earlier ones):
//! 1. Built-in defaults
//! 2. Config file
//! 3. Environment variables (`FRAMETRACE_*`)
//!
//! CLI flags override everything here.
//!
//! ```toml
//! skip = 0
//! duration-ms = 0          # non-positive disables the tail filter
//!
//! [durations]
//! begin = "wake_up"
//! end = "display"
//!
//! [render]
//! draw-order = "newest-first"
//! pixels-per-ms = 20.0
//! ```
//!
//! Config file location:
//! - Linux/macOS: `$XDG_CONFIG_HOME/frametrace/config.toml` or
//!   `~/.config/frametrace/config.toml`
//! - Windows: `%APPDATA%\frametrace\config.toml`
//!
//! `FRAMETRACE_CONFIG_PATH` overrides the config file location.

use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[cfg(not(test))]
use etcetera::base_strategy::{BaseStrategy, choose_base_strategy};

use crate::timeline::DrawOrder;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FrametraceConfig {
    /// Drop frames below this index and renumber the rest
    #[serde(default)]
    pub skip: i64,

    /// Drop events past this many milliseconds from the log origin
    /// (non-positive disables the filter)
    #[serde(default, rename = "duration-ms")]
    pub duration_ms: i64,

    #[serde(default)]
    pub durations: DurationDefaults,

    #[serde(default)]
    pub render: RenderDefaults,
}

/// Default begin/end events for duration queries.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DurationDefaults {
    #[serde(default)]
    pub begin: String,
    #[serde(default)]
    pub end: String,
}

impl Default for DurationDefaults {
    fn default() -> Self {
        Self {
            begin: "wake_up".to_string(),
            end: "display".to_string(),
        }
    }
}

/// Defaults for the SVG timeline renderer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RenderDefaults {
    #[serde(default, rename = "draw-order")]
    pub draw_order: DrawOrder,
    #[serde(default = "default_pixels_per_ms", rename = "pixels-per-ms")]
    pub pixels_per_ms: f64,
}

fn default_pixels_per_ms() -> f64 {
    20.0
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            draw_order: DrawOrder::default(),
            pixels_per_ms: default_pixels_per_ms(),
        }
    }
}

impl FrametraceConfig {
    /// Load configuration from the config file and environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("skip", defaults.skip)?
            .set_default("duration-ms", defaults.duration_ms)?
            .set_default("durations.begin", defaults.durations.begin)?
            .set_default("durations.end", defaults.durations.end)?
            .set_default("render.draw-order", "newest-first")?
            .set_default("render.pixels-per-ms", defaults.render.pixels_per_ms)?;

        // Add config file if it exists
        if let Some(config_path) = get_config_path()
            && config_path.exists()
        {
            builder = builder.add_source(File::from(config_path));
        }

        // Add environment variables with FRAMETRACE prefix
        builder = builder.add_source(config::Environment::with_prefix("FRAMETRACE").separator("_"));

        let config: Self = builder.build()?.try_deserialize()?;

        if config.render.pixels_per_ms <= 0.0 {
            return Err(ConfigError::Message(
                "render.pixels-per-ms must be positive".into(),
            ));
        }

        Ok(config)
    }
}

fn get_config_path() -> Option<PathBuf> {
    // Check for test override first (FRAMETRACE_CONFIG_PATH env var)
    if let Ok(path) = std::env::var("FRAMETRACE_CONFIG_PATH") {
        return Some(PathBuf::from(path));
    }

    // In test builds, FRAMETRACE_CONFIG_PATH must be set to prevent reading
    // the developer's real config
    #[cfg(test)]
    panic!("FRAMETRACE_CONFIG_PATH not set in test. Set it to an isolated test config path.");

    // Production: use the platform config location
    #[cfg(not(test))]
    {
        let strategy = choose_base_strategy().ok()?;
        Some(strategy.config_dir().join("frametrace").join("config.toml"))
    }
}
