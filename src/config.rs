//! Design configuration.
//!
//! Every field has a default, so a TOML file only needs to mention what it
//! changes:
//!
//! ```toml
//! series = "E12"
//! zobel_margin = 1.25
//!
//! [sweep]
//! points = 1000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::log_frequencies;
use crate::components::ESeries;
use crate::error::{ensure_positive, Result, XoverError};
use crate::DEFAULT_POWER_RATING;

/// Frequency sweep used for impedance and response plots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Hz
    pub start_hz: f64,
    /// Hz
    pub end_hz: f64,
    pub points: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            start_hz: 20.0,
            end_hz: 20_000.0,
            points: 500,
        }
    }
}

impl SweepConfig {
    /// Log-spaced sweep frequencies.
    pub fn frequencies(&self) -> Result<Vec<f64>> {
        if self.end_hz < self.start_hz {
            return Err(XoverError::invalid(
                "sweep.end_hz",
                format!("must not be below start_hz ({})", self.start_hz),
            ));
        }
        log_frequencies(self.start_hz, self.end_hz, self.points)
    }
}

/// Configuration for a design session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConfig {
    /// Standard value series used for snapping.
    pub series: ESeries,
    /// Zobel resistor multiplier (1.0 exact, 1.25 conservative).
    pub zobel_margin: f64,
    /// Amplifier power (W) assumed when a driver has no rating.
    pub default_power_rating: f64,
    pub sweep: SweepConfig,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            series: ESeries::default(),
            zobel_margin: 1.0,
            default_power_rating: DEFAULT_POWER_RATING,
            sweep: SweepConfig::default(),
        }
    }
}

impl DesignConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, series: ESeries) -> Self {
        self.series = series;
        self
    }

    /// Set the Zobel resistor margin.
    pub fn with_zobel_margin(mut self, margin: f64) -> Self {
        self.zobel_margin = margin;
        self
    }

    pub fn with_default_power_rating(mut self, watts: f64) -> Self {
        self.default_power_rating = watts;
        self
    }

    /// Set the sweep range and resolution.
    pub fn with_sweep(mut self, start_hz: f64, end_hz: f64, points: usize) -> Self {
        self.sweep = SweepConfig {
            start_hz,
            end_hz,
            points,
        };
        self
    }

    /// Check every numeric field.
    pub fn validate(&self) -> Result<()> {
        ensure_positive("zobel_margin", self.zobel_margin)?;
        ensure_positive("default_power_rating", self.default_power_rating)?;
        self.sweep.frequencies().map(|_| ())
    }

    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| XoverError::FileReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text).map_err(|e| XoverError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), ?config, "loaded design configuration");
        Ok(config)
    }
}
