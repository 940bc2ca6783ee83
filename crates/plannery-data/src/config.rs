//! Planner configuration file.
//!
//! `plannery.{toml,ron,json}` holds the default catalog location, display
//! options and the log filter. Every field has a default, and a missing file
//! is the same as an empty one.

use std::path::{Path, PathBuf};

use plannery_core::format::{FractionFormat, NumberLocale};
use serde::Deserialize;

use crate::loader::{DataLoadError, deserialize_file, find_data_file};

/// Base name of the configuration file.
pub const CONFIG_BASE_NAME: &str = "plannery";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Catalog file or directory used when none is given on the command line.
    pub catalog: Option<PathBuf>,
    pub display: DisplayConfig,
    pub locale: NumberLocale,
    /// `tracing-subscriber` env-filter directive.
    pub log_filter: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            display: DisplayConfig::default(),
            locale: NumberLocale::default(),
            log_filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub decimal: bool,
    pub always_show_sign: bool,
    pub significant_digits: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            decimal: false,
            always_show_sign: false,
            significant_digits: 4,
        }
    }
}

impl PlannerConfig {
    /// Load a config file. A path that does not exist yields the defaults;
    /// a file that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self, DataLoadError> {
        if !path.exists() {
            tracing::debug!(file = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        deserialize_file(path)
    }

    /// Look for `plannery.{ron,toml,json}` in `dir`.
    pub fn discover(dir: &Path) -> Result<Self, DataLoadError> {
        match find_data_file(dir, CONFIG_BASE_NAME)? {
            Some(path) => deserialize_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn fraction_format(&self) -> FractionFormat {
        FractionFormat {
            always_show_sign: self.display.always_show_sign,
            use_decimal_format: self.display.decimal,
            significant_digits: self.display.significant_digits,
            locale: self.locale.clone(),
        }
    }
}
