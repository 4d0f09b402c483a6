//! Runtime configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration.
//!
//! ```toml
//! data_dir = ".folio"
//!
//! [pagination]
//! chars_per_page = 5000
//! title_max_chars = 100
//!
//! [search]
//! min_term_chars = 2
//! snippet_radius = 80
//!
//! [highlight]
//! min_term_chars = 2
//! marker_class = "folio-highlight"
//! scroll_offset_px = 100
//! pulse_ms = 3000
//! debounce_ms = 300
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the page database.
    pub data_dir: PathBuf,
    pub pagination: PaginationConfig,
    pub search: SearchConfig,
    pub highlight: HighlightConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".folio"),
            pagination: PaginationConfig::default(),
            search: SearchConfig::default(),
            highlight: HighlightConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub chars_per_page: usize,
    pub title_max_chars: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            chars_per_page: 5000,
            title_max_chars: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub min_term_chars: usize,
    pub snippet_radius: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_term_chars: 2,
            snippet_radius: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub min_term_chars: usize,
    pub marker_class: String,
    pub scroll_offset_px: u32,
    pub pulse_ms: u64,
    /// Delay between the last keystroke and the auto-search.
    pub debounce_ms: u64,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            min_term_chars: 2,
            marker_class: "folio-highlight".to_string(),
            scroll_offset_px: 100,
            pulse_ms: 3000,
            debounce_ms: 300,
        }
    }
}

impl Config {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&content).map_err(|e| match e {
            Error::Config(message) => Error::Config(format!("{}: {message}", path.display())),
            other => other,
        })
    }

    /// Parse from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.pagination.chars_per_page == 0 {
            return Err(Error::Config("pagination.chars_per_page must be positive".into()));
        }
        if self.highlight.marker_class.split_whitespace().count() != 1 {
            return Err(Error::Config(
                "highlight.marker_class must be a single class name".into(),
            ));
        }
        Ok(())
    }
}
