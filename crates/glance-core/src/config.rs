//! Preview and indexing configuration.

use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tier::Size;

const DEFAULT_LOW_THUMBNAIL_SIZE: u32 = 256;
const DEFAULT_HIGH_THUMBNAIL_SIZE: u32 = 1024;
const DEFAULT_FALLBACK_WIDTH: u32 = 680;
const DEFAULT_FALLBACK_HEIGHT: u32 = 500;

/// Configuration for indexing and previewing.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct PeekConfig {
    /// Edge length requested for the low quality thumbnail tier.
    #[builder(default = "DEFAULT_LOW_THUMBNAIL_SIZE")]
    #[serde(default = "default_low_thumbnail_size")]
    pub low_thumbnail_size: u32,

    /// Edge length requested for the high quality thumbnail tier.
    #[builder(default = "DEFAULT_HIGH_THUMBNAIL_SIZE")]
    #[serde(default = "default_high_thumbnail_size")]
    pub high_thumbnail_size: u32,

    /// Preview width for previewers with no intrinsic size.
    #[builder(default = "DEFAULT_FALLBACK_WIDTH")]
    #[serde(default = "default_fallback_width")]
    pub fallback_width: u32,

    /// Preview height for previewers with no intrinsic size.
    #[builder(default = "DEFAULT_FALLBACK_HEIGHT")]
    #[serde(default = "default_fallback_height")]
    pub fallback_height: u32,

    /// Include hidden files (starting with .) in folder listings.
    #[builder(default = "false")]
    #[serde(default)]
    pub include_hidden: bool,

    /// Include sub-folders in folder listings.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_directories: bool,
}

fn default_true() -> bool {
    true
}

fn default_low_thumbnail_size() -> u32 {
    DEFAULT_LOW_THUMBNAIL_SIZE
}

fn default_high_thumbnail_size() -> u32 {
    DEFAULT_HIGH_THUMBNAIL_SIZE
}

fn default_fallback_width() -> u32 {
    DEFAULT_FALLBACK_WIDTH
}

fn default_fallback_height() -> u32 {
    DEFAULT_FALLBACK_HEIGHT
}

impl PeekConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let low = self.low_thumbnail_size.unwrap_or(DEFAULT_LOW_THUMBNAIL_SIZE);
        let high = self.high_thumbnail_size.unwrap_or(DEFAULT_HIGH_THUMBNAIL_SIZE);
        check_thumbnail_sizes(low, high)
    }
}

fn check_thumbnail_sizes(low: u32, high: u32) -> Result<(), String> {
    if low == 0 || high == 0 {
        return Err("Thumbnail sizes must be non-zero".to_string());
    }
    if low >= high {
        return Err(format!(
            "Low thumbnail size ({low}) must be smaller than high thumbnail size ({high})"
        ));
    }
    Ok(())
}

impl PeekConfig {
    /// Create a new config builder.
    pub fn builder() -> PeekConfigBuilder {
        PeekConfigBuilder::default()
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        check_thumbnail_sizes(config.low_thumbnail_size, config.high_thumbnail_size)
            .map_err(|message| ConfigError::Invalid { message })?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Size used by previewers that cannot measure their content.
    pub fn fallback_size(&self) -> Size {
        Size::new(self.fallback_width, self.fallback_height)
    }
}

impl Default for PeekConfig {
    fn default() -> Self {
        Self {
            low_thumbnail_size: DEFAULT_LOW_THUMBNAIL_SIZE,
            high_thumbnail_size: DEFAULT_HIGH_THUMBNAIL_SIZE,
            fallback_width: DEFAULT_FALLBACK_WIDTH,
            fallback_height: DEFAULT_FALLBACK_HEIGHT,
            include_hidden: false,
            include_directories: true,
        }
    }
}
