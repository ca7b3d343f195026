//! Quality tiers, preview states and sizes.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Pixel dimensions of a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    /// Create a new size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Check if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// One quality level a previewer may attempt.
///
/// Tiers are attempted concurrently; [`QualityTier::rank`] decides which
/// published artifact wins when several succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum QualityTier {
    /// Shell icon for the file type.
    #[strum(to_string = "icon")]
    Icon,
    /// Size, type and modification time.
    #[strum(to_string = "file info")]
    FileInfo,
    /// Small shell thumbnail.
    #[strum(to_string = "low thumbnail")]
    LowThumbnail,
    /// Large shell thumbnail.
    #[strum(to_string = "high thumbnail")]
    HighThumbnail,
    /// Full decode of the source image.
    #[strum(to_string = "full resolution")]
    FullResolution,
    /// The document itself, handed to an embedded page renderer.
    #[strum(to_string = "page")]
    Page,
}

impl QualityTier {
    /// Total order used by the race guard. Higher wins.
    pub fn rank(self) -> u8 {
        match self {
            Self::Icon | Self::FileInfo => 0,
            Self::LowThumbnail => 1,
            Self::HighThumbnail => 2,
            Self::FullResolution | Self::Page => 3,
        }
    }
}

/// Lifecycle of one previewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
pub enum PreviewState {
    #[default]
    Uninitialized,
    Loading,
    Loaded,
    Error,
}

impl PreviewState {
    /// `Loaded` and `Error` are never left once reached.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Loaded | Self::Error)
    }
}
