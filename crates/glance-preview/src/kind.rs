//! Previewer kinds and the extensions they claim.

use strum::{Display, EnumIter};

use glance_core::QualityTier;

/// Image formats the thumbnail service can render, camera RAW included.
const IMAGE_EXTENSIONS: &[&str] = &[
    "bmp", "gif", "jpg", "jfif", "jfi", "jif", "jpeg", "jpe", "png", "tif", "tiff", "dib", "heic",
    "heif", "hif", "avif", "jxr", "wdp", "ico", "thumb", "webp",
    // RAW
    "arw", "cr2", "crw", "erf", "kdc", "mrw", "nef", "nrw", "orf", "pef", "raf", "raw", "rw2",
    "rwl", "sr2", "srw", "srf", "dcs", "dcr", "drf", "k25", "3fr", "ari", "bay", "cap", "iiq",
    "eip", "fff", "mef", "mos", "r3d", "rwz", "x3f", "ori", "cr3",
];

/// Formats decoded directly, ahead of the general image previewer.
const PNG_EXTENSIONS: &[&str] = &["png"];

/// Office and text documents with shell thumbnails.
const DOCUMENT_EXTENSIONS: &[&str] = &[
    "doc", "docx", "odt", "rtf", "xls", "xlsx", "ods", "ppt", "pptx", "odp", "txt", "md",
];

/// Formats an embedded page renderer can display.
const WEB_EXTENSIONS: &[&str] = &["html", "htm", "xhtml", "svg", "pdf"];

/// The closed set of previewers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum PreviewerKind {
    #[strum(to_string = "png")]
    Png,
    #[strum(to_string = "image")]
    Image,
    #[strum(to_string = "document")]
    Document,
    #[strum(to_string = "web")]
    Web,
    #[strum(to_string = "unsupported")]
    Unsupported,
}

impl PreviewerKind {
    /// Kinds in dispatch priority order. The first one claiming an extension
    /// wins, so `Png` pre-empts `Image` for `.png`.
    const PRIORITY: [PreviewerKind; 4] = [Self::Png, Self::Image, Self::Document, Self::Web];

    /// Pick the kind for a lowercase extension. Falls back to
    /// [`PreviewerKind::Unsupported`].
    pub fn for_extension(extension: &str) -> Self {
        Self::PRIORITY
            .into_iter()
            .find(|kind| kind.supports(extension))
            .unwrap_or(Self::Unsupported)
    }

    /// Check if this kind claims `extension` (case-insensitive, no dot).
    pub fn supports(self, extension: &str) -> bool {
        let set = match self {
            Self::Png => PNG_EXTENSIONS,
            Self::Image => IMAGE_EXTENSIONS,
            Self::Document => DOCUMENT_EXTENSIONS,
            Self::Web => WEB_EXTENSIONS,
            Self::Unsupported => return false,
        };
        set.iter().any(|e| e.eq_ignore_ascii_case(extension))
    }

    /// Tiers attempted concurrently when loading a preview.
    pub fn tiers(self) -> &'static [QualityTier] {
        match self {
            Self::Png => &[QualityTier::LowThumbnail, QualityTier::FullResolution],
            Self::Image => &[
                QualityTier::LowThumbnail,
                QualityTier::HighThumbnail,
                QualityTier::FullResolution,
            ],
            Self::Document => &[
                QualityTier::FileInfo,
                QualityTier::LowThumbnail,
                QualityTier::HighThumbnail,
            ],
            Self::Web => &[QualityTier::LowThumbnail, QualityTier::Page],
            Self::Unsupported => &[QualityTier::Icon, QualityTier::FileInfo],
        }
    }

    /// Whether the preview size comes from the image itself.
    pub fn has_intrinsic_size(self) -> bool {
        matches!(self, Self::Png | Self::Image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_dispatch() {
        assert_eq!(PreviewerKind::for_extension("png"), PreviewerKind::Png);
        assert_eq!(PreviewerKind::for_extension("PNG"), PreviewerKind::Png);
        assert_eq!(PreviewerKind::for_extension("heic"), PreviewerKind::Image);
        assert_eq!(PreviewerKind::for_extension("CR3"), PreviewerKind::Image);
        assert_eq!(PreviewerKind::for_extension("docx"), PreviewerKind::Document);
        assert_eq!(PreviewerKind::for_extension("html"), PreviewerKind::Web);
        assert_eq!(PreviewerKind::for_extension("xyz"), PreviewerKind::Unsupported);
        assert_eq!(PreviewerKind::for_extension(""), PreviewerKind::Unsupported);
    }

    #[test]
    fn test_png_preempts_image() {
        assert!(PreviewerKind::Image.supports("png"));
        assert!(PreviewerKind::Png.supports("png"));
        assert_eq!(PreviewerKind::for_extension("png"), PreviewerKind::Png);
    }

    #[test]
    fn test_only_png_is_claimed_twice() {
        for ext in IMAGE_EXTENSIONS.iter().chain(DOCUMENT_EXTENSIONS).chain(WEB_EXTENSIONS) {
            let claimed = PreviewerKind::iter().filter(|k| k.supports(ext)).count();
            let expected = if *ext == "png" { 2 } else { 1 };
            assert_eq!(claimed, expected, "{ext} claimed by {claimed} kinds");
        }
    }

    #[test]
    fn test_every_kind_has_tiers() {
        for kind in PreviewerKind::iter() {
            assert!(!kind.tiers().is_empty(), "{kind} has no tiers");
        }
        assert_eq!(PreviewerKind::Image.tiers().len(), 3);
        assert_eq!(PreviewerKind::Png.tiers().len(), 2);
    }
}
