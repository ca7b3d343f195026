//! Boundaries to the thumbnail, decode and icon services.

use std::path::Path;
use std::sync::Arc;

use glance_core::{ServiceError, Size};

use crate::fs::{FsIcons, FsThumbnails};
use crate::handle::{HandleLedger, NativeBitmap};

/// Thumbnail extraction and full decoding.
///
/// Calls block and must run off the UI context. Returned bitmaps are owned
/// by the caller and released on drop.
pub trait ThumbnailService: Send + Sync {
    /// Thumbnail fitting in an `edge` x `edge` box.
    fn thumbnail(&self, path: &Path, edge: u32) -> Result<NativeBitmap, ServiceError>;

    /// Full resolution decode.
    fn decode_full(&self, path: &Path) -> Result<NativeBitmap, ServiceError>;

    /// Pixel size from format metadata, without decoding.
    fn image_size(&self, path: &Path) -> Result<Size, ServiceError>;

    /// Pixel size by sniffing the content when the extension is misleading.
    fn probe_size(&self, path: &Path) -> Result<Size, ServiceError>;
}

/// Shell icons and file properties.
pub trait IconService: Send + Sync {
    fn icon(&self, path: &Path) -> Result<NativeBitmap, ServiceError>;

    fn file_size_bytes(&self, path: &Path) -> Result<u64, ServiceError>;

    /// Human-readable type, e.g. `File (.png)`.
    fn file_type(&self, path: &Path) -> Result<String, ServiceError>;
}

/// The services previewers draw on.
#[derive(Clone)]
pub struct PreviewServices {
    pub thumbnails: Arc<dyn ThumbnailService>,
    pub icons: Arc<dyn IconService>,
}

impl PreviewServices {
    pub fn new(thumbnails: Arc<dyn ThumbnailService>, icons: Arc<dyn IconService>) -> Self {
        Self { thumbnails, icons }
    }

    /// Filesystem-backed services allocating handles from `ledger`.
    pub fn filesystem(ledger: Arc<HandleLedger>) -> Self {
        Self {
            thumbnails: Arc::new(FsThumbnails::new(Arc::clone(&ledger))),
            icons: Arc::new(FsIcons::new(ledger)),
        }
    }
}

impl std::fmt::Debug for PreviewServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewServices").finish_non_exhaustive()
    }
}
