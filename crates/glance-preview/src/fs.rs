//! Filesystem implementations of the preview services, backed by `image`.

use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageError, ImageReader};

use glance_core::{ServiceError, Size};

use crate::handle::{HandleLedger, NativeBitmap};
use crate::service::{IconService, ThumbnailService};

/// Edge length of generated icons.
const ICON_EDGE: u32 = 32;

/// Thumbnails and decodes via the `image` crate.
#[derive(Debug, Clone)]
pub struct FsThumbnails {
    ledger: Arc<HandleLedger>,
}

impl FsThumbnails {
    pub fn new(ledger: Arc<HandleLedger>) -> Self {
        Self { ledger }
    }

    fn acquire(&self, image: DynamicImage) -> NativeBitmap {
        let rgba = image.to_rgba8();
        let size = Size::new(rgba.width(), rgba.height());
        self.ledger.acquire(size, rgba.into_raw())
    }
}

impl ThumbnailService for FsThumbnails {
    fn thumbnail(&self, path: &Path, edge: u32) -> Result<NativeBitmap, ServiceError> {
        let image = image::open(path).map_err(|e| image_error(path, e))?;
        Ok(self.acquire(image.thumbnail(edge, edge)))
    }

    fn decode_full(&self, path: &Path) -> Result<NativeBitmap, ServiceError> {
        let image = image::open(path).map_err(|e| image_error(path, e))?;
        Ok(self.acquire(image))
    }

    fn image_size(&self, path: &Path) -> Result<Size, ServiceError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| image_error(path, e))?;
        Ok(Size::new(width, height))
    }

    fn probe_size(&self, path: &Path) -> Result<Size, ServiceError> {
        let reader = ImageReader::open(path)
            .map_err(|e| ServiceError::io(path, e))?
            .with_guessed_format()
            .map_err(|e| ServiceError::io(path, e))?;
        let (width, height) = reader.into_dimensions().map_err(|e| image_error(path, e))?;
        Ok(Size::new(width, height))
    }
}

/// Generated flat icons and `std::fs` metadata.
#[derive(Debug, Clone)]
pub struct FsIcons {
    ledger: Arc<HandleLedger>,
}

impl FsIcons {
    pub fn new(ledger: Arc<HandleLedger>) -> Self {
        Self { ledger }
    }
}

impl IconService for FsIcons {
    fn icon(&self, path: &Path) -> Result<NativeBitmap, ServiceError> {
        let metadata = std::fs::metadata(path).map_err(|e| ServiceError::io(path, e))?;
        let color = if metadata.is_dir() {
            [0xE8, 0xB8, 0x4A, 0xFF]
        } else {
            extension_color(path)
        };

        let pixels = color.repeat((ICON_EDGE * ICON_EDGE) as usize);
        Ok(self
            .ledger
            .acquire(Size::new(ICON_EDGE, ICON_EDGE), pixels))
    }

    fn file_size_bytes(&self, path: &Path) -> Result<u64, ServiceError> {
        let metadata = std::fs::metadata(path).map_err(|e| ServiceError::io(path, e))?;
        Ok(if metadata.is_dir() { 0 } else { metadata.len() })
    }

    fn file_type(&self, path: &Path) -> Result<String, ServiceError> {
        let metadata = std::fs::symlink_metadata(path).map_err(|e| ServiceError::io(path, e))?;
        let file_type = if metadata.is_file() {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| format!("File (.{})", e.to_lowercase()))
                .unwrap_or_else(|| "File".to_string())
        } else if metadata.is_dir() {
            "Directory".to_string()
        } else if metadata.is_symlink() {
            "Symbolic Link".to_string()
        } else {
            "Other".to_string()
        };
        Ok(file_type)
    }
}

/// Stable per-extension tint so different types are distinguishable.
fn extension_color(path: &Path) -> [u8; 4] {
    let seed = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
        .bytes()
        .fold(0x811C_9DC5u32, |hash, b| (hash ^ b as u32).wrapping_mul(0x0100_0193));
    let [r, g, b, _] = seed.to_le_bytes();
    [r | 0x40, g | 0x40, b | 0x40, 0xFF]
}

fn image_error(path: &Path, err: ImageError) -> ServiceError {
    match err {
        ImageError::IoError(e) => ServiceError::io(path, e),
        ImageError::Unsupported(_) => ServiceError::Unsupported {
            path: path.to_path_buf(),
        },
        other => ServiceError::Other {
            message: format!("{}: {other}", path.display()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_png(dir: &TempDir, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.path().join(name);
        RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    #[test]
    fn test_thumbnail_fits_edge() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_png(&temp_dir, "wide.png", 400, 200);
        let ledger = HandleLedger::new();
        let thumbnails = FsThumbnails::new(Arc::clone(&ledger));

        let thumb = thumbnails.thumbnail(&path, 100).unwrap();
        assert_eq!(thumb.size(), Size::new(100, 50));
        assert_eq!(thumb.pixels().len(), 100 * 50 * 4);
        assert_eq!(ledger.outstanding(), 1);

        drop(thumb);
        assert_eq!(ledger.outstanding(), 0);
    }

    #[test]
    fn test_sizes() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_png(&temp_dir, "a.png", 7, 3);
        let thumbnails = FsThumbnails::new(HandleLedger::new());

        assert_eq!(thumbnails.image_size(&path).unwrap(), Size::new(7, 3));
        assert_eq!(thumbnails.probe_size(&path).unwrap(), Size::new(7, 3));

        let disguised = temp_dir.path().join("a.bin");
        std::fs::copy(&path, &disguised).unwrap();
        assert_eq!(thumbnails.probe_size(&disguised).unwrap(), Size::new(7, 3));
    }

    #[test]
    fn test_corrupt_image_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("corrupt.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        let thumbnails = FsThumbnails::new(HandleLedger::new());

        assert!(thumbnails.thumbnail(&path, 64).is_err());
        assert!(thumbnails.decode_full(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let icons = FsIcons::new(HandleLedger::new());
        let err = icons.icon(&temp_dir.path().join("gone.xyz")).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[test]
    fn test_icon_and_properties() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("file.XYZ");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();
        let ledger = HandleLedger::new();
        let icons = FsIcons::new(Arc::clone(&ledger));

        let icon = icons.icon(&path).unwrap();
        assert_eq!(icon.size(), Size::new(ICON_EDGE, ICON_EDGE));
        assert_eq!(icons.file_size_bytes(&path).unwrap(), 2048);
        assert_eq!(icons.file_type(&path).unwrap(), "File (.xyz)");
        assert_eq!(icons.file_type(temp_dir.path()).unwrap(), "Directory");

        drop(icon);
        assert_eq!(ledger.outstanding(), 0);
    }
}
