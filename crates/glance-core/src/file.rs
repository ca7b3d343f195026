//! The file value type.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A file (or folder) as presented to previewers and the UI.
///
/// Immutable once constructed. The extension is stored lowercase and without
/// the leading dot so that previewer dispatch is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    path: PathBuf,
    name: CompactString,
    extension: CompactString,
    size: u64,
    modified: Option<DateTime<Utc>>,
    is_dir: bool,
}

impl File {
    /// Create a file value from shell-provided attributes.
    pub fn new(
        path: impl Into<PathBuf>,
        size: u64,
        modified: Option<DateTime<Utc>>,
        is_dir: bool,
    ) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| CompactString::from(n.to_string_lossy()))
            .unwrap_or_else(|| CompactString::from(path.to_string_lossy()));
        let extension = if is_dir {
            CompactString::default()
        } else {
            path.extension()
                .map(|e| CompactString::from(e.to_string_lossy().to_lowercase()))
                .unwrap_or_default()
        };

        Self {
            path,
            name,
            extension,
            size,
            modified,
            is_dir,
        }
    }

    /// Create a file with no size or timestamp information.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(path, 0, None, false)
    }

    /// Full path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display name (last path component).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowercase extension without the dot, empty if none.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Size in bytes as reported when the file was listed.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Last modification time, if the shell reported one.
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    /// Whether this entry is a folder.
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Folder containing this file.
    pub fn folder(&self) -> Option<&Path> {
        self.path.parent()
    }
}
