//! Shell enumeration boundary and its filesystem implementation.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use jwalk::{Parallelism, WalkDir};

use glance_core::{File, PeekConfig, ServiceError};

/// One entry reported by the shell for a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellItem {
    /// Display name.
    pub name: String,
    /// Full path.
    pub path: PathBuf,
    /// Size in bytes (0 for folders).
    pub size: u64,
    /// Last modification time.
    pub modified: Option<DateTime<Utc>>,
    /// Whether the entry is a folder.
    pub is_dir: bool,
}

impl ShellItem {
    /// Convert into the immutable file value used by previewers.
    pub fn into_file(self) -> File {
        File::new(self.path, self.size, self.modified, self.is_dir)
    }
}

/// Folder enumeration provided by the platform shell.
///
/// Calls may be slow for large folders and must only be made off the
/// interaction thread.
pub trait ShellService: Send + Sync {
    /// All items of `folder`, in the shell's display order.
    fn list_items(&self, folder: &Path) -> Result<Vec<ShellItem>, ServiceError>;

    /// Items currently selected in `folder`.
    fn selected_items(&self, folder: &Path) -> Result<Vec<ShellItem>, ServiceError>;

    /// Describe a single path.
    fn describe(&self, path: &Path) -> Result<ShellItem, ServiceError>;
}

/// Filesystem-backed shell: lists a folder one level deep, sorted by name.
///
/// The "selection" is whatever paths were supplied with
/// [`FsShell::with_selection`].
#[derive(Debug, Clone)]
pub struct FsShell {
    include_hidden: bool,
    include_directories: bool,
    selection: Vec<PathBuf>,
}

impl FsShell {
    /// Create a shell that lists non-hidden files and folders.
    pub fn new() -> Self {
        Self {
            include_hidden: false,
            include_directories: true,
            selection: Vec::new(),
        }
    }

    /// Create a shell honoring the listing options of `config`.
    pub fn from_config(config: &PeekConfig) -> Self {
        Self {
            include_hidden: config.include_hidden,
            include_directories: config.include_directories,
            selection: Vec::new(),
        }
    }

    /// Treat `paths` as the user's current selection.
    pub fn with_selection(mut self, paths: Vec<PathBuf>) -> Self {
        self.selection = paths;
        self
    }
}

impl Default for FsShell {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellService for FsShell {
    fn list_items(&self, folder: &Path) -> Result<Vec<ShellItem>, ServiceError> {
        let metadata = std::fs::metadata(folder).map_err(|e| ServiceError::io(folder, e))?;
        if !metadata.is_dir() {
            return Err(ServiceError::Other {
                message: format!("Not a directory: {}", folder.display()),
            });
        }

        let walker = WalkDir::new(folder)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true)
            .min_depth(1)
            .max_depth(1);

        let mut items = Vec::new();
        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!(target: "index", "skipping unreadable entry: {err}");
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().to_string();
            if !self.include_hidden && name.starts_with('.') {
                continue;
            }

            let is_dir = entry.file_type().is_dir();
            if is_dir && !self.include_directories {
                continue;
            }

            let path = entry.path();
            let (size, modified) = match entry.metadata() {
                Ok(m) => (
                    if is_dir { 0 } else { m.len() },
                    m.modified().ok().map(DateTime::<Utc>::from),
                ),
                Err(_) => (0, None),
            };

            items.push(ShellItem {
                name,
                path,
                size,
                modified,
                is_dir,
            });
        }

        Ok(items)
    }

    fn selected_items(&self, folder: &Path) -> Result<Vec<ShellItem>, ServiceError> {
        self.selection
            .iter()
            .filter(|p| p.parent() == Some(folder))
            .map(|p| self.describe(p))
            .collect()
    }

    fn describe(&self, path: &Path) -> Result<ShellItem, ServiceError> {
        let metadata = std::fs::metadata(path).map_err(|e| ServiceError::io(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(ShellItem {
            name,
            path: path.to_path_buf(),
            size: if metadata.is_dir() { 0 } else { metadata.len() },
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            is_dir: metadata.is_dir(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.png"), b"bb").unwrap();
        fs::write(temp_dir.path().join("a.png"), b"a").unwrap();
        fs::write(temp_dir.path().join(".hidden"), b"h").unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        temp_dir
    }

    #[test]
    fn test_list_items_sorted_and_filtered() {
        let temp_dir = fixture();
        let items = FsShell::new().list_items(temp_dir.path()).unwrap();
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();

        assert_eq!(names, vec!["a.png", "b.png", "sub"]);
        assert_eq!(items[1].size, 2);
        assert!(items[2].is_dir);
    }

    #[test]
    fn test_list_items_options() {
        let temp_dir = fixture();
        let config = PeekConfig {
            include_hidden: true,
            include_directories: false,
            ..PeekConfig::default()
        };
        let items = FsShell::from_config(&config)
            .list_items(temp_dir.path())
            .unwrap();
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();

        assert_eq!(names, vec![".hidden", "a.png", "b.png"]);
    }

    #[test]
    fn test_list_missing_folder() {
        let temp_dir = TempDir::new().unwrap();
        let err = FsShell::new()
            .list_items(&temp_dir.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[test]
    fn test_selected_items_scoped_to_folder() {
        let temp_dir = fixture();
        let shell = FsShell::new().with_selection(vec![
            temp_dir.path().join("a.png"),
            PathBuf::from("/elsewhere/x.png"),
        ]);
        let selected = shell.selected_items(temp_dir.path()).unwrap();

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "a.png");
    }

    #[test]
    fn test_describe_into_file() {
        let temp_dir = fixture();
        let file = FsShell::new()
            .describe(&temp_dir.path().join("b.png"))
            .unwrap()
            .into_file();

        assert_eq!(file.name(), "b.png");
        assert_eq!(file.extension(), "png");
        assert_eq!(file.size(), 2);
        assert!(file.modified().is_some());
    }
}
