//! Wraparound navigation over a published folder snapshot.

use std::sync::Arc;

use glance_core::File;

/// Compute `(current + delta) mod len`, normalized into `[0, len)`.
///
/// `len` must be non-zero.
pub fn wrap_index(current: usize, delta: isize, len: usize) -> usize {
    let len_wide = len as i128;
    let desired = (current as i128 + delta as i128) % len_wide;
    let wrapped = if desired < 0 {
        len_wide + desired
    } else {
        desired
    };

    if wrapped < 0 || wrapped >= len_wide {
        debug_assert!(false, "out of bounds folder item index: {wrapped} (len {len})");
        return 0;
    }

    wrapped as usize
}

/// Current position within an immutable folder snapshot.
///
/// The file list and the index are replaced together; the list itself is
/// never mutated after construction.
#[derive(Debug, Clone, Default)]
pub struct NavigationCursor {
    files: Arc<[File]>,
    index: Option<usize>,
}

impl NavigationCursor {
    /// Create a cursor positioned at `index` within `files`.
    pub fn new(files: Vec<File>, index: usize) -> Self {
        let index = if index < files.len() {
            Some(index)
        } else {
            debug_assert!(false, "cursor index {index} out of range");
            None
        };
        Self {
            files: files.into(),
            index,
        }
    }

    /// All files in the snapshot.
    pub fn files(&self) -> &[File] {
        &self.files
    }

    /// Number of files in the snapshot.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Current index, `None` while uninitialized.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// File at the current index.
    pub fn current_file(&self) -> Option<&File> {
        self.index.and_then(|i| self.files.get(i))
    }

    /// Whether stepping would move to a different file.
    pub fn can_navigate(&self) -> bool {
        self.index.is_some() && self.files.len() > 1
    }

    /// Move by `delta` with wraparound and return the new current file.
    ///
    /// Returns `None` without moving when the cursor is uninitialized or the
    /// folder has at most one item.
    pub fn step_by(&mut self, delta: isize) -> Option<File> {
        if !self.can_navigate() {
            return None;
        }
        let current = self.index?;
        let next = wrap_index(current, delta, self.files.len());
        self.index = Some(next);
        self.files.get(next).cloned()
    }
}
