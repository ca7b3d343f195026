//! Folder indexing and navigation for glance.
//!
//! # Overview
//!
//! `glance-index` turns a single selected file into a navigable folder:
//!
//! - **Background enumeration** of the containing folder through a
//!   [`ShellService`], off the interaction thread
//! - **Cancellable re-indexing**: at most one indexing operation is active,
//!   and cancelling one never disturbs the previously published index
//! - **Wraparound navigation** over the published, immutable snapshot
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use glance_core::{File, UiContext};
//! use glance_index::{FolderIndex, FsShell};
//!
//! # async fn demo() -> std::io::Result<()> {
//! let ui = UiContext::spawn()?;
//! let index = FolderIndex::new(Arc::new(FsShell::new()), ui);
//!
//! let anchor = File::from_path("/photos/b.png");
//! let handle = index.begin("/photos".into(), anchor);
//! let outcome = handle.wait().await;
//! println!("{outcome:?}");
//!
//! if let Some(step) = index.step_by(1) {
//!     println!("next: {} at {}", step.file.name(), step.index);
//! }
//! # Ok(())
//! # }
//! ```

mod cursor;
mod folder;
mod shell;

pub use cursor::{NavigationCursor, wrap_index};
pub use folder::{FolderIndex, IndexHandle, IndexOutcome, PositionHandle, Step};
pub use shell::{FsShell, ShellItem, ShellService};

// Re-export core types for convenience
pub use glance_core::{File, ServiceError};
