//! Navigation session for glance.
//!
//! [`PeekSession`] exposes what a presentation layer observes:
//!
//! - the current file and its position in the folder
//! - the preview state and the best artifact of the current file
//!
//! plus [`PeekSession::navigate`] and [`PeekSession::clear`]. All observable
//! updates are applied on the [`UiContext`](glance_core::UiContext).

mod session;

pub use session::PeekSession;

// Re-export the types observers deal with
pub use glance_core::{File, PeekConfig, PreviewState};
pub use glance_index::{FsShell, IndexOutcome, ShellService};
pub use glance_preview::{Artifact, HandleLedger, PreviewServices};
