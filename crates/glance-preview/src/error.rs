//! Tier failure type.

use glance_core::{ServiceError, UiClosed};
use thiserror::Error;

/// Why a single quality tier did not produce an artifact.
///
/// Never surfaced to observers; the previewer folds these into its terminal
/// state.
#[derive(Debug, Error)]
pub enum TierError {
    /// The backing service failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The previewer was cancelled before the tier could publish.
    #[error("Tier cancelled")]
    Cancelled,

    /// The UI context shut down.
    #[error(transparent)]
    UiClosed(#[from] UiClosed),

    /// The blocking service call panicked or was aborted.
    #[error("Tier task failed: {message}")]
    TaskFailed { message: String },
}

impl TierError {
    /// Whether this failure is a cancellation rather than a real error.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<tokio::task::JoinError> for TierError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskFailed {
            message: err.to_string(),
        }
    }
}
