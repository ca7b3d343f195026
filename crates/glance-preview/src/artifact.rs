//! Preview artifacts and the rank-guarded slot they are published into.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use glance_core::QualityTier;

use crate::handle::Bitmap;

/// Human-readable properties of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub size_bytes: u64,
    /// Size formatted with binary units, e.g. `1.50 KiB`.
    pub size_display: String,
    pub file_type: String,
    pub modified: Option<DateTime<Utc>>,
}

impl FileInfo {
    pub fn new(size_bytes: u64, file_type: String, modified: Option<DateTime<Utc>>) -> Self {
        Self {
            size_bytes,
            size_display: humansize::format_size(size_bytes, humansize::BINARY),
            file_type,
            modified,
        }
    }
}

/// Icon and file info shown for files without a richer preview.
///
/// Either half may be missing when its tier failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub icon: Option<Bitmap>,
    pub info: Option<FileInfo>,
}

impl FileSummary {
    fn merge(&mut self, incoming: FileSummary) {
        if incoming.icon.is_some() {
            self.icon = incoming.icon;
        }
        if incoming.info.is_some() {
            self.info = incoming.info;
        }
    }
}

/// The best preview published so far for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// A thumbnail or decoded image.
    Image { tier: QualityTier, bitmap: Bitmap },
    /// Icon and/or file info.
    Summary(FileSummary),
    /// A document handed to the embedded page renderer.
    Page { path: PathBuf, size_bytes: u64 },
}

impl Artifact {
    /// Rank used by the race guard.
    pub fn rank(&self) -> u8 {
        self.tier().rank()
    }

    /// Tier that produced this artifact. Summaries report the icon tier when
    /// they carry an icon, the file info tier otherwise.
    pub fn tier(&self) -> QualityTier {
        match self {
            Self::Image { tier, .. } => *tier,
            Self::Summary(summary) if summary.icon.is_some() => QualityTier::Icon,
            Self::Summary(_) => QualityTier::FileInfo,
            Self::Page { .. } => QualityTier::Page,
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image { tier, bitmap } => {
                let size = bitmap.size();
                write!(f, "{tier} ({}x{})", size.width, size.height)
            }
            Self::Summary(summary) => {
                let icon = if summary.icon.is_some() { "icon" } else { "no icon" };
                match &summary.info {
                    Some(info) => write!(f, "{icon}, {} ({})", info.file_type, info.size_display),
                    None => write!(f, "{icon}, no file info"),
                }
            }
            Self::Page { path, .. } => write!(f, "page {}", path.display()),
        }
    }
}

/// Result of one publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publish {
    /// The artifact is now visible.
    Shown,
    /// A higher-ranked artifact was already visible; nothing changed.
    Superseded,
    /// The owning previewer was cancelled; nothing changed.
    Cancelled,
}

/// Observable slot holding the best artifact published so far.
///
/// The visible rank never decreases. Equal ranks replace each other, except
/// summaries, which merge.
#[derive(Debug)]
pub struct ArtifactSlot {
    current: watch::Sender<Option<Artifact>>,
    cancel: CancellationToken,
}

impl ArtifactSlot {
    pub fn new(cancel: CancellationToken) -> Self {
        let (current, _) = watch::channel(None);
        Self { current, cancel }
    }

    /// Publish `artifact` unless a higher-ranked one is already visible.
    ///
    /// The cancellation check, the rank comparison and the write all happen
    /// while the slot is locked.
    pub fn publish(&self, artifact: Artifact) -> Publish {
        let mut outcome = Publish::Cancelled;
        self.current.send_if_modified(|current| {
            if self.cancel.is_cancelled() {
                return false;
            }
            let artifact = match (current.as_mut(), artifact) {
                (Some(existing), incoming) if existing.rank() > incoming.rank() => {
                    outcome = Publish::Superseded;
                    return false;
                }
                (Some(Artifact::Summary(existing)), Artifact::Summary(incoming)) => {
                    existing.merge(incoming);
                    outcome = Publish::Shown;
                    return true;
                }
                (_, incoming) => incoming,
            };
            *current = Some(artifact);
            outcome = Publish::Shown;
            true
        });
        outcome
    }

    pub fn get(&self) -> Option<Artifact> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Artifact>> {
        self.current.subscribe()
    }
}
