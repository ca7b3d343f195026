//! Progressive, multi-tier preview loading for one file.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use glance_core::{File, PeekConfig, PreviewState, QualityTier, ServiceError, Size, UiContext};

use crate::artifact::{Artifact, ArtifactSlot, FileInfo, FileSummary, Publish};
use crate::error::TierError;
use crate::handle::{Bitmap, NativeBitmap};
use crate::kind::PreviewerKind;
use crate::service::PreviewServices;

/// Owns the preview lifecycle of one file.
///
/// `load_preview` runs every tier of the previewer's kind concurrently under
/// one cancellation scope. Each successful tier publishes through the rank
/// guard; the first visible publish moves the state to `Loaded`. `Error` is
/// only reached once every tier has settled and none succeeded.
pub struct Previewer {
    shared: Arc<Shared>,
    tracker: TaskTracker,
    runtime: Handle,
}

/// State shared with the tier tasks.
struct Shared {
    file: File,
    kind: PreviewerKind,
    services: PreviewServices,
    ui: UiContext,
    config: Arc<PeekConfig>,
    cancel: CancellationToken,
    state: watch::Sender<PreviewState>,
    slot: ArtifactSlot,
}

/// What a tier fetched off the UI context, before materialization.
enum Fetched {
    Bitmap(NativeBitmap),
    Icon(NativeBitmap),
    Info(FileInfo),
    Page(u64),
}

impl Previewer {
    pub(crate) fn new(
        file: File,
        kind: PreviewerKind,
        services: PreviewServices,
        ui: UiContext,
        config: Arc<PeekConfig>,
        runtime: Handle,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (state, _) = watch::channel(PreviewState::Uninitialized);
        Self {
            shared: Arc::new(Shared {
                file,
                kind,
                services,
                ui,
                config,
                slot: ArtifactSlot::new(cancel.clone()),
                cancel,
                state,
            }),
            tracker: TaskTracker::new(),
            runtime,
        }
    }

    pub fn file(&self) -> &File {
        &self.shared.file
    }

    pub fn kind(&self) -> PreviewerKind {
        self.shared.kind
    }

    pub fn state(&self) -> PreviewState {
        *self.shared.state.borrow()
    }

    pub fn is_preview_loaded(&self) -> bool {
        self.state() == PreviewState::Loaded
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PreviewState> {
        self.shared.state.subscribe()
    }

    /// Best artifact published so far.
    pub fn current_artifact(&self) -> Option<Artifact> {
        self.shared.slot.get()
    }

    pub fn subscribe_artifact(&self) -> watch::Receiver<Option<Artifact>> {
        self.shared.slot.subscribe()
    }

    /// Size the presentation layer should reserve for this preview.
    ///
    /// Images use format metadata, then a content probe when the metadata
    /// fails or reports an empty size; everything else, and any image whose
    /// size cannot be read, uses the configured fallback.
    /// Never performs a full decode.
    pub async fn preview_size(&self) -> Size {
        let fallback = self.shared.config.fallback_size();
        if !self.shared.kind.has_intrinsic_size() {
            return fallback;
        }

        let thumbnails = Arc::clone(&self.shared.services.thumbnails);
        let path = self.shared.file.path().to_path_buf();
        let measured = tokio::task::spawn_blocking(move || match thumbnails.image_size(&path) {
            Ok(size) if !size.is_empty() => Ok(size),
            _ => thumbnails.probe_size(&path),
        })
        .await;

        match measured {
            Ok(Ok(size)) if !size.is_empty() => size,
            Ok(Ok(_)) => fallback,
            Ok(Err(err)) => {
                tracing::debug!(target: "preview", file = self.shared.file.name(), "size unavailable: {err}");
                fallback
            }
            Err(err) => {
                tracing::warn!(target: "preview", "size probe task failed: {err}");
                fallback
            }
        }
    }

    /// Load the preview and return the state it settled in.
    ///
    /// Only the first call starts loading; later calls return the current
    /// state without waiting. Returns once every tier has settled.
    pub async fn load_preview(&self) -> PreviewState {
        let started = self
            .shared
            .transition_on_ui(PreviewState::Uninitialized, PreviewState::Loading)
            .await;
        if !started {
            return self.state();
        }

        let tiers = self.shared.kind.tiers();
        tracing::debug!(
            target: "preview",
            file = self.shared.file.name(),
            kind = %self.shared.kind,
            tiers = tiers.len(),
            "loading preview"
        );

        let tasks: Vec<_> = tiers
            .iter()
            .map(|&tier| {
                let shared = Arc::clone(&self.shared);
                let task = self
                    .tracker
                    .spawn_on(async move { shared.run_tier(tier).await }, &self.runtime);
                (tier, task)
            })
            .collect();

        let mut succeeded = 0usize;
        for (tier, task) in tasks {
            match task.await {
                Ok(Ok(())) => succeeded += 1,
                Ok(Err(err)) if err.is_cancelled() => {}
                Ok(Err(err)) => {
                    tracing::warn!(target: "preview", file = self.shared.file.name(), %tier, "tier failed: {err}");
                }
                Err(err) => {
                    tracing::warn!(target: "preview", file = self.shared.file.name(), %tier, "tier task failed: {err}");
                }
            }
        }

        if succeeded == 0 && !self.shared.cancel.is_cancelled() {
            self.shared
                .transition_on_ui(PreviewState::Loading, PreviewState::Error)
                .await;
        }

        self.state()
    }

    /// Cancel all in-flight tiers. Idempotent.
    pub fn cancel(&self) {
        self.shared.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Resolves once the previewer is cancelled.
    pub async fn cancelled(&self) {
        self.shared.cancel.cancelled().await;
    }

    /// Cancel and wait until no tier task is running.
    ///
    /// Every native handle acquired by a tier has been released when this
    /// returns.
    pub async fn dispose(&self) {
        self.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        tracing::debug!(target: "preview", file = self.shared.file.name(), "previewer disposed");
    }
}

impl Drop for Previewer {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

impl std::fmt::Debug for Previewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Previewer")
            .field("file", &self.shared.file.path())
            .field("kind", &self.shared.kind)
            .field("state", &self.state())
            .finish()
    }
}

impl Shared {
    /// Move the state from `from` to `to` on the UI context.
    async fn transition_on_ui(self: &Arc<Self>, from: PreviewState, to: PreviewState) -> bool {
        let shared = Arc::clone(self);
        self.ui
            .run(move || shared.transition(from, to))
            .await
            .unwrap_or(false)
    }

    fn transition(&self, from: PreviewState, to: PreviewState) -> bool {
        let mut moved = false;
        self.state.send_if_modified(|state| {
            if *state != from || self.cancel.is_cancelled() {
                return false;
            }
            *state = to;
            moved = true;
            true
        });
        moved
    }

    async fn run_tier(self: Arc<Self>, tier: QualityTier) -> Result<(), TierError> {
        if self.cancel.is_cancelled() {
            return Err(TierError::Cancelled);
        }

        let fetched = self.fetch(tier).await?;

        if self.cancel.is_cancelled() {
            return Err(TierError::Cancelled);
        }

        let shared = Arc::clone(&self);
        let published = self
            .ui
            .run(move || {
                let artifact = shared.materialize(tier, fetched);
                let outcome = shared.slot.publish(artifact);
                if outcome == Publish::Shown {
                    shared.transition(PreviewState::Loading, PreviewState::Loaded);
                }
                outcome
            })
            .await?;

        match published {
            Publish::Cancelled => Err(TierError::Cancelled),
            Publish::Shown => Ok(()),
            Publish::Superseded => {
                tracing::debug!(target: "preview", file = self.file.name(), %tier, "superseded by a higher tier");
                Ok(())
            }
        }
    }

    /// Call the backing service for `tier` on the blocking pool.
    async fn fetch(&self, tier: QualityTier) -> Result<Fetched, TierError> {
        let path = self.file.path().to_path_buf();
        let thumbnails = Arc::clone(&self.services.thumbnails);
        let icons = Arc::clone(&self.services.icons);
        let low = self.config.low_thumbnail_size;
        let high = self.config.high_thumbnail_size;
        let modified = self.file.modified();

        let fetched = tokio::task::spawn_blocking(move || -> Result<Fetched, ServiceError> {
            match tier {
                QualityTier::LowThumbnail => thumbnails.thumbnail(&path, low).map(Fetched::Bitmap),
                QualityTier::HighThumbnail => {
                    thumbnails.thumbnail(&path, high).map(Fetched::Bitmap)
                }
                QualityTier::FullResolution => thumbnails.decode_full(&path).map(Fetched::Bitmap),
                QualityTier::Icon => icons.icon(&path).map(Fetched::Icon),
                QualityTier::FileInfo => {
                    let bytes = icons.file_size_bytes(&path)?;
                    let file_type = icons.file_type(&path)?;
                    Ok(Fetched::Info(FileInfo::new(bytes, file_type, modified)))
                }
                QualityTier::Page => icons.file_size_bytes(&path).map(Fetched::Page),
            }
        })
        .await??;

        Ok(fetched)
    }

    /// Turn fetched data into an artifact. Runs on the UI context.
    fn materialize(&self, tier: QualityTier, fetched: Fetched) -> Artifact {
        match fetched {
            Fetched::Bitmap(native) => Artifact::Image {
                tier,
                bitmap: Bitmap::materialize(native, &self.ui),
            },
            Fetched::Icon(native) => Artifact::Summary(FileSummary {
                icon: Some(Bitmap::materialize(native, &self.ui)),
                info: None,
            }),
            Fetched::Info(info) => Artifact::Summary(FileSummary {
                icon: None,
                info: Some(info),
            }),
            Fetched::Page(size_bytes) => Artifact::Page {
                path: self.file.path().to_path_buf(),
                size_bytes,
            },
        }
    }
}
