//! Background folder indexing.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use glance_core::{File, ServiceError, UiContext};

use crate::cursor::NavigationCursor;
use crate::shell::ShellService;

/// How an indexing operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    /// A new snapshot was published with the anchor at `anchor`.
    Published { len: usize, anchor: usize },
    /// The anchor file was not in the listing; navigation stays disabled.
    AnchorMissing,
    /// The operation was cancelled before publishing.
    Cancelled,
    /// The shell could not enumerate the folder; navigation stays disabled.
    Failed { message: String },
}

/// A successful navigation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub file: File,
    pub index: usize,
}

/// Write side of the observable cursor position.
///
/// Only ever used on the UI context.
#[derive(Debug, Clone)]
pub struct PositionHandle(Arc<watch::Sender<Option<usize>>>);

impl PositionHandle {
    pub fn set(&self, position: Option<usize>) {
        self.0.send_replace(position);
    }
}

/// Handle to one indexing operation.
#[derive(Debug, Clone)]
pub struct IndexHandle {
    cancel: CancellationToken,
    outcome: watch::Receiver<Option<IndexOutcome>>,
}

impl IndexHandle {
    /// Request cancellation. Calling this more than once has no further effect.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Check if the operation has ended.
    pub fn is_finished(&self) -> bool {
        self.outcome.borrow().is_some()
    }

    /// Wait for the operation to end.
    pub async fn wait(&self) -> IndexOutcome {
        let mut outcome = self.outcome.clone();
        match outcome.wait_for(Option::is_some).await {
            Ok(value) => value.clone().unwrap_or(IndexOutcome::Cancelled),
            Err(_) => IndexOutcome::Cancelled,
        }
    }
}

/// Folder index plus the navigation cursor over it.
///
/// The published cursor is only ever replaced wholesale under its lock, so
/// readers never see a partially built listing.
pub struct FolderIndex {
    shell: Arc<dyn ShellService>,
    ui: UiContext,
    runtime: Handle,
    cursor: Arc<Mutex<NavigationCursor>>,
    position: PositionHandle,
    active: Mutex<Option<IndexHandle>>,
}

impl FolderIndex {
    /// Create an empty index.
    ///
    /// Must be called from within a Tokio runtime; indexing tasks are spawned
    /// onto it.
    pub fn new(shell: Arc<dyn ShellService>, ui: UiContext) -> Self {
        Self::with_runtime(shell, ui, Handle::current())
    }

    /// Create an empty index spawning onto `runtime`.
    pub fn with_runtime(shell: Arc<dyn ShellService>, ui: UiContext, runtime: Handle) -> Self {
        let (position, _) = watch::channel(None);
        Self {
            shell,
            ui,
            runtime,
            cursor: Arc::new(Mutex::new(NavigationCursor::default())),
            position: PositionHandle(Arc::new(position)),
            active: Mutex::new(None),
        }
    }

    /// Start indexing `folder` and locate `anchor` within it.
    ///
    /// Any indexing operation still in flight is cancelled first. The
    /// previously published snapshot stays readable until the new one
    /// replaces it.
    pub fn begin(&self, folder: PathBuf, anchor: File) -> IndexHandle {
        let mut active = lock(&self.active);
        if let Some(previous) = active.take() {
            if !previous.is_finished() {
                tracing::debug!(target: "index", "cancelling in-flight indexing");
            }
            previous.cancel();
        }

        let cancel = CancellationToken::new();
        let (outcome_tx, outcome_rx) = watch::channel(None);
        let handle = IndexHandle {
            cancel: cancel.clone(),
            outcome: outcome_rx,
        };

        let job = IndexJob {
            shell: Arc::clone(&self.shell),
            ui: self.ui.clone(),
            folder,
            anchor,
            cancel,
            cursor: Arc::clone(&self.cursor),
            position: self.position.clone(),
        };
        self.runtime.spawn(async move {
            let outcome = job.run().await;
            outcome_tx.send_replace(Some(outcome));
        });

        *active = Some(handle.clone());
        handle
    }

    /// Check if an indexing operation is in flight.
    pub fn is_indexing(&self) -> bool {
        lock(&self.active)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Handle of the most recent indexing operation.
    pub fn active(&self) -> Option<IndexHandle> {
        lock(&self.active).clone()
    }

    /// Cancel the in-flight indexing operation, if any.
    pub fn cancel(&self) {
        if let Some(handle) = lock(&self.active).as_ref() {
            handle.cancel();
        }
    }

    /// Step the cursor by `delta` with wraparound.
    ///
    /// Ignored while indexing is in flight, before the first publish, or when
    /// the folder has at most one item. The observable position is left
    /// alone: the caller sends `step.index` through [`Self::position_handle`]
    /// on the UI context, in the same job that shows `step.file`.
    pub fn step_by(&self, delta: isize) -> Option<Step> {
        if self.is_indexing() {
            return None;
        }

        let mut cursor = lock(&self.cursor);
        let file = cursor.step_by(delta)?;
        let index = cursor.index()?;
        Some(Step { file, index })
    }

    /// Read-only snapshot of the published cursor.
    pub fn snapshot(&self) -> NavigationCursor {
        lock(&self.cursor).clone()
    }

    /// Current position, `None` while navigation is disabled.
    pub fn position(&self) -> Option<usize> {
        *self.position.0.borrow()
    }

    /// Subscribe to position changes.
    pub fn subscribe_position(&self) -> watch::Receiver<Option<usize>> {
        self.position.0.subscribe()
    }

    /// Handle for publishing caller-driven position changes.
    pub fn position_handle(&self) -> PositionHandle {
        self.position.clone()
    }

    /// Cancel any in-flight indexing and drop the published snapshot.
    ///
    /// As with [`Self::step_by`], the observable position is reset by the
    /// caller on the UI context.
    pub fn clear(&self) {
        if let Some(handle) = lock(&self.active).take() {
            handle.cancel();
        }
        *lock(&self.cursor) = NavigationCursor::default();
    }
}

impl Drop for FolderIndex {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Everything one indexing task needs, moved onto the task.
struct IndexJob {
    shell: Arc<dyn ShellService>,
    ui: UiContext,
    folder: PathBuf,
    anchor: File,
    cancel: CancellationToken,
    cursor: Arc<Mutex<NavigationCursor>>,
    position: PositionHandle,
}

/// Result of enumerating a folder on the blocking pool.
struct Listing {
    files: Vec<File>,
    anchor: Option<usize>,
}

impl IndexJob {
    async fn run(self) -> IndexOutcome {
        let shell = Arc::clone(&self.shell);
        let folder = self.folder.clone();
        let anchor_name = self.anchor.name().to_string();
        let cancel = self.cancel.clone();

        let result = tokio::task::spawn_blocking(move || {
            enumerate(shell.as_ref(), &folder, &anchor_name, &cancel)
        })
        .await;

        match result {
            Ok(Ok(Some(listing))) => self.publish(listing).await,
            Ok(Ok(None)) => {
                tracing::debug!(target: "index", folder = %self.folder.display(), "indexing cancelled");
                IndexOutcome::Cancelled
            }
            Ok(Err(err)) => {
                tracing::warn!(target: "index", folder = %self.folder.display(), "enumeration failed: {err}");
                self.disable(IndexOutcome::Failed {
                    message: err.to_string(),
                })
                .await
            }
            Err(err) => {
                self.disable(IndexOutcome::Failed {
                    message: err.to_string(),
                })
                .await
            }
        }
    }

    /// Drop the previous snapshot so navigation stays disabled for this folder.
    async fn disable(&self, outcome: IndexOutcome) -> IndexOutcome {
        if self.replace(NavigationCursor::default(), None).await {
            outcome
        } else {
            IndexOutcome::Cancelled
        }
    }

    /// Swap in `next` and send `position` in one UI job, unless cancelled.
    ///
    /// The cancellation check, the swap and the send all happen under the
    /// cursor lock, so a cancelled operation leaves the published snapshot
    /// and its position untouched.
    async fn replace(&self, next: NavigationCursor, position: Option<usize>) -> bool {
        let cancel = self.cancel.clone();
        let cursor = Arc::clone(&self.cursor);
        let sender = self.position.clone();
        self.ui
            .run(move || {
                let mut current = lock(&cursor);
                if cancel.is_cancelled() {
                    return false;
                }
                *current = next;
                sender.set(position);
                true
            })
            .await
            .unwrap_or(false)
    }

    async fn publish(self, listing: Listing) -> IndexOutcome {
        let Some(anchor) = listing.anchor else {
            tracing::debug!(
                target: "index",
                anchor = self.anchor.name(),
                "anchor not found in listing, navigation remains disabled"
            );
            return self.disable(IndexOutcome::AnchorMissing).await;
        };
        let len = listing.files.len();

        let next = NavigationCursor::new(listing.files, anchor);
        if !self.replace(next, Some(anchor)).await {
            tracing::debug!(target: "index", folder = %self.folder.display(), "cancelled before publish");
            return IndexOutcome::Cancelled;
        }

        tracing::debug!(target: "index", len, anchor, "index published");
        IndexOutcome::Published { len, anchor }
    }
}

/// Enumerate `folder`, returning `None` if cancelled part-way.
///
/// A multi-item selection scopes navigation to the selection instead of the
/// whole folder.
fn enumerate(
    shell: &dyn ShellService,
    folder: &Path,
    anchor_name: &str,
    cancel: &CancellationToken,
) -> Result<Option<Listing>, ServiceError> {
    let selected = shell.selected_items(folder)?;
    let items = if selected.len() > 1 {
        selected
    } else {
        shell.list_items(folder)?
    };

    let mut files = Vec::with_capacity(items.len());
    let mut anchor = None;
    for item in items {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        if anchor.is_none() && item.name == anchor_name {
            anchor = Some(files.len());
        }
        files.push(item.into_file());
    }

    if cancel.is_cancelled() {
        return Ok(None);
    }

    Ok(Some(Listing { files, anchor }))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
