//! The navigation session: current file, its index and its preview.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::watch;

use glance_core::{File, PeekConfig, PreviewState, UiContext};
use glance_index::{
    FolderIndex, IndexHandle, IndexOutcome, NavigationCursor, PositionHandle, ShellService,
};
use glance_preview::{Artifact, PreviewServices, Previewer, PreviewerFactory};

/// Observable state mirrored for the presentation layer.
///
/// Only ever written on the UI context. The item index lives in the folder
/// index and is written through `position`.
#[derive(Clone)]
struct Observables {
    current_file: Arc<watch::Sender<Option<File>>>,
    position: PositionHandle,
    preview_state: Arc<watch::Sender<PreviewState>>,
    current_artifact: Arc<watch::Sender<Option<Artifact>>>,
}

impl Observables {
    fn new(position: PositionHandle) -> Self {
        Self {
            current_file: Arc::new(watch::channel(None).0),
            position,
            preview_state: Arc::new(watch::channel(PreviewState::Uninitialized).0),
            current_artifact: Arc::new(watch::channel(None).0),
        }
    }

    /// Show `file` at `position` with a fresh preview.
    fn reset(&self, file: Option<File>, position: Option<usize>) {
        self.current_file.send_replace(file);
        self.position.set(position);
        self.preview_state.send_replace(PreviewState::Uninitialized);
        self.current_artifact.send_replace(None);
    }

    fn mirror(&self, state: PreviewState, artifact: Option<Artifact>) {
        self.preview_state.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
        self.current_artifact.send_if_modified(|current| {
            let changed = *current != artifact;
            *current = artifact;
            changed
        });
    }
}

/// Ties folder indexing, navigation and previewing together.
///
/// Every change of the current file cancels the previous previewer and
/// starts a new one. Observable state is updated on the UI context and
/// tagged with a generation so that late updates from an abandoned previewer
/// are dropped.
pub struct PeekSession {
    ui: UiContext,
    index: FolderIndex,
    factory: PreviewerFactory,
    runtime: Handle,
    observables: Observables,
    active: Mutex<Option<Arc<Previewer>>>,
    generation: Arc<AtomicU64>,
}

impl PeekSession {
    /// Create a session. Must be called from within a Tokio runtime.
    pub fn new(
        shell: Arc<dyn ShellService>,
        services: PreviewServices,
        ui: UiContext,
        config: PeekConfig,
    ) -> Self {
        let runtime = Handle::current();
        let index = FolderIndex::with_runtime(shell, ui.clone(), runtime.clone());
        let observables = Observables::new(index.position_handle());
        Self {
            index,
            factory: PreviewerFactory::with_runtime(services, ui.clone(), config, runtime.clone()),
            ui,
            runtime,
            observables,
            active: Mutex::new(None),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Show `file` and start indexing its folder in the background.
    ///
    /// The file is current immediately; navigation becomes available once
    /// indexing publishes.
    pub fn open(&self, file: File) -> IndexHandle {
        tracing::debug!(target: "session", file = %file.path().display(), "opening");
        self.index.clear();
        let folder = file.folder().map(PathBuf::from).unwrap_or_default();
        self.set_current(Some(file.clone()), None);
        self.index.begin(folder, file)
    }

    /// Step to the file `delta` positions away, wrapping around.
    ///
    /// Returns the new current file, or `None` when navigation is not
    /// possible right now. The current file and item index observables
    /// change together on the UI context.
    pub fn navigate(&self, delta: isize) -> Option<File> {
        let step = self.index.step_by(delta)?;
        self.set_current(Some(step.file.clone()), Some(step.index));
        Some(step.file)
    }

    /// Drop the current file, its preview and the folder index.
    pub fn clear(&self) {
        self.index.clear();
        self.set_current(None, None);
    }

    fn set_current(&self, file: Option<File>, position: Option<usize>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut active = lock(&self.active);
        if let Some(previous) = active.take() {
            previous.cancel();
            self.runtime.spawn(async move {
                previous.dispose().await;
            });
        }

        let observables = self.observables.clone();
        let current = Arc::clone(&self.generation);
        let reset_file = file.clone();
        self.on_ui(move || {
            if current.load(Ordering::SeqCst) == generation {
                observables.reset(reset_file, position);
            }
        });

        let Some(file) = file else {
            return;
        };

        let previewer = self.factory.create(file);
        *active = Some(Arc::clone(&previewer));
        drop(active);

        let forwarder = Forwarder {
            ui: self.ui.clone(),
            observables: self.observables.clone(),
            current: Arc::clone(&self.generation),
            generation,
        };
        self.runtime.spawn(async move {
            tokio::join!(previewer.load_preview(), forwarder.run(&previewer));
        });
    }

    /// Run `action` now when already on the UI context, otherwise queue it.
    fn on_ui<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.ui.is_ui_thread() {
            action();
        } else if self.ui.post(action).is_err() {
            tracing::warn!(target: "session", "UI context closed, dropping update");
        }
    }

    /// Wait until every observable update queued so far has been applied.
    pub async fn flush(&self) {
        if self.ui.run(|| ()).await.is_err() {
            tracing::warn!(target: "session", "UI context closed");
        }
    }

    /// Wait for the current indexing operation, if any.
    pub async fn wait_for_index(&self) -> Option<IndexOutcome> {
        let handle = self.index.active()?;
        Some(handle.wait().await)
    }

    /// Wait until the current file's preview reaches a terminal state.
    pub async fn wait_for_preview(&self) -> PreviewState {
        self.flush().await;
        if lock(&self.active).is_none() {
            return self.preview_state();
        }

        let mut state = self.subscribe_preview_state();
        match state.wait_for(|s| s.is_terminal()).await {
            Ok(value) => *value,
            Err(_) => self.preview_state(),
        }
    }

    pub fn current_file(&self) -> Option<File> {
        self.observables.current_file.borrow().clone()
    }

    pub fn current_item_index(&self) -> Option<usize> {
        self.index.position()
    }

    pub fn preview_state(&self) -> PreviewState {
        *self.observables.preview_state.borrow()
    }

    pub fn current_artifact(&self) -> Option<Artifact> {
        self.observables.current_artifact.borrow().clone()
    }

    pub fn subscribe_current_file(&self) -> watch::Receiver<Option<File>> {
        self.observables.current_file.subscribe()
    }

    pub fn subscribe_current_item_index(&self) -> watch::Receiver<Option<usize>> {
        self.index.subscribe_position()
    }

    pub fn subscribe_preview_state(&self) -> watch::Receiver<PreviewState> {
        self.observables.preview_state.subscribe()
    }

    pub fn subscribe_current_artifact(&self) -> watch::Receiver<Option<Artifact>> {
        self.observables.current_artifact.subscribe()
    }

    /// Snapshot of the published folder index.
    pub fn items(&self) -> NavigationCursor {
        self.index.snapshot()
    }

    /// Check if navigation is blocked by an in-flight indexing operation.
    pub fn is_indexing(&self) -> bool {
        self.index.is_indexing()
    }

    /// The previewer for the current file.
    pub fn previewer(&self) -> Option<Arc<Previewer>> {
        lock(&self.active).clone()
    }

    /// Generation of the current file; bumped on every change.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn factory(&self) -> &PreviewerFactory {
        &self.factory
    }
}

impl Drop for PeekSession {
    fn drop(&mut self) {
        if let Some(previewer) = lock(&self.active).take() {
            previewer.cancel();
        }
    }
}

/// Mirrors one previewer's observables into the session's.
struct Forwarder {
    ui: UiContext,
    observables: Observables,
    current: Arc<AtomicU64>,
    generation: u64,
}

impl Forwarder {
    async fn run(self, previewer: &Previewer) {
        let mut state = previewer.subscribe_state();
        let mut artifact = previewer.subscribe_artifact();

        loop {
            let snapshot = (*state.borrow_and_update(), artifact.borrow_and_update().clone());
            if !self.apply(snapshot).await {
                break;
            }

            tokio::select! {
                _ = previewer.cancelled() => break,
                changed = state.changed() => if changed.is_err() { break },
                changed = artifact.changed() => if changed.is_err() { break },
            }
        }
    }

    /// Apply on the UI context; `false` once this generation is stale.
    async fn apply(&self, (state, artifact): (PreviewState, Option<Artifact>)) -> bool {
        let observables = self.observables.clone();
        let current = Arc::clone(&self.current);
        let generation = self.generation;
        self.ui
            .run(move || {
                if current.load(Ordering::SeqCst) != generation {
                    return false;
                }
                observables.mirror(state, artifact);
                true
            })
            .await
            .unwrap_or(false)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
