//! The UI-affine execution context.
//!
//! Every mutation observed by the presentation layer, and every conversion of
//! a native bitmap handle into a displayable bitmap, runs on one dedicated
//! thread. Background tasks marshal work onto it with [`UiContext::run`] and
//! suspend until it has executed.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use tokio::sync::{mpsc, oneshot};

use crate::error::UiClosed;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle for marshaling actions onto the UI thread.
///
/// Cheap to clone. The UI thread exits once every handle has been dropped
/// and the queued jobs have run. Dropping the last handle outside a Tokio
/// runtime waits for that; inside a runtime, or on the UI thread itself, the
/// thread is detached instead.
#[derive(Clone)]
pub struct UiContext {
    jobs: mpsc::UnboundedSender<Job>,
    thread_id: ThreadId,
    thread: Arc<UiThread>,
}

struct UiThread {
    handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl UiContext {
    /// Spawn a dedicated UI thread and return a handle to it.
    pub fn spawn() -> std::io::Result<Self> {
        let (jobs, mut rx) = mpsc::unbounded_channel::<Job>();

        let handle = thread::Builder::new()
            .name("glance-ui".to_string())
            .spawn(move || {
                while let Some(job) = rx.blocking_recv() {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        tracing::error!(target: "ui", "UI action panicked");
                    }
                }
                tracing::debug!(target: "ui", "UI thread exiting");
            })?;

        Ok(Self {
            jobs,
            thread_id: handle.thread().id(),
            thread: Arc::new(UiThread {
                handle: std::sync::Mutex::new(Some(handle)),
            }),
        })
    }

    /// Run `action` on the UI thread and wait for its result.
    pub async fn run<F, R>(&self, action: F) -> Result<R, UiClosed>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            let _ = tx.send(action());
        });
        self.jobs.send(job).map_err(|_| UiClosed)?;
        rx.await.map_err(|_| UiClosed)
    }

    /// Queue `action` without waiting for it.
    pub fn post<F>(&self, action: F) -> Result<(), UiClosed>
    where
        F: FnOnce() + Send + 'static,
    {
        self.jobs.send(Box::new(action)).map_err(|_| UiClosed)
    }

    /// Check if the caller is running on the UI thread.
    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }
}

impl std::fmt::Debug for UiContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiContext")
            .field("thread_id", &self.thread_id)
            .finish()
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        // Runs once the last UiContext clone is gone, so the job channel is
        // already closed and the loop is draining.
        let handle = self
            .handle
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return;
        };
        let on_ui_thread = handle.thread().id() == thread::current().id();
        if on_ui_thread || tokio::runtime::Handle::try_current().is_ok() {
            tracing::debug!(target: "ui", "detaching UI thread");
            return;
        }
        let _ = handle.join();
    }
}
