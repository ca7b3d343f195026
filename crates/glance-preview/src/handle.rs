//! Native bitmap handles and their materialized form.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use glance_core::{Size, UiContext};

/// Opaque identifier of a native bitmap owned by a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(pub u64);

/// Releases native handles back to whoever allocated them.
pub trait HandleRelease: Send + Sync {
    fn release(&self, handle: RawHandle);
}

/// A caller-owned native bitmap returned by a thumbnail or icon service.
///
/// The handle is released exactly once, when the value is dropped. It can be
/// moved across tasks freely; whichever task drops it releases it.
pub struct NativeBitmap {
    raw: RawHandle,
    size: Size,
    pixels: Vec<u8>,
    owner: Arc<dyn HandleRelease>,
}

impl NativeBitmap {
    /// Wrap an allocated handle. `pixels` is tightly packed RGBA8.
    pub fn new(raw: RawHandle, size: Size, pixels: Vec<u8>, owner: Arc<dyn HandleRelease>) -> Self {
        Self {
            raw,
            size,
            pixels,
            owner,
        }
    }

    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl std::fmt::Debug for NativeBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeBitmap")
            .field("raw", &self.raw)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl Drop for NativeBitmap {
    fn drop(&mut self) {
        self.owner.release(self.raw);
    }
}

/// A displayable bitmap, detached from any native handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    size: Size,
    pixels: Arc<[u8]>,
}

impl Bitmap {
    /// Copy `native` into a displayable bitmap and release the handle.
    ///
    /// Must run on the UI context.
    pub fn materialize(native: NativeBitmap, ui: &UiContext) -> Self {
        debug_assert!(ui.is_ui_thread(), "bitmap materialized off the UI thread");
        Self {
            size: native.size,
            pixels: Arc::from(native.pixels.as_slice()),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Allocates handle ids and tracks which are still outstanding.
#[derive(Debug, Default)]
pub struct HandleLedger {
    next: AtomicU64,
    live: Mutex<HashSet<u64>>,
}

impl HandleLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Allocate a new handle owning `pixels`.
    pub fn acquire(self: &Arc<Self>, size: Size, pixels: Vec<u8>) -> NativeBitmap {
        let id = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);

        let owner: Arc<dyn HandleRelease> = self.clone();
        NativeBitmap::new(RawHandle(id), size, pixels, owner)
    }

    /// Number of handles acquired but not yet released.
    pub fn outstanding(&self) -> usize {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Total number of handles ever acquired.
    pub fn acquired(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl HandleRelease for HandleLedger {
    fn release(&self, handle: RawHandle) {
        let removed = self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.0);
        if !removed {
            tracing::warn!(target: "preview", handle = handle.0, "released unknown native handle");
        }
    }
}
