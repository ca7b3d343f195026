//! Dispatch from a file to the previewer that renders it.

use std::sync::Arc;

use tokio::runtime::Handle;

use glance_core::{File, PeekConfig, UiContext};

use crate::kind::PreviewerKind;
use crate::previewer::Previewer;
use crate::service::PreviewServices;

/// Builds previewers. Never fails: unknown extensions get the unsupported
/// fallback.
#[derive(Debug, Clone)]
pub struct PreviewerFactory {
    services: PreviewServices,
    ui: UiContext,
    config: Arc<PeekConfig>,
    runtime: Handle,
}

impl PreviewerFactory {
    /// Must be called from within a Tokio runtime.
    pub fn new(services: PreviewServices, ui: UiContext, config: PeekConfig) -> Self {
        Self::with_runtime(services, ui, config, Handle::current())
    }

    pub fn with_runtime(
        services: PreviewServices,
        ui: UiContext,
        config: PeekConfig,
        runtime: Handle,
    ) -> Self {
        Self {
            services,
            ui,
            config: Arc::new(config),
            runtime,
        }
    }

    pub fn config(&self) -> &PeekConfig {
        &self.config
    }

    /// Kind that would be chosen for `file`.
    pub fn kind_for(&self, file: &File) -> PreviewerKind {
        if file.is_dir() {
            return PreviewerKind::Unsupported;
        }
        PreviewerKind::for_extension(file.extension())
    }

    /// Create an unstarted previewer for `file`.
    pub fn create(&self, file: File) -> Arc<Previewer> {
        let kind = self.kind_for(&file);
        tracing::debug!(target: "preview", file = file.name(), %kind, "creating previewer");
        Arc::new(Previewer::new(
            file,
            kind,
            self.services.clone(),
            self.ui.clone(),
            Arc::clone(&self.config),
            self.runtime.clone(),
        ))
    }
}
