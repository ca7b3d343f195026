//! Previewer dispatch and progressive preview loading for glance.
//!
//! # Overview
//!
//! - [`PreviewerFactory`] maps a [`File`] to one of a closed set of
//!   [`PreviewerKind`]s and builds a [`Previewer`] for it
//! - [`Previewer::load_preview`] runs the kind's quality tiers concurrently,
//!   publishing each result into an [`ArtifactSlot`] whose visible rank never
//!   decreases
//! - Native bitmaps from the services are owned values that release their
//!   handle on drop; [`HandleLedger`] makes outstanding handles observable
//!
//! # Example
//!
//! ```rust,no_run
//! use glance_core::{File, PeekConfig, UiContext};
//! use glance_preview::{HandleLedger, PreviewServices, PreviewerFactory};
//!
//! # async fn demo() -> std::io::Result<()> {
//! let ui = UiContext::spawn()?;
//! let services = PreviewServices::filesystem(HandleLedger::new());
//! let factory = PreviewerFactory::new(services, ui, PeekConfig::default());
//!
//! let previewer = factory.create(File::from_path("/photos/a.png"));
//! let state = previewer.load_preview().await;
//! println!("{state}: {:?}", previewer.current_artifact().map(|a| a.to_string()));
//! previewer.dispose().await;
//! # Ok(())
//! # }
//! ```

mod artifact;
mod error;
mod factory;
mod fs;
mod handle;
mod kind;
mod previewer;
mod service;

pub use artifact::{Artifact, ArtifactSlot, FileInfo, FileSummary, Publish};
pub use error::TierError;
pub use factory::PreviewerFactory;
pub use fs::{FsIcons, FsThumbnails};
pub use handle::{Bitmap, HandleLedger, HandleRelease, NativeBitmap, RawHandle};
pub use kind::PreviewerKind;
pub use previewer::Previewer;
pub use service::{IconService, PreviewServices, ThumbnailService};

// Re-export core types for convenience
pub use glance_core::{File, PreviewState, QualityTier, ServiceError, Size};
