//! Core types and traits for glance.
//!
//! This crate provides the value types shared by the indexing, preview and
//! session crates: files, quality tiers, preview states, configuration and
//! the UI-affine execution context that every presentation-visible mutation
//! is marshaled onto.

mod config;
mod error;
mod file;
mod tier;
mod ui;

pub use config::{PeekConfig, PeekConfigBuilder};
pub use error::{ConfigError, ServiceError, UiClosed};
pub use file::File;
pub use tier::{PreviewState, QualityTier, Size};
pub use ui::UiContext;
