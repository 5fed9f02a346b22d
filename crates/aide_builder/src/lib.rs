//! # aide_builder - Generation pipeline and preview lifecycle for AIDE
//!
//! Runs once per explicit "generate" trigger, never from conversation turns:
//!
//! ```text
//! plan structure ──▶ generate files (sequential, ──▶ materialize preview
//!   (one call)         context-accumulating)           (copy + shim)
//!                                                          │
//!                                    preview manager ◀─────┘
//!                              (port, subprocess, readiness)
//! ```
//!
//! The pipeline trusts generated content: validators are advisory and a
//! per-file completion failure becomes a placeholder file, never an abort.

pub mod builder;
pub mod error;
pub mod extract;
pub mod generator;
pub mod planner;
pub mod preview;
pub mod validate;

pub use builder::*;
pub use error::*;
pub use generator::{ContextAccumulator, FilePreview, GenerationRun};
pub use preview::{PreviewConfig, PreviewManager, PreviewState};
