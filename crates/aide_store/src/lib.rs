//! # aide_store - Project persistence for AIDE
//!
//! Projects are stored in a data directory, one JSON document per project:
//!
//! ```text
//! <data_dir>/
//! ├── project-<id>.json      # full project document
//! └── project-<id>/
//!     ├── src/               # generated source tree
//!     └── preview/           # runnable preview copy
//! ```
//!
//! There are no partial updates: every mutation loads the full document,
//! modifies it and writes it back. A project is expected to have at most one
//! active client session, so lost updates between concurrent writers are an
//! accepted risk.

pub mod error;
pub mod store;

pub use error::*;
pub use store::*;
