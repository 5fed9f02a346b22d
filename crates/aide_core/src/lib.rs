//! # aide_core - Data model and decision rules for AIDE
//!
//! AIDE gathers web-app requirements through a fixed chain of specialist
//! agents and generates a project once enough substance has been collected.
//! This crate holds everything the other crates agree on:
//!
//! - The seven-role agent chain and its ordering
//! - The project document: messages, requirement ledger, generated files
//! - The substance classifier that decides whether a reply counts
//! - The readiness gate that decides whether generation may start

pub mod readiness;
pub mod roles;
pub mod substance;
pub mod types;

pub use readiness::*;
pub use roles::*;
pub use substance::*;
pub use types::*;
