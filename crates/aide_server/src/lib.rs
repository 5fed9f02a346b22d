//! # aide_server - WebSocket session server for AIDE
//!
//! Speaks the typed JSON protocol in [`protocol`] over a persistent
//! per-client channel and wires the conversational and generation pipelines
//! together in [`ws`].

pub mod protocol;
pub mod ws;
