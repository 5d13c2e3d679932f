//! # JetStream Gateway
//! HTTP surface for JetStream: batch upload, job management, log
//! queries, encrypted notes, and the admin session layer.

pub mod auth;
pub mod ingest;
pub mod notes;
pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
