//! Core business logic for plaza.
//!
//! The engagement toggle engine, the activity ledger, post lifecycle and feed
//! composition. Every service is built over a shared
//! `Arc<DatabaseConnection>` and an injected clock.

pub mod services;

pub use services::*;
