//! Duel lifecycle coordination for Codeclash.
//!
//! Two clients agree on a shared exercise set, a strictly-ordered session
//! lifecycle, and a single race-free resolution of "who finished" — with
//! no application server, using nothing but a shared record in the
//! document store and its change notifications.
//!
//! # Key types
//!
//! - [`DuelService`] — the lifecycle operations (create, join, ready,
//!   score, delete)
//! - [`SyncChannel`] / [`DuelSubscription`] — push notifications on a
//!   duel record, with idempotent teardown
//! - [`ExpiryReaper`] — best-effort sweep of stale records
//! - [`DuelConfig`] — thresholds and retry caps

mod config;
mod error;
mod reaper;
mod service;
mod sync;

pub use config::DuelConfig;
pub use error::DuelError;
pub use reaper::ExpiryReaper;
pub use service::DuelService;
pub use sync::{DuelSubscription, SyncChannel};
