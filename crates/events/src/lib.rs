//! feedframe progress event infrastructure.
//!
//! This crate provides the live-progress side of the processing
//! pipeline:
//!
//! - [`ProgressEvent`] — the transient per-entry / job-fatal event and
//!   its wire encoding.
//! - [`ProgressHub`] — in-process publish/subscribe hub with one topic
//!   per job, backed by `tokio::sync::broadcast`.
//!
//! Events are never persisted; a subscriber only sees what is published
//! while it is connected.

pub mod event;
pub mod hub;

pub use event::ProgressEvent;
pub use hub::ProgressHub;
