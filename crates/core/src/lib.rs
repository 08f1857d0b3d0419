//! Shared domain types for the feedframe platform.
//!
//! This crate is dependency-light by design: no IO, no async. It holds
//! the type aliases used across every other crate, the core error
//! taxonomy, and the [`rect::PlacementRect`] geometry type with its
//! validation and clamping rules.

pub mod error;
pub mod rect;
pub mod types;

pub use error::CoreError;
pub use rect::PlacementRect;
