//! Authentication building blocks.
//!
//! Account management (registration, login, token refresh) lives
//! outside this service; handlers here only validate the HS256 access
//! tokens that upstream auth mints. Token generation is kept for tests
//! and local tooling.

pub mod jwt;
