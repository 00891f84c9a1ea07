//! Test utilities for the backend crate.
//!
//! Shared by unit tests in `src/` and integration tests in `tests/` (via the
//! `test-support` feature).

pub mod clock;
pub mod upstream;
