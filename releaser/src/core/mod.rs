//! Deterministic, pure logic shared by the release pipeline.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values and return deterministic outputs suitable for tests.

pub mod branch;
pub mod outcome;
pub mod step;
pub mod submodule;
