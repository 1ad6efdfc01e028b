//! Release-engineering automation for a multi-repository front-end project.
//!
//! Two workflows are provided:
//!
//! - **release** ([`release`], [`sequence`]): cut a new release branch from an
//!   existing one in every repository, repoint the shared submodule, and push.
//!   Strictly sequential and fail-fast.
//! - **deploy** ([`deploy`]): trigger one parameterized Jenkins build per
//!   repository through a browser driver.
//!
//! The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (branch spec, step order, descriptor
//!   rewrite). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (git processes, files, config,
//!   browser driver). Isolated behind traits so tests can script them.

pub mod core;
pub mod deploy;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod release;
pub mod sequence;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
