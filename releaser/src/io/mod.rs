//! I/O helpers for releaser commands.

pub mod config;
pub mod credentials;
pub mod driver;
pub mod git;
pub mod process;
pub mod submodule;
