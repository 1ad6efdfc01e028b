//! Stable exit codes for releaser CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid arguments, configuration, or repository layout; or any error that
/// is not a release step failure. Nothing was mutated for configuration errors.
pub const INVALID: i32 = 1;
/// `releaser release` aborted at a repository step.
pub const ABORTED: i32 = 3;
