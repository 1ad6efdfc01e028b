//! Error taxonomy for the release branch-cut.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::step::Step;

/// Failures the release pipeline can produce. None of them are retried.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// Missing or invalid run inputs (branch names, repository layout, config).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The version-control tool could not be launched or exited non-zero.
    #[error("`{command}` failed in {}: {message}", .workdir.display())]
    ExternalTool {
        command: String,
        workdir: PathBuf,
        message: String,
    },

    /// The submodule descriptor could not be read or written.
    #[error("{action} {}: {source}", .path.display())]
    FileIo {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The descriptor does not contain exactly one tracked-branch line.
    #[error("{}: expected exactly one tracked-branch line, found {matches}", .path.display())]
    MalformedDescriptor { path: PathBuf, matches: usize },
}

/// A step of the per-repository sequence that failed, with its cause.
#[derive(Debug, Error)]
#[error("step {step} failed: {cause}")]
pub struct StepFailure {
    pub step: Step,
    pub cause: ReleaseError,
}

impl StepFailure {
    pub fn new(step: Step, cause: ReleaseError) -> Self {
        Self { step, cause }
    }
}

pub type Result<T, E = ReleaseError> = std::result::Result<T, E>;
