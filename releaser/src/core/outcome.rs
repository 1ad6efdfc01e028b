//! Terminal state of a release run.

use std::fmt;

use crate::core::step::Step;
use crate::error::ReleaseError;

/// How a release run ended. Built once when the run stops.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every repository went through the full sequence, in this order.
    Completed { repositories: Vec<String> },
    /// The run stopped at `step` of `repository`. Repositories listed in
    /// `completed` keep their mutations; later ones were not touched.
    Aborted {
        completed: Vec<String>,
        repository: String,
        step: Step,
        cause: ReleaseError,
    },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed { repositories } => {
                write!(f, "release completed for {} repositories", repositories.len())
            }
            RunOutcome::Aborted {
                repository,
                step,
                cause,
                ..
            } => write!(
                f,
                "release aborted at repository {repository}, step {step}: {cause}"
            ),
        }
    }
}
