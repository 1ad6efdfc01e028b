//! Steps of the per-repository branch-cut sequence.

use std::fmt;

/// One step of the branch-cut, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    Reset,
    RecordCurrentBranch,
    Checkout,
    Pull,
    CreateBranch,
    RewriteSubmodule,
    CommitAndPush,
}

impl Step {
    /// All steps in the order they run.
    pub const ALL: [Step; 7] = [
        Step::Reset,
        Step::RecordCurrentBranch,
        Step::Checkout,
        Step::Pull,
        Step::CreateBranch,
        Step::RewriteSubmodule,
        Step::CommitAndPush,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Step::Reset => "reset",
            Step::RecordCurrentBranch => "record-current-branch",
            Step::Checkout => "checkout",
            Step::Pull => "pull",
            Step::CreateBranch => "create-branch",
            Step::RewriteSubmodule => "rewrite-submodule",
            Step::CommitAndPush => "commit-and-push",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a repository takes part in the branch-cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryRole {
    /// Consumes the shared repository as a submodule: its descriptor is
    /// repointed and committed.
    Consumer,
    /// The shared repository itself: branch is cut and pushed, nothing committed.
    Shared,
}

impl RepositoryRole {
    pub fn of(repository: &str, shared_repository: &str) -> Self {
        if repository == shared_repository {
            RepositoryRole::Shared
        } else {
            RepositoryRole::Consumer
        }
    }

    /// Whether the descriptor rewrite and the stage/commit sub-steps run.
    pub fn commits_descriptor(self) -> bool {
        self == RepositoryRole::Consumer
    }
}

/// Render the release commit message, substituting `{branch}` with `target`.
pub fn commit_message(template: &str, target: &str) -> String {
    template.replace("{branch}", target)
}
