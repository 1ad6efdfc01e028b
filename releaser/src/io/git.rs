//! Git adapter for the release branch-cut.
//!
//! Each method names one git operation the pipeline needs and maps it to a
//! single [`ProcessRunner`] invocation in the repository's working directory.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::error::Result;
use crate::io::process::ProcessRunner;

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git<R> {
    runner: R,
    program: String,
    workdir: PathBuf,
}

impl<R: ProcessRunner> Git<R> {
    /// `program` is the git executable (`git`, or an absolute path).
    pub fn new(runner: R, program: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            program: program.into(),
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Discard uncommitted changes to tracked files (`git checkout .`).
    #[instrument(skip_all)]
    pub fn discard_changes(&self) -> Result<()> {
        debug!("discarding local changes");
        self.run(&["checkout", "."])?;
        Ok(())
    }

    /// Return the current branch name (`HEAD` when detached).
    pub fn current_branch(&self) -> Result<String> {
        let out = self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        Ok(out.trim().to_string())
    }

    /// Checkout an existing branch.
    #[instrument(skip_all, fields(branch))]
    pub fn checkout_branch(&self, branch: &str) -> Result<()> {
        debug!(branch, "checking out branch");
        self.run(&["checkout", branch])?;
        Ok(())
    }

    /// Fetch and rebase the current branch onto its upstream.
    #[instrument(skip_all)]
    pub fn pull_rebase(&self) -> Result<()> {
        debug!("pulling with rebase");
        self.run(&["pull", "--rebase"])?;
        Ok(())
    }

    /// Create and checkout a new branch at current HEAD.
    #[instrument(skip_all, fields(branch))]
    pub fn checkout_new_branch(&self, branch: &str) -> Result<()> {
        debug!(branch, "creating and checking out new branch");
        self.run(&["checkout", "-b", branch])?;
        Ok(())
    }

    /// Stage all changes in the working tree.
    pub fn add_all(&self) -> Result<()> {
        self.run(&["add", "."])?;
        Ok(())
    }

    /// Commit staged changes, skipping pre-commit and commit-msg hooks.
    #[instrument(skip_all)]
    pub fn commit_no_verify(&self, message: &str) -> Result<()> {
        debug!("committing staged changes");
        self.run(&["commit", "-m", message, "--no-verify"])?;
        Ok(())
    }

    /// Push `branch` to `remote`, setting it as upstream and skipping pre-push hooks.
    #[instrument(skip_all, fields(remote, branch))]
    pub fn push_set_upstream(&self, remote: &str, branch: &str) -> Result<()> {
        debug!(remote, branch, "pushing branch");
        self.run(&["push", "--set-upstream", remote, branch, "--no-verify"])?;
        Ok(())
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        self.runner.run(&self.program, args, &self.workdir)
    }
}
