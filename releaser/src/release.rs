//! Release orchestration across repositories.
//!
//! A release run cuts `target` from `source` in every configured repository,
//! strictly one repository after the other. The first failing step aborts the
//! whole run: later repositories are never touched and earlier ones keep
//! everything they already pushed.

use std::path::PathBuf;

use tracing::{error, info, instrument};

use crate::core::branch::BranchSpec;
use crate::core::outcome::RunOutcome;
use crate::error::{ReleaseError, Result};
use crate::io::config::ReleaserConfig;
use crate::io::process::ProcessRunner;
use crate::sequence::run_repository;

/// Per-run settings shared by every repository sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSettings {
    pub base_dir: PathBuf,
    pub shared_repository: String,
    pub git: String,
    pub remote: String,
    pub descriptor_file: PathBuf,
    pub commit_message: String,
}

impl From<&ReleaserConfig> for ReleaseSettings {
    fn from(cfg: &ReleaserConfig) -> Self {
        Self {
            base_dir: cfg.base_dir.clone(),
            shared_repository: cfg.shared_repository.clone(),
            git: cfg.git.clone(),
            remote: cfg.remote.clone(),
            descriptor_file: cfg.descriptor_file.clone(),
            commit_message: cfg.commit_message.clone(),
        }
    }
}

/// Cut `target` from `source` in each of `repositories`, in order.
///
/// Returns `Err` only for configuration problems detected before any
/// repository is touched (empty branch names, an empty list, a shared
/// repository missing from the list, missing working copies). Step
/// failures end the run and are reported as [`RunOutcome::Aborted`].
#[instrument(skip_all, fields(repositories = repositories.len()))]
pub fn run_release<R: ProcessRunner>(
    runner: &R,
    settings: &ReleaseSettings,
    repositories: &[String],
    source: &str,
    target: &str,
) -> Result<RunOutcome> {
    let branches = BranchSpec::new(source, target)?;
    ensure_working_copies(settings, repositories)?;
    info!(
        source = branches.source(),
        target = branches.target(),
        "starting new release"
    );

    let mut completed = Vec::with_capacity(repositories.len());
    for repository in repositories {
        info!(repository = %repository, "working on repository");
        if let Err(failure) = run_repository(runner, settings, repository, &branches) {
            error!(
                repository = %repository,
                step = %failure.step,
                cause = %failure.cause,
                "release aborted"
            );
            return Ok(RunOutcome::Aborted {
                completed,
                repository: repository.clone(),
                step: failure.step,
                cause: failure.cause,
            });
        }
        info!(repository = %repository, "done");
        completed.push(repository.clone());
    }

    Ok(RunOutcome::Completed {
        repositories: completed,
    })
}

fn ensure_working_copies(settings: &ReleaseSettings, repositories: &[String]) -> Result<()> {
    if repositories.is_empty() {
        return Err(ReleaseError::Configuration(
            "no repositories configured".to_string(),
        ));
    }
    if !repositories.contains(&settings.shared_repository) {
        return Err(ReleaseError::Configuration(format!(
            "shared repository '{}' is not in the repository list",
            settings.shared_repository
        )));
    }
    let missing: Vec<String> = repositories
        .iter()
        .filter(|name| !settings.base_dir.join(name).is_dir())
        .map(|name| settings.base_dir.join(name).display().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ReleaseError::Configuration(format!(
            "repository working copies not found: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}
