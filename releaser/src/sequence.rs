//! Branch-cut sequence for a single repository.
//!
//! Steps run in [`Step::ALL`] order; the first failing step ends the sequence
//! and nothing is rolled back.

use tracing::{info, instrument};

use crate::core::branch::BranchSpec;
use crate::core::step::{RepositoryRole, Step, commit_message};
use crate::error::{ReleaseError, StepFailure};
use crate::io::git::Git;
use crate::io::process::ProcessRunner;
use crate::io::submodule::set_tracked_branch;
use crate::release::ReleaseSettings;

/// Run every step of the branch-cut in `repository`.
#[instrument(skip_all, fields(repository = %repository))]
pub fn run_repository<R: ProcessRunner>(
    runner: &R,
    settings: &ReleaseSettings,
    repository: &str,
    branches: &BranchSpec,
) -> Result<(), StepFailure> {
    let workdir = settings.base_dir.join(repository);
    let git = Git::new(runner, settings.git.as_str(), &workdir);
    let role = RepositoryRole::of(repository, &settings.shared_repository);

    git.discard_changes().map_err(at(Step::Reset))?;
    info!("reset local changes");

    let previous = git.current_branch().map_err(at(Step::RecordCurrentBranch))?;
    info!(branch = %previous, "checked out from branch");

    git.checkout_branch(branches.source())
        .map_err(at(Step::Checkout))?;
    info!(branch = branches.source(), "switched to branch");

    git.pull_rebase().map_err(at(Step::Pull))?;
    info!("pulled latest changes");

    git.checkout_new_branch(branches.target())
        .map_err(at(Step::CreateBranch))?;
    info!(branch = branches.target(), "created new branch");

    if role.commits_descriptor() {
        let descriptor = workdir.join(&settings.descriptor_file);
        set_tracked_branch(&descriptor, branches.target()).map_err(at(Step::RewriteSubmodule))?;
        info!(
            descriptor = %settings.descriptor_file.display(),
            branch = branches.target(),
            "repointed submodule"
        );

        git.add_all().map_err(at(Step::CommitAndPush))?;
        git.commit_no_verify(&commit_message(&settings.commit_message, branches.target()))
            .map_err(at(Step::CommitAndPush))?;
    }
    git.push_set_upstream(&settings.remote, branches.target())
        .map_err(at(Step::CommitAndPush))?;
    info!(remote = %settings.remote, "pushed release branch");
    Ok(())
}

fn at(step: Step) -> impl FnOnce(ReleaseError) -> StepFailure {
    move |cause| StepFailure::new(step, cause)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedRunner, TestWorkspace};

    fn branches() -> BranchSpec {
        BranchSpec::new("release/X", "release/Y").expect("branches")
    }

    #[test]
    fn consumer_repository_runs_all_steps() {
        let ws = TestWorkspace::new(&["A"]).expect("workspace");
        let runner = ScriptedRunner::new();
        run_repository(&runner, &ws.settings("shared"), "A", &branches()).expect("sequence");

        assert_eq!(
            runner.commands_in(&ws.repo_path("A")),
            vec![
                "checkout .",
                "rev-parse --abbrev-ref HEAD",
                "checkout release/X",
                "pull --rebase",
                "checkout -b release/Y",
                "add .",
                "commit -m chore: create new release: release/Y --no-verify",
                "push --set-upstream origin release/Y --no-verify",
            ]
        );
        assert!(ws.descriptor("A").contains("\tbranch = release/Y\n"));
    }

    #[test]
    fn shared_repository_only_pushes() {
        let ws = TestWorkspace::new(&["shared"]).expect("workspace");
        let runner = ScriptedRunner::new();
        run_repository(&runner, &ws.settings("shared"), "shared", &branches())
            .expect("sequence");

        let commands = runner.commands_in(&ws.repo_path("shared"));
        assert!(!commands.iter().any(|c| c.starts_with("add") || c.starts_with("commit")));
        assert_eq!(
            commands.last().map(String::as_str),
            Some("push --set-upstream origin release/Y --no-verify")
        );
        assert!(ws.descriptor("shared").contains("branch = release/X"));
    }

    #[test]
    fn failing_pull_stops_before_branching() {
        let ws = TestWorkspace::new(&["A"]).expect("workspace");
        let runner = ScriptedRunner::new().fail_on(ws.repo_path("A"), "pull");
        let failure = run_repository(&runner, &ws.settings("shared"), "A", &branches())
            .expect_err("pull fails");

        assert_eq!(failure.step, Step::Pull);
        assert!(matches!(failure.cause, ReleaseError::ExternalTool { .. }));
        assert_eq!(
            runner.commands_in(&ws.repo_path("A")).last().map(String::as_str),
            Some("pull --rebase")
        );
        assert!(ws.descriptor("A").contains("branch = release/X"));
    }

    #[test]
    fn malformed_descriptor_stops_before_commit() {
        let ws = TestWorkspace::new(&["A"]).expect("workspace");
        ws.write_descriptor("A", "[submodule \"shared\"]\n\tpath = shared\n")
            .expect("descriptor");
        let runner = ScriptedRunner::new();
        let failure = run_repository(&runner, &ws.settings("shared"), "A", &branches())
            .expect_err("no branch line");

        assert_eq!(failure.step, Step::RewriteSubmodule);
        assert!(matches!(
            failure.cause,
            ReleaseError::MalformedDescriptor { matches: 0, .. }
        ));
        assert_eq!(
            runner.commands_in(&ws.repo_path("A")).last().map(String::as_str),
            Some("checkout -b release/Y")
        );
    }

    #[test]
    fn failing_commit_is_reported_as_commit_and_push() {
        let ws = TestWorkspace::new(&["A"]).expect("workspace");
        let runner = ScriptedRunner::new().fail_on(ws.repo_path("A"), "commit");
        let failure = run_repository(&runner, &ws.settings("shared"), "A", &branches())
            .expect_err("commit fails");
        assert_eq!(failure.step, Step::CommitAndPush);
        assert!(
            !runner
                .commands_in(&ws.repo_path("A"))
                .iter()
                .any(|c| c.starts_with("push"))
        );
    }
}
