//! End-to-end release runs against real git repositories.
//!
//! Each repository has a local bare remote, so pull and push work without a
//! network. These tests need a `git` binary on `PATH`.

use std::fs;

use releaser::core::outcome::RunOutcome;
use releaser::core::step::Step;
use releaser::io::config::ReleaserConfig;
use releaser::io::process::SystemRunner;
use releaser::release::{ReleaseSettings, run_release};
use releaser::test_support::GitFixture;

const REPOS: [&str; 3] = ["pmc-react-browse", "pmc-react-login", "pmc-react-shared"];
const SHARED: &str = "pmc-react-shared";

fn settings(fixture: &GitFixture) -> ReleaseSettings {
    let cfg = ReleaserConfig {
        base_dir: fixture.base_dir().to_path_buf(),
        repositories: REPOS.iter().map(|r| r.to_string()).collect(),
        shared_repository: SHARED.to_string(),
        ..ReleaserConfig::default()
    };
    ReleaseSettings::from(&cfg)
}

fn repositories() -> Vec<String> {
    REPOS.iter().map(|r| r.to_string()).collect()
}

#[test]
fn release_cuts_and_pushes_branch_in_every_repository() {
    let fixture = GitFixture::new(&REPOS, "release/X").expect("fixture");
    // Uncommitted noise must be discarded by the reset step.
    fs::write(fixture.repo_path("pmc-react-browse").join("README.md"), "dirty\n")
        .expect("dirty worktree");

    let outcome = run_release(
        &SystemRunner::default(),
        &settings(&fixture),
        &repositories(),
        "release/X",
        "release/Y",
    )
    .expect("run");
    assert!(outcome.is_completed(), "{outcome}");

    for repo in REPOS {
        assert_eq!(
            fixture
                .git(repo, &["rev-parse", "--abbrev-ref", "HEAD"])
                .expect("head"),
            "release/Y"
        );
        assert_eq!(
            fixture
                .git(repo, &["rev-parse", "--abbrev-ref", "release/Y@{upstream}"])
                .expect("upstream"),
            "origin/release/Y"
        );
        let remote_head = fixture
            .remote_git(repo, &["rev-parse", "refs/heads/release/Y"])
            .expect("remote branch");
        let local_head = fixture.git(repo, &["rev-parse", "HEAD"]).expect("local head");
        assert_eq!(remote_head, local_head, "{repo} pushed");

        let changed = fixture
            .git(repo, &["diff", "--name-only", "release/X", "release/Y"])
            .expect("diff");
        if repo == SHARED {
            assert_eq!(changed, "", "shared repository gets no commit");
        } else {
            assert_eq!(changed, ".gitmodules", "{repo} changes only the descriptor");
            assert_eq!(
                fixture
                    .git(repo, &["log", "-1", "--format=%s"])
                    .expect("subject"),
                "chore: create new release: release/Y"
            );
            let descriptor =
                fs::read_to_string(fixture.repo_path(repo).join(".gitmodules")).expect("read");
            assert!(descriptor.contains("\tbranch = release/Y\n"), "{descriptor}");
        }
    }

    let readme =
        fs::read_to_string(fixture.repo_path("pmc-react-browse").join("README.md")).expect("read");
    assert_eq!(readme, "# pmc-react-browse\n");
}

#[test]
fn existing_target_branch_aborts_and_leaves_later_repositories_untouched() {
    let fixture = GitFixture::new(&REPOS, "release/X").expect("fixture");
    fixture
        .git("pmc-react-login", &["branch", "release/Y"])
        .expect("pre-create branch");

    let outcome = run_release(
        &SystemRunner::default(),
        &settings(&fixture),
        &repositories(),
        "release/X",
        "release/Y",
    )
    .expect("run");

    match outcome {
        RunOutcome::Aborted {
            completed,
            repository,
            step,
            ..
        } => {
            assert_eq!(completed, vec!["pmc-react-browse".to_string()]);
            assert_eq!(repository, "pmc-react-login");
            assert_eq!(step, Step::CreateBranch);
        }
        other => panic!("unexpected outcome: {other}"),
    }

    // Already pushed repositories are not rolled back.
    fixture
        .remote_git("pmc-react-browse", &["rev-parse", "refs/heads/release/Y"])
        .expect("browse pushed");
    // The shared repository comes after the failure and was never touched.
    assert!(
        fixture
            .remote_git(SHARED, &["rev-parse", "--verify", "--quiet", "refs/heads/release/Y"])
            .is_err()
    );
    assert_eq!(
        fixture
            .git(SHARED, &["rev-parse", "--abbrev-ref", "HEAD"])
            .expect("head"),
        "release/X"
    );
}

#[test]
fn missing_source_branch_aborts_at_checkout() {
    let fixture = GitFixture::new(&REPOS, "release/X").expect("fixture");
    let outcome = run_release(
        &SystemRunner::default(),
        &settings(&fixture),
        &repositories(),
        "release/does-not-exist",
        "release/Y",
    )
    .expect("run");

    match outcome {
        RunOutcome::Aborted {
            completed,
            repository,
            step,
            cause,
        } => {
            assert!(completed.is_empty());
            assert_eq!(repository, "pmc-react-browse");
            assert_eq!(step, Step::Checkout);
            assert!(cause.to_string().contains("checkout release/does-not-exist"));
        }
        other => panic!("unexpected outcome: {other}"),
    }
}
