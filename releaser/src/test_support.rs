//! Test-only helpers: a scripted process runner and repository fixtures.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::error::ReleaseError;
use crate::io::config::ReleaserConfig;
use crate::io::process::{ProcessRunner, render_command};
use crate::release::ReleaseSettings;

/// Descriptor written into every fixture repository.
pub const FIXTURE_DESCRIPTOR: &str = "[submodule \"src/shared\"]\n\tpath = src/shared\n\turl = ../pmc-react-shared.git\n\tbranch = release/X\n";

/// One recorded call to [`ScriptedRunner::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub workdir: PathBuf,
}

impl Invocation {
    /// Arguments joined with spaces, e.g. `checkout -b release/Y`.
    pub fn command(&self) -> String {
        self.args.join(" ")
    }
}

/// Process runner that records every invocation and never spawns anything.
///
/// Commands succeed with empty output unless a canned output or a failure was
/// registered for them. Matching is by prefix of the space-joined arguments.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    outputs: Vec<(String, String)>,
    failures: Vec<(PathBuf, String)>,
    invocations: RefCell<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `output` for commands starting with `prefix`.
    pub fn with_output(mut self, prefix: &str, output: &str) -> Self {
        self.outputs.push((prefix.to_string(), output.to_string()));
        self
    }

    /// Fail commands starting with `prefix` when run in `workdir`.
    pub fn fail_on(mut self, workdir: impl Into<PathBuf>, prefix: &str) -> Self {
        self.failures.push((workdir.into(), prefix.to_string()));
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }

    /// Commands run in `workdir`, in order.
    pub fn commands_in(&self, workdir: &Path) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .filter(|inv| inv.workdir == workdir)
            .map(Invocation::command)
            .collect()
    }

    /// Directory names of every workdir that saw a command, in first-seen order.
    pub fn touched_repositories(&self) -> Vec<String> {
        let invocations = self.invocations.borrow();
        let mut seen: Vec<String> = Vec::new();
        for inv in &*invocations {
            let name = inv
                .workdir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[&str], workdir: &Path) -> crate::error::Result<String> {
        let invocation = Invocation {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            workdir: workdir.to_path_buf(),
        };
        let command = invocation.command();
        self.invocations.borrow_mut().push(invocation);

        if self
            .failures
            .iter()
            .any(|(dir, prefix)| dir == workdir && command.starts_with(prefix.as_str()))
        {
            return Err(ReleaseError::ExternalTool {
                command: render_command(program, args),
                workdir: workdir.to_path_buf(),
                message: "scripted failure".to_string(),
            });
        }
        let output = self
            .outputs
            .iter()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_default();
        Ok(output)
    }
}

/// Temp base directory with one plain (non-git) directory per repository,
/// each holding [`FIXTURE_DESCRIPTOR`]. Pairs with [`ScriptedRunner`].
pub struct TestWorkspace {
    _temp: TempDir,
    base: PathBuf,
}

impl TestWorkspace {
    pub fn new(repositories: &[&str]) -> Result<Self> {
        let temp = tempfile::tempdir().context("tempdir")?;
        let base = temp.path().to_path_buf();
        for name in repositories {
            let dir = base.join(name);
            fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
            fs::write(dir.join(".gitmodules"), FIXTURE_DESCRIPTOR)
                .with_context(|| format!("write descriptor in {}", dir.display()))?;
        }
        Ok(Self { _temp: temp, base })
    }

    pub fn repo_path(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }

    /// Release settings rooted at this workspace, with defaults otherwise.
    pub fn settings(&self, shared_repository: &str) -> ReleaseSettings {
        let cfg = ReleaserConfig {
            base_dir: self.base.clone(),
            shared_repository: shared_repository.to_string(),
            ..ReleaserConfig::default()
        };
        ReleaseSettings::from(&cfg)
    }

    /// Current descriptor text (empty if unreadable).
    pub fn descriptor(&self, name: &str) -> String {
        fs::read_to_string(self.repo_path(name).join(".gitmodules")).unwrap_or_default()
    }

    pub fn write_descriptor(&self, name: &str, contents: &str) -> Result<()> {
        let path = self.repo_path(name).join(".gitmodules");
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }
}

/// Real git repositories for end-to-end runs: one bare remote and one working
/// copy per repository, each working copy on `source_branch` with upstream set.
pub struct GitFixture {
    _temp: TempDir,
    work_dir: PathBuf,
    remotes_dir: PathBuf,
}

impl GitFixture {
    pub fn new(repositories: &[&str], source_branch: &str) -> Result<Self> {
        let temp = tempfile::tempdir().context("tempdir")?;
        let work_dir = temp.path().join("work");
        let remotes_dir = temp.path().join("remotes");
        fs::create_dir_all(&work_dir).context("create work dir")?;
        fs::create_dir_all(&remotes_dir).context("create remotes dir")?;

        for name in repositories {
            let remote = remotes_dir.join(format!("{name}.git"));
            fs::create_dir_all(&remote).context("create remote dir")?;
            run_git(&remote, &["init", "--bare", "--quiet"])?;

            let repo = work_dir.join(name);
            fs::create_dir_all(&repo).context("create repo dir")?;
            run_git(&repo, &["init", "--quiet"])?;
            run_git(&repo, &["config", "user.name", "Release Bot"])?;
            run_git(&repo, &["config", "user.email", "release-bot@local.invalid"])?;
            run_git(&repo, &["config", "commit.gpgsign", "false"])?;
            fs::write(repo.join(".gitmodules"), FIXTURE_DESCRIPTOR).context("write descriptor")?;
            fs::write(repo.join("README.md"), format!("# {name}\n")).context("write readme")?;
            run_git(&repo, &["add", "."])?;
            run_git(&repo, &["commit", "--quiet", "-m", "chore: bootstrap"])?;
            run_git(&repo, &["checkout", "--quiet", "-b", source_branch])?;
            let remote_url = remote.to_string_lossy().into_owned();
            run_git(&repo, &["remote", "add", "origin", &remote_url])?;
            run_git(&repo, &["push", "--quiet", "-u", "origin", source_branch])?;
        }

        Ok(Self {
            _temp: temp,
            work_dir,
            remotes_dir,
        })
    }

    /// Base directory holding the working copies.
    pub fn base_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn repo_path(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }

    pub fn remote_path(&self, name: &str) -> PathBuf {
        self.remotes_dir.join(format!("{name}.git"))
    }

    /// Run git in the working copy of `name` and return trimmed stdout.
    pub fn git(&self, name: &str, args: &[&str]) -> Result<String> {
        run_git(&self.repo_path(name), args)
    }

    /// Run git in the bare remote of `name` and return trimmed stdout.
    pub fn remote_git(&self, name: &str, args: &[&str]) -> Result<String> {
        run_git(&self.remote_path(name), args)
    }
}

fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .with_context(|| format!("spawn git {}", args.join(" ")))?;
    if !out.status.success() {
        return Err(anyhow!(
            "git {} failed in {}: {}",
            args.join(" "),
            dir.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}
