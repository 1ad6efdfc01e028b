//! Releaser configuration stored in `releaser.toml`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "releaser.toml";

/// Releaser configuration (TOML).
///
/// Missing fields default to the front-end project layout the tool was built
/// for; most setups only need `base_dir`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReleaserConfig {
    /// Directory holding one working copy per repository.
    pub base_dir: PathBuf,

    /// Repositories to branch-cut, processed in this order.
    pub repositories: Vec<String>,

    /// Repository consumed by the others as a submodule. It is branched and
    /// pushed but never committed to.
    pub shared_repository: String,

    /// Git executable to invoke.
    pub git: String,

    /// Remote the release branch is pushed to.
    pub remote: String,

    /// Submodule descriptor path, relative to each repository.
    pub descriptor_file: PathBuf,

    /// Commit message for the descriptor change; `{branch}` is replaced by the
    /// release branch name.
    pub commit_message: String,

    /// Kill a git invocation after this many seconds. Unset waits forever.
    pub command_timeout_secs: Option<u64>,

    /// Bound on captured stdout/stderr per git invocation.
    pub output_limit_bytes: usize,

    pub deploy: DeployConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeployConfig {
    /// Jenkins folder listing one build job per repository.
    pub jenkins_url: String,

    /// Repositories whose jobs are triggered, in this order.
    pub repositories: Vec<String>,

    /// `.env` file with `JENKINS_USERNAME` and `JENKINS_PASSWORD`.
    pub credentials_path: PathBuf,

    /// Browser driver command (e.g. `["node","jenkins-driver.js"]`). It reads
    /// one JSON action per line on stdin.
    pub driver_command: Vec<String>,

    /// Kill the browser driver after this many seconds. Unset waits forever.
    pub driver_timeout_secs: Option<u64>,
}

const PROJECT_REPOSITORIES: [&str; 4] = [
    "pmc-react-browse",
    "pmc-react-login",
    "pmc-react-myaccount",
    "pmc-react-replocator",
];
const SHARED_REPOSITORY: &str = "pmc-react-shared";

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            jenkins_url: "https://jenkins-mgmt-sys-dev-ew1.pmc.pearsondev.tech/job/DevOps/job/checkout-reactjs-gold/job/reimagined-he/".to_string(),
            repositories: PROJECT_REPOSITORIES.iter().map(|r| r.to_string()).collect(),
            credentials_path: PathBuf::from("env/.env"),
            driver_command: Vec::new(),
            driver_timeout_secs: None,
        }
    }
}

impl Default for ReleaserConfig {
    fn default() -> Self {
        let mut repositories: Vec<String> =
            PROJECT_REPOSITORIES.iter().map(|r| r.to_string()).collect();
        repositories.push(SHARED_REPOSITORY.to_string());
        Self {
            base_dir: PathBuf::from("."),
            repositories,
            shared_repository: SHARED_REPOSITORY.to_string(),
            git: "git".to_string(),
            remote: "origin".to_string(),
            descriptor_file: PathBuf::from(".gitmodules"),
            commit_message: "chore: create new release: {branch}".to_string(),
            command_timeout_secs: None,
            output_limit_bytes: 1_000_000,
            deploy: DeployConfig::default(),
        }
    }
}

impl ReleaserConfig {
    pub fn validate(&self) -> Result<()> {
        validate_repository_names("repositories", &self.repositories)?;
        if !self.repositories.contains(&self.shared_repository) {
            return Err(anyhow!(
                "shared_repository '{}' is not listed in repositories",
                self.shared_repository
            ));
        }
        if self.git.trim().is_empty() {
            return Err(anyhow!("git must be non-empty"));
        }
        if self.remote.trim().is_empty() {
            return Err(anyhow!("remote must be non-empty"));
        }
        if self.descriptor_file.as_os_str().is_empty() || self.descriptor_file.is_absolute() {
            return Err(anyhow!("descriptor_file must be a relative path"));
        }
        if self.commit_message.trim().is_empty() {
            return Err(anyhow!("commit_message must be non-empty"));
        }
        if self.command_timeout_secs == Some(0) {
            return Err(anyhow!("command_timeout_secs must be > 0 when set"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

impl DeployConfig {
    /// Checked when running `deploy` only, so release-only setups need no
    /// driver configured.
    pub fn validate(&self) -> Result<()> {
        if self.jenkins_url.trim().is_empty() {
            return Err(anyhow!("deploy.jenkins_url must be non-empty"));
        }
        validate_repository_names("deploy.repositories", &self.repositories)?;
        if self.driver_command.is_empty() || self.driver_command[0].trim().is_empty() {
            return Err(anyhow!("deploy.driver_command must be a non-empty array"));
        }
        if self.driver_timeout_secs == Some(0) {
            return Err(anyhow!("deploy.driver_timeout_secs must be > 0 when set"));
        }
        Ok(())
    }

    pub fn driver_timeout(&self) -> Option<Duration> {
        self.driver_timeout_secs.map(Duration::from_secs)
    }
}

fn validate_repository_names(field: &str, names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Err(anyhow!("{field} must list at least one repository"));
    }
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(anyhow!("{field}: invalid repository name '{name}'"));
        }
        if !seen.insert(name.as_str()) {
            return Err(anyhow!("{field}: duplicate repository '{name}'"));
        }
    }
    Ok(())
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ReleaserConfig::default()`.
pub fn load_config(path: &Path) -> Result<ReleaserConfig> {
    if !path.exists() {
        let cfg = ReleaserConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ReleaserConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}
