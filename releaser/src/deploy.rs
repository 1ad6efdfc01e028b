//! Jenkins deploy trigger.
//!
//! Builds the browser script that logs into Jenkins and starts one
//! parameterized build per repository, then hands it to a [`UiDriver`].

use anyhow::{Result, bail};
use tracing::{info, instrument};

use crate::io::config::DeployConfig;
use crate::io::credentials::Credentials;
use crate::io::driver::{UiAction, UiDriver};

pub const DEFAULT_ENV: &str = "dev2";
pub const DEFAULT_BRANCH: &str = "develop";

/// Environment and branch to deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    pub env: String,
    pub branch: String,
}

impl Default for DeployRequest {
    fn default() -> Self {
        Self {
            env: DEFAULT_ENV.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

/// Browser actions that trigger a build for every configured repository.
pub fn build_script(
    cfg: &DeployConfig,
    credentials: &Credentials,
    request: &DeployRequest,
) -> Vec<UiAction> {
    let mut script = vec![
        UiAction::Navigate {
            url: cfg.jenkins_url.clone(),
        },
        UiAction::Input {
            selector: "#j_username".to_string(),
            text: credentials.username.clone(),
        },
        UiAction::Input {
            selector: "input[name=j_password]".to_string(),
            text: credentials.password.clone(),
        },
        UiAction::Click {
            selector: "form button[type=submit]".to_string(),
        },
    ];

    for repository in &cfg.repositories {
        script.extend([
            UiAction::Click {
                selector: format!("a[href='job/{repository}/']"),
            },
            UiAction::Click {
                selector: "a[href*='/build?']".to_string(),
            },
            UiAction::SelectNext {
                selector: "input[value='ENV_TYPE']".to_string(),
                value: request.env.clone(),
            },
            UiAction::ReplaceNext {
                selector: "input[value='BRANCH']".to_string(),
                text: request.branch.clone(),
            },
            UiAction::Click {
                selector: "button[type='submit']".to_string(),
            },
            UiAction::WaitFor {
                selector: "#pipeline-box".to_string(),
            },
            UiAction::Navigate {
                url: cfg.jenkins_url.clone(),
            },
        ]);
    }
    script
}

/// Chat alert announcing a deployment in progress.
pub fn alert_message(env: &str) -> String {
    format!("(paloudspeaker) React deployment alert\n \nENV: {env}\nStatus: In progress (hourglassdone)")
}

/// Trigger the builds and return the alert message to share.
#[instrument(skip_all, fields(env = %request.env, branch = %request.branch))]
pub fn run_deploy<D: UiDriver>(
    driver: &D,
    cfg: &DeployConfig,
    credentials: &Credentials,
    request: &DeployRequest,
) -> Result<String> {
    if request.env.trim().is_empty() {
        bail!("deploy environment must be non-empty");
    }
    if request.branch.trim().is_empty() {
        bail!("deploy branch must be non-empty");
    }
    cfg.validate()?;

    let script = build_script(cfg, credentials, request);
    info!(
        repositories = cfg.repositories.len(),
        actions = script.len(),
        "triggering builds"
    );
    driver.perform(&script)?;
    info!("builds triggered");
    Ok(alert_message(&request.env))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingDriver {
        scripts: RefCell<Vec<Vec<UiAction>>>,
        fail: bool,
    }

    impl UiDriver for RecordingDriver {
        fn perform(&self, script: &[UiAction]) -> Result<()> {
            self.scripts.borrow_mut().push(script.to_vec());
            if self.fail {
                bail!("element #pipeline-box not found");
            }
            Ok(())
        }
    }

    fn config(repositories: &[&str]) -> DeployConfig {
        DeployConfig {
            jenkins_url: "https://ci.example/job/reimagined-he/".to_string(),
            repositories: repositories.iter().map(|r| r.to_string()).collect(),
            driver_command: vec!["driver".to_string()],
            ..DeployConfig::default()
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            username: "release-bot".to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[test]
    fn script_authenticates_then_triggers_each_job() {
        let request = DeployRequest {
            env: "qa1".to_string(),
            branch: "release/Y".to_string(),
        };
        let script = build_script(&config(&["browse", "login"]), &credentials(), &request);

        assert_eq!(script.len(), 4 + 2 * 7);
        assert_eq!(
            script[1],
            UiAction::Input {
                selector: "#j_username".to_string(),
                text: "release-bot".to_string()
            }
        );
        assert_eq!(
            script[4],
            UiAction::Click {
                selector: "a[href='job/browse/']".to_string()
            }
        );
        assert_eq!(
            script[6],
            UiAction::SelectNext {
                selector: "input[value='ENV_TYPE']".to_string(),
                value: "qa1".to_string()
            }
        );
        assert_eq!(
            script[7],
            UiAction::ReplaceNext {
                selector: "input[value='BRANCH']".to_string(),
                text: "release/Y".to_string()
            }
        );
        assert_eq!(
            script[11],
            UiAction::Click {
                selector: "a[href='job/login/']".to_string()
            }
        );
        assert_eq!(
            script.last(),
            Some(&UiAction::Navigate {
                url: "https://ci.example/job/reimagined-he/".to_string()
            })
        );
    }

    #[test]
    fn run_deploy_returns_alert_for_env() {
        let driver = RecordingDriver::default();
        let alert = run_deploy(
            &driver,
            &config(&["browse"]),
            &credentials(),
            &DeployRequest::default(),
        )
        .expect("deploy");
        assert_eq!(
            alert,
            "(paloudspeaker) React deployment alert\n \nENV: dev2\nStatus: In progress (hourglassdone)"
        );
        assert_eq!(driver.scripts.borrow().len(), 1);
    }

    #[test]
    fn empty_branch_never_reaches_driver() {
        let driver = RecordingDriver::default();
        let request = DeployRequest {
            env: "dev2".to_string(),
            branch: " ".to_string(),
        };
        assert!(run_deploy(&driver, &config(&["browse"]), &credentials(), &request).is_err());
        assert!(driver.scripts.borrow().is_empty());
    }

    #[test]
    fn driver_failure_propagates() {
        let driver = RecordingDriver {
            fail: true,
            ..RecordingDriver::default()
        };
        let err = run_deploy(
            &driver,
            &config(&["browse"]),
            &credentials(),
            &DeployRequest::default(),
        )
        .expect_err("driver fails");
        assert!(err.to_string().contains("#pipeline-box"));
    }
}
