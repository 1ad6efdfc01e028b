//! Browser driver abstraction for the deploy workflow.
//!
//! The [`UiDriver`] trait decouples the deploy script from whatever actually
//! drives the browser. [`CommandDriver`] hands the script to an external
//! process as JSON lines; tests use a recording driver.

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::io::process::{DEFAULT_OUTPUT_LIMIT_BYTES, run_command};

/// One browser action, addressed by CSS selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UiAction {
    Navigate { url: String },
    Click { selector: String },
    Input { selector: String, text: String },
    /// Choose `value` in the element right after `selector`.
    SelectNext { selector: String, value: String },
    /// Select all text in the element right after `selector` and type `text`.
    ReplaceNext { selector: String, text: String },
    WaitFor { selector: String },
}

/// Executes a browser action script from start to finish.
pub trait UiDriver {
    fn perform(&self, script: &[UiAction]) -> Result<()>;
}

/// Driver that spawns an external browser automation command.
#[derive(Debug, Clone)]
pub struct CommandDriver {
    command: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandDriver {
    pub fn new(command: Vec<String>, timeout: Option<Duration>) -> Result<Self> {
        if command.is_empty() || command[0].trim().is_empty() {
            return Err(anyhow!("driver command must be non-empty"));
        }
        Ok(Self { command, timeout })
    }
}

impl UiDriver for CommandDriver {
    #[instrument(skip_all, fields(program = %self.command[0], actions = script.len()))]
    fn perform(&self, script: &[UiAction]) -> Result<()> {
        let payload = encode_script(script)?;
        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..]);

        info!("starting browser driver");
        let output = run_command(
            cmd,
            Some(payload.as_bytes()),
            self.timeout,
            DEFAULT_OUTPUT_LIMIT_BYTES,
        )
        .context("run browser driver")?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            debug!(line, "driver output");
        }
        if output.timed_out {
            warn!("browser driver timed out");
            return Err(anyhow!("browser driver timed out after {:?}", self.timeout));
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(exit_code = ?output.status.code(), "browser driver failed");
            return Err(anyhow!(
                "browser driver failed with status {:?}: {}",
                output.status.code(),
                stderr.trim()
            ));
        }
        Ok(())
    }
}

/// Serialize the script as newline-delimited JSON, one action per line.
pub fn encode_script(script: &[UiAction]) -> Result<String> {
    let mut payload = String::new();
    for action in script {
        payload.push_str(&serde_json::to_string(action).context("serialize ui action")?);
        payload.push('\n');
    }
    Ok(payload)
}
