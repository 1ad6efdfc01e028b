//! Jenkins credentials read from a `.env` file.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

const USERNAME_KEY: &str = "JENKINS_USERNAME";
const PASSWORD_KEY: &str = "JENKINS_PASSWORD";

/// Username/password pair handed opaquely to the browser driver.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Read `JENKINS_USERNAME` and `JENKINS_PASSWORD` from the `.env` file at `path`.
///
/// Only the file is consulted; the process environment is left untouched.
pub fn load_credentials(path: &Path) -> Result<Credentials> {
    let entries = dotenvy::from_path_iter(path)
        .with_context(|| format!("read credentials {}", path.display()))?;

    let mut username = None;
    let mut password = None;
    for entry in entries {
        let (key, value) = entry.with_context(|| format!("parse {}", path.display()))?;
        match key.as_str() {
            USERNAME_KEY => username = Some(value),
            PASSWORD_KEY => password = Some(value),
            _ => {}
        }
    }

    let require = |value: Option<String>, key: &str| -> Result<String> {
        value
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("{key} missing or empty in {}", path.display()))
    };
    Ok(Credentials {
        username: require(username, USERNAME_KEY)?,
        password: require(password, PASSWORD_KEY)?,
    })
}
