//! Source/target branch pair for a release run.

use crate::error::{ReleaseError, Result};

/// Branch names applied identically to every repository in a run.
///
/// Only constructible through [`BranchSpec::new`], so both names are known to
/// be non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSpec {
    source: String,
    target: String,
}

impl BranchSpec {
    pub fn new(source: &str, target: &str) -> Result<Self> {
        let source = source.trim();
        let target = target.trim();
        let mut missing = Vec::new();
        if source.is_empty() {
            missing.push("source (--from)");
        }
        if target.is_empty() {
            missing.push("target (--to)");
        }
        if !missing.is_empty() {
            return Err(ReleaseError::Configuration(format!(
                "missing branch name: {}",
                missing.join(", ")
            )));
        }
        if source == target {
            return Err(ReleaseError::Configuration(format!(
                "source and target branch are both '{source}'"
            )));
        }
        Ok(Self {
            source: source.to_string(),
            target: target.to_string(),
        })
    }

    /// Branch every repository is cut from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Release branch created in every repository.
    pub fn target(&self) -> &str {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_trims_names() {
        let spec = BranchSpec::new(" release/R35.3a ", "release/R35.3b").expect("spec");
        assert_eq!(spec.source(), "release/R35.3a");
        assert_eq!(spec.target(), "release/R35.3b");
    }

    #[test]
    fn rejects_empty_source() {
        let err = BranchSpec::new("", "release/Y").expect_err("empty source");
        assert!(matches!(err, ReleaseError::Configuration(ref msg) if msg.contains("--from")));
    }

    #[test]
    fn rejects_blank_target() {
        let err = BranchSpec::new("release/X", "   ").expect_err("blank target");
        assert!(matches!(err, ReleaseError::Configuration(ref msg) if msg.contains("--to")));
    }

    #[test]
    fn reports_both_missing_names() {
        let err = BranchSpec::new("", "").expect_err("both empty");
        let msg = err.to_string();
        assert!(msg.contains("--from") && msg.contains("--to"), "{msg}");
    }

    #[test]
    fn rejects_identical_names() {
        let err = BranchSpec::new("release/X", "release/X").expect_err("same");
        assert!(matches!(err, ReleaseError::Configuration(_)));
    }
}
