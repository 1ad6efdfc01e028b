//! Tracked-branch rewrite for submodule descriptors (`.gitmodules`).
//!
//! The descriptor is handled as plain text so that everything except the
//! tracked-branch value survives byte-for-byte: line order, comments,
//! indentation, `\r\n` endings, and whether the file ends with a newline.

use std::sync::LazyLock;

use regex::Regex;

static BRANCH_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<prefix>\s*branch\s*=)").unwrap());

/// Result of rewriting descriptor text in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Rewritten descriptor text.
    pub text: String,
    /// Number of tracked-branch lines found (and replaced).
    pub matches: usize,
}

/// Replace the value of every `branch = ...` line with `branch`.
///
/// Callers decide what a match count other than one means; see
/// [`crate::io::submodule::set_tracked_branch`].
pub fn rewrite_tracked_branch(text: &str, branch: &str) -> Rewrite {
    let mut matches = 0;
    let lines: Vec<String> = text
        .split('\n')
        .map(|line| {
            let (body, cr) = match line.strip_suffix('\r') {
                Some(body) => (body, "\r"),
                None => (line, ""),
            };
            match BRANCH_LINE_RE.captures(body) {
                Some(caps) => {
                    matches += 1;
                    format!("{} {branch}{cr}", &caps["prefix"])
                }
                None => line.to_string(),
            }
        })
        .collect();
    Rewrite {
        text: lines.join("\n"),
        matches,
    }
}
