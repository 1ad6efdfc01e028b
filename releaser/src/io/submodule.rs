//! Read-modify-write of a repository's submodule descriptor.

use std::fs;
use std::path::Path;

use tracing::{debug, instrument};

use crate::core::submodule::rewrite_tracked_branch;
use crate::error::{ReleaseError, Result};

/// Point the descriptor at `path` to track `branch`.
///
/// The file must contain exactly one tracked-branch line; otherwise it is left
/// untouched and [`ReleaseError::MalformedDescriptor`] is returned.
#[instrument(skip_all, fields(path = %path.display(), branch))]
pub fn set_tracked_branch(path: &Path, branch: &str) -> Result<()> {
    let contents = fs::read_to_string(path).map_err(file_io("read", path))?;
    let rewrite = rewrite_tracked_branch(&contents, branch);
    if rewrite.matches != 1 {
        return Err(ReleaseError::MalformedDescriptor {
            path: path.to_path_buf(),
            matches: rewrite.matches,
        });
    }
    write_descriptor(path, &rewrite.text)?;
    debug!(branch, "descriptor updated");
    Ok(())
}

fn write_descriptor(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).map_err(file_io("write", path))
}

fn file_io(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> ReleaseError {
    let path = path.to_path_buf();
    move |source| ReleaseError::FileIo {
        action,
        path,
        source,
    }
}
