//! Resolve the user-supplied path-or-slug argument to the git working tree

use crate::core::error::{ReleaseError, ReleaseResult};
use crate::utils::is_anchored_path;
use std::path::{Path, PathBuf};

/// Resolve `raw` against `cwd`.
///
/// Anchored inputs are taken as given (joined onto `cwd` when relative). A bare
/// name lives next to the directory the tool runs from, so it is resolved
/// against `cwd`'s parent. The result is canonical and must be a directory.
pub fn resolve_source_path(raw: &str, cwd: &Path) -> ReleaseResult<PathBuf> {
  let candidate = if is_anchored_path(raw) {
    cwd.join(raw)
  } else {
    let parent = cwd.parent().unwrap_or(cwd);
    parent.join(raw)
  };

  match candidate.canonicalize() {
    Ok(path) if path.is_dir() => Ok(path),
    _ => Err(ReleaseError::PathNotFound { path: candidate }),
  }
}
