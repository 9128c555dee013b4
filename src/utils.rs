//! Utility functions for cross-platform path handling

use std::path::Path;

/// Check if a user-supplied source path is anchored (absolute or explicitly relative)
///
/// Returns true for:
/// - Unix absolute paths: /path/to/repo
/// - Relative paths: ./repo, ../repo, .
/// - Windows paths: \\server\share, \repo, C:\repo, C:repo
///
/// Returns false for bare names such as `my-plugin`, which are resolved next
/// to the current directory by the caller.
pub fn is_anchored_path(path: &str) -> bool {
  let bytes = path.as_bytes();

  match bytes.first() {
    Some(b'.') | Some(b'/') | Some(b'\\') => return true,
    None => return false,
    _ => {}
  }

  // Drive letter (C:\repo, C:/repo, C:repo)
  bytes.get(1) == Some(&b':')
}

/// Convert a path to slash format (always forward slashes)
///
/// Relative path sets are compared as strings, so both trees must use the
/// same separator regardless of platform.
pub fn path_to_slash(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}
