//! Directory tree enumeration and reconciliation
//!
//! Trees are flattened into sets of `/`-separated relative paths with
//! directories included, so a directory that only exists on the destination
//! side shows up as a single deletable entry.

use crate::core::error::ReleaseResult;
use crate::utils::path_to_slash;
use std::collections::BTreeSet;
use std::path::Path;
use walkdir::WalkDir;

/// Subversion working-copy metadata directory
pub const SVN_METADATA_DIR: &str = ".svn";

/// Generated readme, never a deletion candidate
pub const README_FILE_NAME: &str = "readme.txt";

/// Relative paths of one tree, files and directories alike
pub type FileSet = BTreeSet<String>;

/// Every file and directory under `root`, relative to it
pub fn enumerate(root: &Path) -> ReleaseResult<FileSet> {
  enumerate_excluding(root, &[])
}

/// Like [`enumerate`], pruning any entry named in `excluded` (and everything beneath it).
///
/// Symlinks are recorded as entries but never followed, so a link cycle cannot
/// make the walk loop.
pub fn enumerate_excluding(root: &Path, excluded: &[&str]) -> ReleaseResult<FileSet> {
  let mut files = FileSet::new();

  let walker = WalkDir::new(root)
    .min_depth(1)
    .follow_links(false)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|entry| {
      let name = entry.file_name().to_string_lossy();
      !excluded.iter().any(|skip| name == *skip)
    });

  for entry in walker {
    let entry = entry?;
    let relative = entry.path().strip_prefix(root)?;
    files.insert(path_to_slash(relative));
  }

  Ok(files)
}

/// Destination entries that have no counterpart in the source tree.
///
/// The svn metadata directory and the generated readme are destination-only
/// by design and never returned.
pub fn reconcile(source: &FileSet, dest: &FileSet) -> FileSet {
  dest
    .difference(source)
    .filter(|path| !is_protected(path))
    .cloned()
    .collect()
}

fn is_protected(path: &str) -> bool {
  let first = path.split('/').next().unwrap_or(path);
  first == SVN_METADATA_DIR || path == README_FILE_NAME
}

/// Drop entries whose ancestor directory is also in the set.
///
/// Deleting a directory removes its contents, so only the topmost entry needs
/// an explicit delete.
pub fn collapse_nested(paths: &FileSet) -> Vec<String> {
  let mut kept: Vec<String> = Vec::new();

  for path in paths {
    let covered = kept
      .iter()
      .any(|parent| path.len() > parent.len() && path.starts_with(parent.as_str()) && path[parent.len()..].starts_with('/'));
    if !covered {
      kept.push(path.clone());
    }
  }

  kept
}
