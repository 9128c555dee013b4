//! Zip expansion of the exported git snapshot

use crate::core::error::{ReleaseResult, StageError};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use zip::ZipArchive;

/// Expand `archive` into `dest`, overwriting files that already exist.
///
/// Entries whose names would land outside `dest` are skipped. Returns the
/// number of entries written; an archive with no entries is an error.
pub fn expand_into(archive: &Path, dest: &Path) -> ReleaseResult<usize> {
  let file = File::open(archive).map_err(|e| extract_failed(format!("{}: {}", archive.display(), e)))?;
  let mut zip = ZipArchive::new(file).map_err(|e| extract_failed(e.to_string()))?;

  if zip.is_empty() {
    return Err(extract_failed("archive contains no entries".to_string()));
  }

  let mut written = 0;
  for index in 0..zip.len() {
    let mut entry = zip.by_index(index).map_err(|e| extract_failed(e.to_string()))?;

    let Some(relative) = entry.enclosed_name() else {
      tracing::warn!(name = entry.name(), "skipping archive entry outside the target directory");
      continue;
    };
    let target = dest.join(relative);

    if entry.is_dir() {
      fs::create_dir_all(&target).map_err(|e| extract_failed(format!("{}: {}", target.display(), e)))?;
    } else {
      if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| extract_failed(format!("{}: {}", parent.display(), e)))?;
      }
      let mut out = File::create(&target).map_err(|e| extract_failed(format!("{}: {}", target.display(), e)))?;
      io::copy(&mut entry, &mut out).map_err(|e| extract_failed(format!("{}: {}", target.display(), e)))?;
    }
    written += 1;
  }

  Ok(written)
}

fn extract_failed(reason: String) -> crate::core::error::ReleaseError {
  StageError::ExtractFailed { reason }.into()
}
