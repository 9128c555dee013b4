//! Scratch resources for one release run - allocate once, release on every path
//!
//! # Design
//!
//! StagingContext owns the two temporary resources a run needs: the scratch
//! directory (the destination working copy) and the scratch file (the exported
//! snapshot, later the captured status report). Both are allocated right after
//! configuration is resolved and handed to the pipeline.
//!
//! ```text
//! commands/publish.rs:
//!   StagingContext::create(&config.scratch_base) -> StagingContext
//!   |
//!   v
//! StagingPipeline::run(..)
//!   success -> teardown()   (errors surfaced)
//!   failure -> Drop         (best effort)
//! ```

use crate::core::error::{ReleaseResult, ResultExt};
use std::path::Path;
use tempfile::{Builder, TempDir, TempPath};

/// Name prefix for scratch directories and files
pub const SCRATCH_PREFIX: &str = "GWP";

/// Temporary directory and file exclusively owned by one run.
///
/// Dropping the context removes both; [`StagingContext::teardown`] does the
/// same but reports removal errors.
pub struct StagingContext {
  scratch_dir: TempDir,
  scratch_file: TempPath,
}

impl StagingContext {
  /// Allocate a fresh empty directory and file under `scratch_base`
  pub fn create(scratch_base: &Path) -> ReleaseResult<Self> {
    let scratch_dir = Builder::new()
      .prefix(SCRATCH_PREFIX)
      .tempdir_in(scratch_base)
      .with_context(|| format!("Failed to create scratch directory in {}", scratch_base.display()))?;

    let scratch_file = Builder::new()
      .prefix(SCRATCH_PREFIX)
      .tempfile_in(scratch_base)
      .with_context(|| format!("Failed to create scratch file in {}", scratch_base.display()))?
      .into_temp_path();

    tracing::debug!(
      dir = %scratch_dir.path().display(),
      file = %scratch_file.display(),
      "allocated scratch resources"
    );

    Ok(Self {
      scratch_dir,
      scratch_file,
    })
  }

  /// Destination working copy
  pub fn scratch_dir(&self) -> &Path {
    self.scratch_dir.path()
  }

  pub fn scratch_file(&self) -> &Path {
    &self.scratch_file
  }

  /// Remove both resources, surfacing any error
  pub fn teardown(self) -> ReleaseResult<()> {
    let dir = self.scratch_dir.path().to_path_buf();
    self.scratch_file.close().context("Failed to remove scratch file")?;
    self
      .scratch_dir
      .close()
      .with_context(|| format!("Failed to remove scratch directory {}", dir.display()))?;
    tracing::debug!(dir = %dir.display(), "released scratch resources");
    Ok(())
  }
}
