//! Source repository operations (system git)

use super::{CommandOutput, CommandRunner, Invocation, require_success};
use crate::core::error::ReleaseResult;
use std::path::{Path, PathBuf};

/// The git working tree a release is cut from
pub struct SourceRepo<'r> {
  runner: &'r dyn CommandRunner,
  program: PathBuf,
  work_tree: PathBuf,
}

impl<'r> SourceRepo<'r> {
  pub fn new(runner: &'r dyn CommandRunner, program: PathBuf, work_tree: PathBuf) -> Self {
    Self {
      runner,
      program,
      work_tree,
    }
  }

  fn git(&self) -> Invocation {
    Invocation::new(&self.program, &self.work_tree)
  }

  fn run(&self, invocation: Invocation) -> ReleaseResult<CommandOutput> {
    self.runner.run(&invocation)
  }

  /// `git pull`; the raw output is returned so the caller can decide how fatal a failure is
  pub fn pull(&self) -> ReleaseResult<CommandOutput> {
    self.run(self.git().arg("pull"))
  }

  /// Does the tag `tag` exist and point at a commit?
  ///
  /// Only `refs/tags/` is consulted, so a branch or commit sharing the name
  /// does not count.
  pub fn has_tag(&self, tag: &str) -> ReleaseResult<bool> {
    let output = self.run(
      self
        .git()
        .args(["rev-parse", "--verify", "--quiet"])
        .arg(format!("refs/tags/{}^{{commit}}", tag)),
    )?;
    Ok(output.success())
  }

  /// Create an annotated tag at HEAD
  pub fn create_tag(&self, tag: &str, message: &str) -> ReleaseResult<()> {
    let invocation = self.git().args(["tag", "-a", tag, "-m", message]);
    let output = self.runner.run(&invocation)?;
    require_success(&invocation, output)?;
    Ok(())
  }

  /// Export `rev` as a zip archive at `output_file`
  pub fn archive_zip(&self, rev: &str, output_file: &Path) -> ReleaseResult<()> {
    let mut output_arg = std::ffi::OsString::from("--output=");
    output_arg.push(output_file.as_os_str());

    let invocation = self.git().args(["archive", "--format=zip"]).arg(output_arg).arg(rev);
    let output = self.runner.run(&invocation)?;
    require_success(&invocation, output)?;
    Ok(())
  }
}
