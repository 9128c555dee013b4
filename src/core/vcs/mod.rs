//! Version-control gateway
//!
//! Every git/svn interaction goes through [`CommandRunner`]: a program, an
//! argument list and a working directory in, exit status and captured text
//! out. Arguments are passed as a list and never interpolated into a shell
//! string. [`SourceRepo`] and [`DestinationRepo`] wrap the runner with the
//! handful of commands the release pipeline needs.

pub mod git;
pub mod svn;

#[cfg(test)]
pub mod fake;

pub use git::SourceRepo;
pub use svn::DestinationRepo;

use crate::core::error::{ReleaseResult, VcsError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A single external command
#[derive(Debug, Clone)]
pub struct Invocation {
  pub program: PathBuf,
  pub args: Vec<OsString>,
  pub cwd: PathBuf,
}

impl Invocation {
  pub fn new(program: &Path, cwd: &Path) -> Self {
    Self {
      program: program.to_path_buf(),
      args: Vec::new(),
      cwd: cwd.to_path_buf(),
    }
  }

  pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  /// Arguments as lossy UTF-8 strings
  pub fn arg_strings(&self) -> Vec<String> {
    self.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
  }

  /// Human-readable command line for logs and error messages
  pub fn display(&self) -> String {
    let mut parts = vec![self.program.display().to_string()];
    parts.extend(self.arg_strings());
    parts.join(" ")
  }
}

/// Captured result of an [`Invocation`]
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
  /// Exit code, `None` when terminated by a signal
  pub status: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl CommandOutput {
  pub fn success(&self) -> bool {
    self.status == Some(0)
  }

  /// stdout and stderr joined for error reports
  pub fn combined(&self) -> String {
    match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
      (_, true) => self.stdout.clone(),
      (true, false) => self.stderr.clone(),
      (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
    }
  }
}

/// Runs external commands to completion
pub trait CommandRunner {
  /// Launch `invocation` and wait for it.
  ///
  /// Only a failure to launch is an `Err`; a non-zero exit is reported through
  /// [`CommandOutput::status`].
  fn run(&self, invocation: &Invocation) -> ReleaseResult<CommandOutput>;
}

/// Runner backed by `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  fn run(&self, invocation: &Invocation) -> ReleaseResult<CommandOutput> {
    tracing::debug!(cwd = %invocation.cwd.display(), "running {}", invocation.display());

    let output = Command::new(&invocation.program)
      .args(&invocation.args)
      .current_dir(&invocation.cwd)
      // svn may ask for a password on the terminal
      .stdin(Stdio::inherit())
      // Keep svn/git output parseable regardless of the user's locale
      .env("LC_MESSAGES", "C")
      .output()
      .map_err(|e| VcsError::Spawn {
        program: invocation.program.clone(),
        reason: e.to_string(),
      })?;

    let result = CommandOutput {
      status: output.status.code(),
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    tracing::debug!(status = ?result.status, "finished {}", invocation.display());
    Ok(result)
  }
}

/// Turn a non-zero exit into [`VcsError::CommandFailed`]
pub(crate) fn require_success(invocation: &Invocation, output: CommandOutput) -> ReleaseResult<CommandOutput> {
  if output.success() {
    return Ok(output);
  }

  Err(
    VcsError::CommandFailed {
      command: invocation.display(),
      output: output.combined(),
    }
    .into(),
  )
}
