//! Destination repository operations (system svn)

use super::{CommandOutput, CommandRunner, Invocation, require_success};
use crate::core::error::ReleaseResult;
use std::path::{Path, PathBuf};

/// One line of `svn status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
  pub marker: char,
  pub path: String,
}

impl StatusEntry {
  /// `?`: present on disk, not under version control
  pub fn is_untracked(&self) -> bool {
    self.marker == '?'
  }

  /// `!`: versioned but missing from disk
  pub fn is_missing(&self) -> bool {
    self.marker == '!'
  }
}

/// Parse `svn status` output.
///
/// The first column is the item status; the path starts after the seven
/// status columns and a separating space.
pub fn parse_status(output: &str) -> Vec<StatusEntry> {
  output
    .lines()
    .filter_map(|line| {
      let marker = line.chars().next()?;
      if marker == ' ' || line.starts_with("Performing status") {
        return None;
      }

      let rest = match line.get(8..) {
        Some(rest) if line.len() > 8 => rest,
        _ => line.get(1..).unwrap_or(""),
      };
      let path = rest.trim();
      (!path.is_empty()).then(|| StatusEntry {
        marker,
        path: path.to_string(),
      })
    })
    .collect()
}

/// svn treats the last `@` in a path as a peg revision; a trailing `@` keeps it literal
pub fn peg_safe(path: &str) -> String {
  if path.contains('@') {
    format!("{}@", path)
  } else {
    path.to_string()
  }
}

/// The Subversion repository and the working copy staged for commit
pub struct DestinationRepo<'r> {
  runner: &'r dyn CommandRunner,
  program: PathBuf,
  username: Option<String>,
  work_copy: PathBuf,
}

impl<'r> DestinationRepo<'r> {
  pub fn new(runner: &'r dyn CommandRunner, program: PathBuf, username: Option<String>, work_copy: PathBuf) -> Self {
    Self {
      runner,
      program,
      username,
      work_copy,
    }
  }

  pub fn work_copy(&self) -> &Path {
    &self.work_copy
  }

  fn svn(&self) -> Invocation {
    Invocation::new(&self.program, &self.work_copy)
  }

  /// Subcommand that talks to the server, with the account override applied
  fn remote(&self, subcommand: &str) -> Invocation {
    let invocation = self.svn().arg(subcommand);
    match &self.username {
      Some(user) => invocation.args(["--username", user.as_str()]),
      None => invocation,
    }
  }

  fn run(&self, invocation: &Invocation) -> ReleaseResult<CommandOutput> {
    self.runner.run(invocation)
  }

  /// Does `url` exist in the repository?
  pub fn exists(&self, url: &str) -> ReleaseResult<bool> {
    let output = self.run(&self.remote("info").arg(url))?;
    Ok(output.success())
  }

  /// Check out `url` into the working copy directory
  pub fn checkout(&self, url: &str) -> ReleaseResult<CommandOutput> {
    self.run(&self.remote("checkout").arg(url).arg(self.work_copy.as_os_str()))
  }

  /// Raw `svn status` text for the working copy
  pub fn status(&self) -> ReleaseResult<String> {
    let invocation = self.svn().arg("status");
    let output = self.run(&invocation)?;
    Ok(require_success(&invocation, output)?.stdout)
  }

  /// Schedule a path for addition; returns the raw output so callers can collect failures
  pub fn add(&self, path: &str) -> ReleaseResult<CommandOutput> {
    self.run(&self.svn().arg("add").arg(peg_safe(path)))
  }

  /// Schedule a path for deletion
  pub fn delete(&self, path: &str) -> ReleaseResult<CommandOutput> {
    self.run(&self.svn().args(["delete", "--force"]).arg(peg_safe(path)))
  }

  /// Commit the working copy
  pub fn commit(&self, message: &str) -> ReleaseResult<CommandOutput> {
    self.run(&self.remote("commit").args(["-m", message]))
  }

  /// Server-side copy, used to publish a tag from trunk
  pub fn copy(&self, from_url: &str, to_url: &str, message: &str) -> ReleaseResult<CommandOutput> {
    self.run(&self.remote("copy").args([from_url, to_url, "-m", message]))
  }
}
