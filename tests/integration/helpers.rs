//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A directory holding the tool's working directory and a plugin git repository side by side:
///
/// ```text
/// <root>/tool      cwd for the binary, holds the default release.ini
/// <root>/<plugin>  git repository to publish
/// <root>/scratch   temp-dir for scratch resources
/// ```
pub struct TestRepo {
  _root: TempDir,
  pub root: PathBuf,
  pub tool: PathBuf,
  pub plugin: PathBuf,
  pub scratch: PathBuf,
}

impl TestRepo {
  /// Create the layout with an initial commit in the plugin repository
  pub fn new(plugin_name: &str) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    let tool = path.join("tool");
    let plugin = path.join(plugin_name);
    let scratch = path.join("scratch");

    std::fs::create_dir_all(&tool)?;
    std::fs::create_dir_all(&plugin)?;
    std::fs::create_dir_all(&scratch)?;

    git(&plugin, &["init", "--initial-branch=main"])?;
    git(&plugin, &["config", "user.name", "Test User"])?;
    git(&plugin, &["config", "user.email", "test@example.com"])?;

    std::fs::write(plugin.join("my-plugin.php"), "<?php\n/* Plugin Name: My Plugin */\n")?;
    git(&plugin, &["add", "."])?;
    git(&plugin, &["commit", "-m", "Initial commit"])?;

    Ok(Self {
      _root: root,
      root: path,
      tool,
      plugin,
      scratch,
    })
  }

  /// Create a lightweight tag at HEAD
  pub fn tag(&self, tag: &str) -> Result<()> {
    git(&self.plugin, &["tag", tag])?;
    Ok(())
  }

  /// Write the default release.ini in the tool directory
  pub fn write_defaults(&self, content: &str) -> Result<()> {
    std::fs::write(self.tool.join("release.ini"), content)?;
    Ok(())
  }

  /// Default release.ini pointing at an svn prefix that cannot be launched
  pub fn write_unreachable_svn_defaults(&self, extra: &str) -> Result<()> {
    self.write_defaults(&format!(
      "svn-url = https://svn.invalid/{{{{plugin-slug}}}}\nsvn-path = {}/\ntemp-dir = {}\n{}",
      self.root.join("no-such-bin").display(),
      self.scratch.display(),
      extra
    ))
  }

  pub fn write_plugin_file(&self, rel: &str, content: &str) -> Result<()> {
    let path = self.plugin.join(rel);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
  }

  /// Entries left in the scratch base directory
  pub fn scratch_entries(&self) -> Result<usize> {
    Ok(std::fs::read_dir(&self.scratch)?.count())
  }

  pub fn git_tags(&self) -> Result<Vec<String>> {
    let output = git(&self.plugin, &["tag", "--list"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the svn-release binary; a failing exit status is returned, not raised
pub fn run_svn_release(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_svn-release");

  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run svn-release")
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).into_owned()
}
