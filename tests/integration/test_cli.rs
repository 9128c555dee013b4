//! Argument handling and failures that happen before any scratch resources exist

use crate::helpers::{TestRepo, run_svn_release, stderr, stdout};
use anyhow::Result;

#[test]
fn test_requires_path_and_tag() -> Result<()> {
  let repo = TestRepo::new("my-plugin")?;

  let output = run_svn_release(&repo.tool, &["my-plugin"])?;

  assert_eq!(output.status.code(), Some(2));
  assert!(stderr(&output).contains("Usage"));
  assert_eq!(repo.scratch_entries()?, 0);
  Ok(())
}

#[test]
fn test_help_lists_arguments() -> Result<()> {
  let repo = TestRepo::new("my-plugin")?;

  let output = run_svn_release(&repo.tool, &["--help"])?;
  let text = stdout(&output);

  assert!(output.status.success());
  assert!(text.contains("<PATH>"));
  assert!(text.contains("<TAG>"));
  assert!(text.contains("--defaults"));
  Ok(())
}

#[test]
fn test_unknown_source_path() -> Result<()> {
  let repo = TestRepo::new("my-plugin")?;
  repo.write_defaults("svn-url = https://svn.invalid/x\n")?;

  let output = run_svn_release(&repo.tool, &["not-a-plugin", "1.0"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("Path to git repository not found"));
  Ok(())
}

#[test]
fn test_missing_default_config() -> Result<()> {
  let repo = TestRepo::new("my-plugin")?;

  let output = run_svn_release(&repo.tool, &["my-plugin", "1.0"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("Default configuration could not be loaded"));
  assert!(stderr(&output).contains("--defaults"));
  Ok(())
}

#[test]
fn test_defaults_flag_replaces_default_location() -> Result<()> {
  let repo = TestRepo::new("my-plugin")?;
  std::fs::write(repo.root.join("custom.ini"), "svn-url =\n")?;

  let output = run_svn_release(&repo.tool, &["--defaults", "../custom.ini", "my-plugin", "1.0"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("Missing required setting in config: svn-url"));
  Ok(())
}

#[test]
fn test_malformed_config_reports_line() -> Result<()> {
  let repo = TestRepo::new("my-plugin")?;
  repo.write_defaults("; comment\nsvn-url = https://svn.invalid/x\nthis is not a setting\n")?;

  let output = run_svn_release(&repo.tool, &["my-plugin", "1.0"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("line 3"));
  Ok(())
}
