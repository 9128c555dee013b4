//! Staged release pipeline
//!
//! Drives one tag from the git working tree into `<svn-url>/trunk` and
//! `<svn-url>/tags/<tag>`:
//!
//! ```text
//! Init -> ConfigResolved -> RepoValidated -> DestCheckedOut -> SnapshotExtracted
//!      -> ReadmeGenerated -> FilesPruned -> AddsStaged -> DeletesStaged
//!      -> Confirmed -> Committed -> Done
//! ```
//!
//! Any stage may fail into `Aborted`; the failed run hands back its report with
//! the last completed stage recorded. The pipeline owns the [`StagingContext`]
//! for the whole run, so scratch resources are released whichever way `run`
//! returns. Nothing is retried; the `git pull` refresh is the only step whose
//! failure is tolerated.

use crate::core::archive;
use crate::core::config::ResolvedConfig;
use crate::core::context::StagingContext;
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt, StageError};
use crate::core::readme;
use crate::core::tree::{self, FileSet, SVN_METADATA_DIR};
use crate::core::vcs::svn::parse_status;
use crate::core::vcs::{CommandRunner, DestinationRepo, SourceRepo};
use crate::ui::progress::PathProgress;
use crate::ui::prompt::{self, CONFIRM_TOKEN, Prompt};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Pipeline checkpoints, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  Init,
  ConfigResolved,
  RepoValidated,
  DestCheckedOut,
  SnapshotExtracted,
  ReadmeGenerated,
  FilesPruned,
  AddsStaged,
  DeletesStaged,
  Confirmed,
  Committed,
  Done,
  Aborted,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Stage::Init => "init",
      Stage::ConfigResolved => "config-resolved",
      Stage::RepoValidated => "repo-validated",
      Stage::DestCheckedOut => "dest-checked-out",
      Stage::SnapshotExtracted => "snapshot-extracted",
      Stage::ReadmeGenerated => "readme-generated",
      Stage::FilesPruned => "files-pruned",
      Stage::AddsStaged => "adds-staged",
      Stage::DeletesStaged => "deletes-staged",
      Stage::Confirmed => "confirmed",
      Stage::Committed => "committed",
      Stage::Done => "done",
      Stage::Aborted => "aborted",
    };
    write!(f, "{}", name)
  }
}

/// Outcome of a completed release, printed with `--json`
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
  pub tag: String,
  pub slug: String,
  pub source_path: PathBuf,
  pub svn_url: String,
  pub stage: Stage,
  /// Set when the run aborted
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_completed: Option<Stage>,
  /// Whether the git tag had to be created
  pub git_tag_created: bool,
  pub readme_generated: bool,
  /// Delete-list entries removed from the working copy
  pub pruned: Vec<String>,
  pub added: Vec<String>,
  pub deleted: Vec<String>,
  pub committed: bool,
  pub tagged: bool,
  pub started_at: DateTime<Utc>,
  pub finished_at: Option<DateTime<Utc>>,
}

impl PublishReport {
  fn new(config: &ResolvedConfig) -> Self {
    Self {
      tag: config.tag.clone(),
      slug: config.slug.clone(),
      source_path: config.source_path.clone(),
      svn_url: config.svn_url().to_string(),
      stage: Stage::Init,
      last_completed: None,
      git_tag_created: false,
      readme_generated: false,
      pruned: Vec::new(),
      added: Vec::new(),
      deleted: Vec::new(),
      committed: false,
      tagged: false,
      started_at: Utc::now(),
      finished_at: None,
    }
  }
}

/// A run that stopped before `Done`
#[derive(Debug)]
pub struct AbortedRun {
  /// Report with `stage` set to [`Stage::Aborted`]
  pub report: PublishReport,
  pub error: ReleaseError,
}

/// One release run over a resolved configuration
pub struct StagingPipeline<'a> {
  config: &'a ResolvedConfig,
  runner: &'a dyn CommandRunner,
  context: StagingContext,
  report: PublishReport,
}

impl<'a> StagingPipeline<'a> {
  /// Allocate scratch resources for a run
  pub fn new(config: &'a ResolvedConfig, runner: &'a dyn CommandRunner) -> ReleaseResult<Self> {
    let context = StagingContext::create(&config.scratch_base)?;

    let mut pipeline = Self {
      config,
      runner,
      context,
      report: PublishReport::new(config),
    };
    pipeline.advance(Stage::ConfigResolved);
    Ok(pipeline)
  }

  /// Execute every stage, then release scratch resources.
  ///
  /// On error the pipeline is dropped on the way out, which removes the
  /// scratch directory and file. Once the commit has landed, a failure to
  /// remove them is only logged.
  pub fn run(mut self, prompt: &mut dyn Prompt) -> Result<PublishReport, Box<AbortedRun>> {
    if let Err(error) = self.execute(prompt) {
      tracing::debug!(from = %self.report.stage, to = %Stage::Aborted, "release aborted: {}", error);
      let Self { mut report, .. } = self;
      report.last_completed = Some(report.stage);
      report.stage = Stage::Aborted;
      report.finished_at = Some(Utc::now());
      return Err(Box::new(AbortedRun { report, error }));
    }

    let Self { context, mut report, .. } = self;
    if let Err(e) = context.teardown() {
      tracing::warn!("failed to remove scratch resources: {}", e);
    }

    report.stage = Stage::Done;
    report.finished_at = Some(Utc::now());
    println!("✅ Released {} {}", report.slug, report.tag);
    Ok(report)
  }

  fn advance(&mut self, stage: Stage) {
    tracing::debug!(from = %self.report.stage, to = %stage, "stage complete");
    self.report.stage = stage;
  }

  fn execute(&mut self, prompt: &mut dyn Prompt) -> ReleaseResult<()> {
    let config = self.config;
    let source = SourceRepo::new(self.runner, config.git_program(), config.source_path.clone());
    let dest = DestinationRepo::new(
      self.runner,
      config.svn_program(),
      config.username.clone(),
      self.context.scratch_dir().to_path_buf(),
    );

    self.validate_source(&source)?;
    self.advance(Stage::RepoValidated);

    self.checkout_destination(&dest)?;
    self.advance(Stage::DestCheckedOut);

    self.extract_snapshot(&source)?;
    self.advance(Stage::SnapshotExtracted);

    self.generate_readme()?;
    self.advance(Stage::ReadmeGenerated);

    self.prune_files()?;
    self.advance(Stage::FilesPruned);

    let missing = self.stage_adds(&dest)?;
    self.advance(Stage::AddsStaged);

    self.stage_deletes(&dest, missing)?;
    self.advance(Stage::DeletesStaged);

    self.confirm(prompt)?;
    self.advance(Stage::Confirmed);

    self.commit(&dest)?;
    self.advance(Stage::Committed);

    Ok(())
  }

  /// Refresh the source repo and make sure the tag exists, creating it when allowed
  fn validate_source(&mut self, source: &SourceRepo) -> ReleaseResult<()> {
    let tag = &self.config.tag;

    println!("🔄 Updating git repository...");
    match source.pull() {
      Ok(output) if output.success() => {}
      Ok(output) => tracing::warn!("git pull failed, continuing with local state: {}", output.combined().trim()),
      Err(e) => tracing::warn!("git pull failed, continuing with local state: {}", e),
    }

    if source.has_tag(tag)? {
      println!("🏷️  Found tag {} in git", tag);
      return Ok(());
    }

    if self.config.git_do_not_tag() {
      return Err(
        StageError::SourceTagMissing {
          tag: tag.clone(),
          reason: "the tag does not exist and git-do-not-tag is set".to_string(),
        }
        .into(),
      );
    }

    println!("🏷️  Tagging {} in git", tag);
    source.create_tag(tag, self.config.git_tag_message())?;
    if !source.has_tag(tag)? {
      return Err(
        StageError::SourceTagMissing {
          tag: tag.clone(),
          reason: "the tag could not be found after creating it".to_string(),
        }
        .into(),
      );
    }

    self.report.git_tag_created = true;
    Ok(())
  }

  /// Refuse to overwrite a published tag, then check out trunk into the scratch directory
  fn checkout_destination(&mut self, dest: &DestinationRepo) -> ReleaseResult<()> {
    if !self.config.svn_do_not_tag() {
      let tag_url = self.config.tag_url();
      if dest.exists(&tag_url)? {
        return Err(StageError::TagAlreadyExists { url: tag_url }.into());
      }
    }

    let trunk_url = self.config.trunk_url();
    println!("📥 Checking out {}", trunk_url);
    let output = dest.checkout(&trunk_url)?;
    if !output.success() {
      return Err(
        StageError::CheckoutFailed {
          url: trunk_url,
          output: output.combined(),
        }
        .into(),
      );
    }

    Ok(())
  }

  /// Export the tag from git and expand it over the working copy
  fn extract_snapshot(&mut self, source: &SourceRepo) -> ReleaseResult<()> {
    println!("📦 Exporting {} from git", self.config.tag);

    let archive_path = self.context.scratch_file();
    source
      .archive_zip(&self.config.tag, archive_path)
      .map_err(|e| StageError::ExtractFailed { reason: e.to_string() })?;

    let entries = archive::expand_into(archive_path, self.context.scratch_dir())?;
    tracing::debug!(entries, "snapshot expanded");
    Ok(())
  }

  fn generate_readme(&mut self) -> ReleaseResult<()> {
    let written = readme::generate(
      &self.config.source_path,
      self.config.readme_template(),
      self.config.changelog(),
      &self.config.placeholders,
      self.context.scratch_dir(),
    )?;

    if written.is_some() {
      println!("📝 Generated readme.txt");
      self.report.readme_generated = true;
    }
    Ok(())
  }

  /// Remove `DeleteFiles` / `DeleteDirs` entries from the working copy
  fn prune_files(&mut self) -> ReleaseResult<()> {
    let root = self.context.scratch_dir().to_path_buf();

    for entry in self.config.delete_files() {
      let Some(target) = contained_path(&root, &entry) else {
        tracing::warn!(entry = %entry, "DeleteFiles entry points outside the working copy, skipping");
        continue;
      };
      if target.is_dir() {
        tracing::warn!(entry = %entry, "DeleteFiles entry is a directory, skipping");
        continue;
      }
      if target.symlink_metadata().is_err() {
        tracing::debug!(entry = %entry, "DeleteFiles entry not present");
        continue;
      }
      std::fs::remove_file(&target).with_context(|| format!("Failed to delete {}", target.display()))?;
      self.report.pruned.push(entry);
    }

    for entry in self.config.delete_dirs() {
      let Some(target) = contained_path(&root, &entry) else {
        tracing::warn!(entry = %entry, "DeleteDirs entry points outside the working copy, skipping");
        continue;
      };
      if !target.is_dir() {
        tracing::debug!(entry = %entry, "DeleteDirs entry not present");
        continue;
      }
      std::fs::remove_dir_all(&target).with_context(|| format!("Failed to delete {}", target.display()))?;
      self.report.pruned.push(entry);
    }

    if !self.report.pruned.is_empty() {
      println!("🧹 Removed {} excluded path(s)", self.report.pruned.len());
    }
    Ok(())
  }

  /// `svn add` everything unversioned; returns versioned paths missing from disk
  fn stage_adds(&mut self, dest: &DestinationRepo) -> ReleaseResult<FileSet> {
    let status_file = self.context.scratch_file();
    std::fs::write(status_file, dest.status()?).context("Failed to capture svn status")?;
    let status = std::fs::read_to_string(status_file).context("Failed to read captured svn status")?;

    let entries = parse_status(&status);
    let untracked: Vec<String> = entries
      .iter()
      .filter(|e| e.is_untracked())
      .map(|e| e.path.clone())
      .collect();
    let missing: FileSet = entries
      .iter()
      .filter(|e| e.is_missing())
      .map(|e| e.path.clone())
      .collect();

    if !untracked.is_empty() {
      println!("➕ Adding {} path(s) to SVN", untracked.len());
    }

    let mut failures = Vec::new();
    let mut progress = PathProgress::new(untracked.len(), "svn add");
    for path in &untracked {
      let output = dest.add(path)?;
      if !output.success() {
        failures.push((path.clone(), output.combined()));
      }
      progress.inc();
    }

    if !failures.is_empty() {
      return Err(
        StageError::StagingFailed {
          operation: "add".to_string(),
          failures,
        }
        .into(),
      );
    }

    self.report.added = untracked;
    Ok(missing)
  }

  /// `svn delete` everything in the working copy that the source tree lacks
  fn stage_deletes(&mut self, dest: &DestinationRepo, missing: FileSet) -> ReleaseResult<()> {
    let source_files = tree::enumerate(&self.config.source_path)?;
    let dest_files = tree::enumerate_excluding(dest.work_copy(), &[SVN_METADATA_DIR])?;

    let mut doomed = tree::reconcile(&source_files, &dest_files);
    doomed.extend(missing);
    let doomed = tree::collapse_nested(&doomed);

    if !doomed.is_empty() {
      println!("➖ Deleting {} path(s) from SVN", doomed.len());
    }

    let mut failures = Vec::new();
    let mut progress = PathProgress::new(doomed.len(), "svn delete");
    for path in &doomed {
      let output = dest.delete(path)?;
      if !output.success() {
        failures.push((path.clone(), output.combined()));
      }
      progress.inc();
    }

    if !failures.is_empty() {
      return Err(
        StageError::StagingFailed {
          operation: "delete".to_string(),
          failures,
        }
        .into(),
      );
    }

    self.report.deleted = doomed;
    Ok(())
  }

  fn confirm(&mut self, prompt: &mut dyn Prompt) -> ReleaseResult<()> {
    println!("\n📋 Ready to commit {} {}", self.config.slug, self.config.tag);
    println!("   Trunk: {}", self.config.trunk_url());
    if !self.config.svn_do_not_tag() {
      println!("   Tag: {}", self.config.tag_url());
    }
    println!("   Working copy: {}", self.context.scratch_dir().display());
    print_paths("Added", &self.report.added);
    print_paths("Deleted", &self.report.deleted);

    let question = format!("Type {} to commit to SVN", CONFIRM_TOKEN);
    if !prompt::confirm(prompt, &question)? {
      return Err(StageError::UserAborted.into());
    }
    Ok(())
  }

  /// Commit trunk, then publish the tag with a server-side copy
  fn commit(&mut self, dest: &DestinationRepo) -> ReleaseResult<()> {
    println!("🚀 Committing to SVN...");
    let output = dest.commit(self.config.svn_commit_message())?;
    if !output.success() {
      return Err(
        StageError::CommitFailed {
          output: output.combined(),
        }
        .into(),
      );
    }
    self.report.committed = true;

    if self.config.svn_do_not_tag() {
      println!("⏭️  Skipping SVN tag (svn-do-not-tag)");
      return Ok(());
    }

    println!("🏷️  Tagging {} in SVN", self.config.tag);
    let output = dest.copy(
      &self.config.trunk_url(),
      &self.config.tag_url(),
      self.config.svn_tag_message(),
    )?;
    if !output.success() {
      return Err(
        StageError::TagPublishFailed {
          tag: self.config.tag.clone(),
          output: output.combined(),
        }
        .into(),
      );
    }
    self.report.tagged = true;
    Ok(())
  }
}

fn print_paths(label: &str, paths: &[String]) {
  println!("   {}: {}", label, paths.len());
  for path in paths {
    println!("     {}", path);
  }
}

/// `root/entry` when `entry` is a plain relative path that cannot climb out of `root`
fn contained_path(root: &Path, entry: &str) -> Option<PathBuf> {
  let relative = Path::new(entry);
  let mut has_name = false;

  for component in relative.components() {
    match component {
      Component::Normal(_) => has_name = true,
      Component::CurDir => {}
      _ => return None,
    }
  }

  has_name.then(|| root.join(relative))
}
