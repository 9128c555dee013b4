//! Error types for svn-release with contextual messages and exit codes
//!
//! Every failure the pipeline can hit is categorized here so that the binary can
//! print a specific cause (plus a hint where one exists) and exit with a stable
//! code. Errors raised after the scratch directory was allocated are returned
//! through the pipeline, which releases its resources before `main` exits.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for svn-release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing paths)
  User = 1,
  /// System error (VCS commands, I/O)
  System = 2,
  /// Validation failure (tags, staging)
  Validation = 3,
  /// The operator declined the confirmation prompt
  Aborted = 4,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for svn-release
#[derive(Debug)]
pub enum ReleaseError {
  /// The source path could not be resolved to an existing directory
  PathNotFound { path: PathBuf },

  /// Configuration errors
  Config(ConfigError),

  /// External command errors
  Vcs(VcsError),

  /// Pipeline stage failures
  Stage(StageError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
      },
      ReleaseError::Io(err) => ReleaseError::Message {
        message: format!("{}: {}", ctx_str, err),
        context: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::PathNotFound { .. } => ExitCode::User,
      ReleaseError::Config(_) => ExitCode::User,
      ReleaseError::Vcs(_) => ExitCode::System,
      ReleaseError::Stage(StageError::UserAborted) => ExitCode::Aborted,
      ReleaseError::Stage(_) => ExitCode::Validation,
      ReleaseError::Io(_) => ExitCode::System,
      ReleaseError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::PathNotFound { .. } => Some(
        "Pass an absolute path, a path starting with '.', or the name of a directory next to the current one."
          .to_string(),
      ),
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::Vcs(e) => e.help_message(),
      ReleaseError::Stage(e) => e.help_message(),
      _ => None,
    }
  }

  /// True when the operator chose to stop at the confirmation prompt
  pub fn is_user_abort(&self) -> bool {
    matches!(self, ReleaseError::Stage(StageError::UserAborted))
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::PathNotFound { path } => write!(f, "Path to git repository not found: {}", path.display()),
      ReleaseError::Config(e) => write!(f, "{}", e),
      ReleaseError::Vcs(e) => write!(f, "{}", e),
      ReleaseError::Stage(e) => write!(f, "{}", e),
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<ConfigError> for ReleaseError {
  fn from(err: ConfigError) -> Self {
    ReleaseError::Config(err)
  }
}

impl From<VcsError> for ReleaseError {
  fn from(err: VcsError) -> Self {
    ReleaseError::Vcs(err)
  }
}

impl From<StageError> for ReleaseError {
  fn from(err: StageError) -> Self {
    ReleaseError::Stage(err)
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::message(format!("JSON error: {}", err))
  }
}

impl From<walkdir::Error> for ReleaseError {
  fn from(err: walkdir::Error) -> Self {
    ReleaseError::message(format!("Directory walk error: {}", err))
  }
}

impl From<std::path::StripPrefixError> for ReleaseError {
  fn from(err: std::path::StripPrefixError) -> Self {
    ReleaseError::message(format!("Path strip prefix error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// The mandatory default release.ini could not be loaded
  Missing { path: PathBuf, reason: String },

  /// A line in an INI file could not be understood
  Parse { path: PathBuf, line: usize, message: String },

  /// Required setting is blank after cascading all sources
  MissingField { field: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Missing { .. } => Some(
        "Run from the directory that holds the default release.ini, or pass --defaults <FILE>.".to_string(),
      ),
      ConfigError::Parse { .. } => Some("Each setting must look like `key = value`.".to_string()),
      ConfigError::MissingField { field } => Some(format!(
        "Set `{}` in release.ini (default, the directory above, or the project's own release.ini).",
        field
      )),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Missing { path, reason } => {
        write!(f, "Default configuration could not be loaded from {}: {}", path.display(), reason)
      }
      ConfigError::Parse { path, line, message } => {
        write!(f, "Invalid configuration in {} (line {}): {}", path.display(), line, message)
      }
      ConfigError::MissingField { field } => {
        write!(f, "Missing required setting in config: {}", field)
      }
    }
  }
}

/// External command errors
#[derive(Debug)]
pub enum VcsError {
  /// The executable could not be launched at all
  Spawn { program: PathBuf, reason: String },

  /// Command ran and reported failure
  CommandFailed { command: String, output: String },
}

impl VcsError {
  fn help_message(&self) -> Option<String> {
    match self {
      VcsError::Spawn { .. } => {
        Some("Check `git-path` / `svn-path` in release.ini; they are prefixes such as `/usr/bin/`.".to_string())
      }
      VcsError::CommandFailed { .. } => None,
    }
  }
}

impl fmt::Display for VcsError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VcsError::Spawn { program, reason } => write!(f, "Failed to launch {}: {}", program.display(), reason),
      VcsError::CommandFailed { command, output } => {
        write!(f, "Command failed: {}", command)?;
        if !output.trim().is_empty() {
          write!(f, "\n{}", output.trim_end())?;
        }
        Ok(())
      }
    }
  }
}

/// Pipeline stage failures
#[derive(Debug)]
pub enum StageError {
  /// Tag is not in the source repository and we may not create it
  SourceTagMissing { tag: String, reason: String },

  /// Tag already published in the destination repository
  TagAlreadyExists { url: String },

  /// Destination trunk could not be checked out
  CheckoutFailed { url: String, output: String },

  /// Snapshot archive could not be exported or expanded
  ExtractFailed { reason: String },

  /// One or more per-path add/delete operations failed
  StagingFailed { operation: String, failures: Vec<(String, String)> },

  /// The trunk commit failed
  CommitFailed { output: String },

  /// The trunk commit succeeded but the tag copy did not
  TagPublishFailed { tag: String, output: String },

  /// Confirmation prompt declined
  UserAborted,
}

impl StageError {
  fn help_message(&self) -> Option<String> {
    match self {
      StageError::SourceTagMissing { .. } => {
        Some("Create the tag in git first, or unset `git-do-not-tag` so it is created for you.".to_string())
      }
      StageError::TagAlreadyExists { .. } => {
        Some("Published tags are never overwritten. Bump the version and tag again.".to_string())
      }
      StageError::TagPublishFailed { tag, .. } => Some(format!(
        "Trunk is already committed. Create the tag by hand: svn copy <svn-url>/trunk <svn-url>/tags/{}",
        tag
      )),
      _ => None,
    }
  }
}

impl fmt::Display for StageError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StageError::SourceTagMissing { tag, reason } => write!(f, "Tag '{}' not found in git: {}", tag, reason),
      StageError::TagAlreadyExists { url } => write!(f, "Tag already exists in SVN: {}", url),
      StageError::CheckoutFailed { url, output } => {
        write!(f, "SVN checkout of {} failed", url)?;
        if !output.trim().is_empty() {
          write!(f, "\n{}", output.trim_end())?;
        }
        Ok(())
      }
      StageError::ExtractFailed { reason } => write!(f, "Extracting the git snapshot failed: {}", reason),
      StageError::StagingFailed { operation, failures } => {
        write!(f, "svn {} failed for {} path(s):", operation, failures.len())?;
        for (path, reason) in failures {
          write!(f, "\n  {}: {}", path, reason.trim_end())?;
        }
        Ok(())
      }
      StageError::CommitFailed { output } => {
        write!(f, "SVN commit failed")?;
        if !output.trim().is_empty() {
          write!(f, "\n{}", output.trim_end())?;
        }
        Ok(())
      }
      StageError::TagPublishFailed { tag, output } => {
        write!(f, "Committed to trunk but tagging '{}' failed", tag)?;
        if !output.trim().is_empty() {
          write!(f, "\n{}", output.trim_end())?;
        }
        Ok(())
      }
      StageError::UserAborted => write!(f, "Commit aborted."),
    }
  }
}

/// Result type alias for svn-release
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
