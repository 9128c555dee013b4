//! `svn-release <PATH_OR_SLUG> <TAG> [USERNAME]`

use crate::core::config::ConfigResolver;
use crate::core::error::ReleaseResult;
use crate::core::pipeline::{AbortedRun, StagingPipeline};
use crate::core::source_path::resolve_source_path;
use crate::core::vcs::SystemRunner;
use crate::ui::prompt::StdinPrompt;
use std::env;
use std::path::PathBuf;

/// Arguments for a release run
#[derive(Debug, Clone)]
pub struct PublishArgs {
  pub path: String,
  pub tag: String,
  pub username: Option<String>,
  /// Replaces `./release.ini` as the default layer
  pub defaults: Option<PathBuf>,
  pub json: bool,
}

/// Run the publish command
pub fn run_publish(args: PublishArgs) -> ReleaseResult<()> {
  let current_dir = env::current_dir()?;

  let source_path = resolve_source_path(&args.path, &current_dir)?;
  println!("📂 Source repository: {}", source_path.display());

  let mut resolver = ConfigResolver::new(&current_dir);
  if let Some(defaults) = args.defaults {
    resolver = resolver.with_defaults(defaults);
  }
  let config = resolver.resolve(source_path, &args.tag, args.username)?;

  for (kind, path) in &config.sources {
    println!("📄 Loaded {} configuration from {}", kind, path.display());
  }
  for (key, value) in config.settings.iter() {
    tracing::debug!(key = %key, value = %value, "effective setting");
  }
  if let Some(user) = &config.username {
    println!("👤 Committing to SVN as {}", user);
  }
  println!("📦 Releasing {} {} to {}\n", config.slug, config.tag, config.svn_url());

  let runner = SystemRunner;
  let pipeline = StagingPipeline::new(&config, &runner)?;
  let (report, outcome) = match pipeline.run(&mut StdinPrompt) {
    Ok(report) => (report, Ok(())),
    Err(aborted) => {
      let AbortedRun { report, error } = *aborted;
      (report, Err(error))
    }
  };

  if args.json {
    println!("{}", serde_json::to_string_pretty(&report)?);
  }

  outcome
}
