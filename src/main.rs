mod commands;
mod core;
mod ui;
mod utils;

use clap::Parser;
use core::error::{ReleaseError, print_error};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Publish a git tag to a Subversion repository (trunk + tags/<tag>)
#[derive(Parser)]
#[command(name = "svn-release")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  /// Source git repository: a path starting with '.', '/', '\' or a drive letter,
  /// or the name of a directory next to the current one
  path: String,

  /// Git tag to publish
  tag: String,

  /// SVN account to commit as (overrides `svn-username`)
  username: Option<String>,

  /// Default configuration file (default: ./release.ini)
  #[arg(long, value_name = "FILE")]
  defaults: Option<PathBuf>,

  /// Print the release report as JSON when done
  #[arg(long)]
  json: bool,

  /// Log every git/svn invocation
  #[arg(short, long)]
  verbose: bool,
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// `RUST_LOG` wins; otherwise warnings only, or debug with `--verbose`
fn init_logging(verbose: bool) {
  let default_level = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let result = commands::run_publish(commands::PublishArgs {
    path: cli.path,
    tag: cli.tag,
    username: cli.username,
    defaults: cli.defaults,
    json: cli.json,
  });

  // The pipeline and its scratch resources are gone by the time we get here
  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ReleaseError) -> ! {
  if err.is_user_abort() {
    eprintln!("\n🛑 {}", err);
  } else {
    print_error(&err);
  }
  std::process::exit(err.exit_code().as_i32());
}
