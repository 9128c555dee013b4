//! In-memory git/svn stand-in for pipeline tests
//!
//! Emulates just enough of both tools for a release run: tag lookups and zip
//! export on the git side; info, checkout, status, add, delete, commit and copy
//! against a single `<root>/trunk` + `<root>/tags/*` layout on the svn side.
//! Working-copy state lives on disk in the checked-out directory, tracking
//! state lives here.

use super::{CommandOutput, CommandRunner, Invocation};
use crate::core::error::ReleaseResult;
use crate::core::tree::{SVN_METADATA_DIR, enumerate_excluding};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Default)]
struct FakeState {
  invocations: Vec<Invocation>,
  failures: Vec<String>,
  pull_fails: bool,

  git_tags: BTreeSet<String>,
  snapshot: Vec<(String, Vec<u8>)>,

  svn_root: String,
  trunk: BTreeMap<String, Vec<u8>>,
  svn_tags: BTreeSet<String>,
  commits: Vec<String>,

  work_copy: Option<PathBuf>,
  versioned: BTreeSet<String>,
  added: BTreeSet<String>,
  deleted: BTreeSet<String>,
}

/// Scripted [`CommandRunner`] that records every invocation
#[derive(Default)]
pub struct FakeRunner {
  state: RefCell<FakeState>,
}

fn ok(stdout: impl Into<String>) -> CommandOutput {
  CommandOutput {
    status: Some(0),
    stdout: stdout.into(),
    stderr: String::new(),
  }
}

fn fail(stderr: impl Into<String>) -> CommandOutput {
  CommandOutput {
    status: Some(1),
    stdout: String::new(),
    stderr: stderr.into(),
  }
}

/// Positional arguments plus the `-m` message; `--username` values and flags are skipped
fn split_args(args: &[String]) -> (Vec<String>, Option<String>) {
  let mut positional = Vec::new();
  let mut message = None;
  let mut iter = args.iter();

  while let Some(arg) = iter.next() {
    match arg.as_str() {
      "--username" => {
        iter.next();
      }
      "-m" => message = iter.next().cloned(),
      flag if flag.starts_with("--") => {}
      other => positional.push(other.to_string()),
    }
  }

  (positional, message)
}

fn strip_peg(path: &str) -> &str {
  if path.contains('@') {
    path.strip_suffix('@').unwrap_or(path)
  } else {
    path
  }
}

fn parent_of(path: &str) -> Option<&str> {
  path.rsplit_once('/').map(|(parent, _)| parent)
}

fn with_ancestors(path: &str) -> Vec<String> {
  let mut out = vec![path.to_string()];
  let mut current = path;
  while let Some(parent) = parent_of(current) {
    out.push(parent.to_string());
    current = parent;
  }
  out
}

fn is_within(path: &str, root: &str) -> bool {
  path == root || (path.starts_with(root) && path[root.len()..].starts_with('/'))
}

impl FakeRunner {
  pub fn new() -> Self {
    Self::default()
  }

  /// Tags (or any revisions) the source repository knows
  pub fn git_tags(&self, tags: &[&str]) {
    let mut state = self.state.borrow_mut();
    state.git_tags.extend(tags.iter().map(|t| t.to_string()));
  }

  /// Files `git archive` exports
  pub fn git_snapshot(&self, files: &[(&str, &str)]) {
    let mut state = self.state.borrow_mut();
    state.snapshot = files.iter().map(|(p, c)| (p.to_string(), c.as_bytes().to_vec())).collect();
  }

  /// Make `git pull` exit non-zero
  pub fn pull_fails(&self) {
    self.state.borrow_mut().pull_fails = true;
  }

  /// Repository root URL and the files currently on trunk
  pub fn svn_repo(&self, root: &str, trunk: &[(&str, &str)]) {
    let mut state = self.state.borrow_mut();
    state.svn_root = root.to_string();
    state.trunk = trunk.iter().map(|(p, c)| (p.to_string(), c.as_bytes().to_vec())).collect();
  }

  pub fn svn_tag(&self, tag: &str) {
    self.state.borrow_mut().svn_tags.insert(tag.to_string());
  }

  /// Any invocation whose command line contains `pattern` exits non-zero
  pub fn fail_when(&self, pattern: &str) {
    self.state.borrow_mut().failures.push(pattern.to_string());
  }

  pub fn invocations(&self) -> Vec<Invocation> {
    self.state.borrow().invocations.clone()
  }

  pub fn commands(&self) -> Vec<String> {
    self.state.borrow().invocations.iter().map(Invocation::display).collect()
  }

  pub fn trunk_files(&self) -> BTreeSet<String> {
    self.state.borrow().trunk.keys().cloned().collect()
  }

  pub fn trunk_file(&self, path: &str) -> Option<String> {
    self
      .state
      .borrow()
      .trunk
      .get(path)
      .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
  }

  pub fn svn_tags(&self) -> BTreeSet<String> {
    self.state.borrow().svn_tags.clone()
  }

  pub fn commits(&self) -> Vec<String> {
    self.state.borrow().commits.clone()
  }

  fn run_git(&self, state: &mut FakeState, args: &[String]) -> CommandOutput {
    match args.first().map(String::as_str) {
      Some("pull") if state.pull_fails => fail("There is no tracking information for the current branch."),
      Some("pull") => ok("Already up to date.\n"),
      Some("rev-parse") => {
        let tag = args
          .last()
          .and_then(|r| r.strip_prefix("refs/tags/"))
          .map(|r| r.trim_end_matches("^{commit}"));
        match tag {
          Some(tag) if state.git_tags.contains(tag) => ok(""),
          _ => fail(""),
        }
      }
      Some("tag") => {
        let (positional, _) = split_args(&args[1..]);
        let Some(tag) = positional.first() else {
          return fail("usage: git tag");
        };
        state.git_tags.insert(tag.clone());
        ok("")
      }
      Some("archive") => {
        let rev = args.last().cloned().unwrap_or_default();
        if !state.git_tags.contains(&rev) {
          return fail(format!("fatal: not a valid object name: {}", rev));
        }
        let Some(output) = args.iter().find_map(|a| a.strip_prefix("--output=")) else {
          return fail("fake git archive needs --output");
        };
        match write_zip(Path::new(output), &state.snapshot) {
          Ok(()) => ok(""),
          Err(e) => fail(e.to_string()),
        }
      }
      _ => fail("unsupported git command"),
    }
  }

  fn run_svn(&self, state: &mut FakeState, args: &[String], cwd: &Path) -> CommandOutput {
    let Some(subcommand) = args.first().map(String::as_str) else {
      return fail("svn: missing subcommand");
    };
    let (positional, message) = split_args(&args[1..]);
    let trunk_url = format!("{}/trunk", state.svn_root);
    let tags_prefix = format!("{}/tags/", state.svn_root);

    match subcommand {
      "info" => {
        let url = positional.first().cloned().unwrap_or_default();
        let exists = url == trunk_url
          || url
            .strip_prefix(&tags_prefix)
            .is_some_and(|tag| state.svn_tags.contains(tag));
        if exists { ok(format!("URL: {}\n", url)) } else { fail("svn: E170000: URL doesn't exist") }
      }
      "checkout" => {
        let (Some(url), Some(dest)) = (positional.first(), positional.get(1)) else {
          return fail("svn: checkout needs URL and PATH");
        };
        if *url != trunk_url {
          return fail("svn: E170000: URL doesn't exist");
        }
        let dest = PathBuf::from(dest);
        if let Err(e) = checkout_files(&dest, &state.trunk) {
          return fail(e.to_string());
        }
        state.versioned = state.trunk.keys().flat_map(|p| with_ancestors(p)).collect();
        state.added.clear();
        state.deleted.clear();
        state.work_copy = Some(dest);
        ok("Checked out revision 1.\n")
      }
      "status" => match on_disk(cwd) {
        Ok(disk) => ok(status_text(state, &disk)),
        Err(e) => fail(e),
      },
      "add" => {
        let path = strip_peg(positional.first().map(String::as_str).unwrap_or(""));
        let disk = match on_disk(cwd) {
          Ok(disk) => disk,
          Err(e) => return fail(e),
        };
        if !disk.contains(path) {
          return fail(format!("svn: E155010: '{}' not found", path));
        }
        if state.versioned.contains(path) {
          return fail(format!("svn: E150002: '{}' is already under version control", path));
        }
        for entry in disk.iter().filter(|p| is_within(p, path)) {
          state.versioned.insert(entry.clone());
          state.added.insert(entry.clone());
        }
        ok(format!("A         {}\n", path))
      }
      "delete" => {
        let path = strip_peg(positional.first().map(String::as_str).unwrap_or(""));
        if !state.versioned.contains(path) {
          return fail(format!("svn: E155010: '{}' is not under version control", path));
        }
        let target = cwd.join(path);
        if target.is_dir() {
          let _ = std::fs::remove_dir_all(&target);
        } else if target.exists() {
          let _ = std::fs::remove_file(&target);
        }
        let doomed: Vec<String> = state.versioned.iter().filter(|p| is_within(p, path)).cloned().collect();
        for entry in doomed {
          state.versioned.remove(&entry);
          state.deleted.insert(entry);
        }
        ok(format!("D         {}\n", path))
      }
      "commit" => {
        let Some(work_copy) = state.work_copy.clone() else {
          return fail("svn: E155007: not a working copy");
        };
        let mut trunk = BTreeMap::new();
        for path in &state.versioned {
          let file = work_copy.join(path);
          if file.is_file()
            && let Ok(bytes) = std::fs::read(&file)
          {
            trunk.insert(path.clone(), bytes);
          }
        }
        state.trunk = trunk;
        state.commits.push(message.unwrap_or_default());
        state.added.clear();
        state.deleted.clear();
        ok("Committed revision 2.\n")
      }
      "copy" => {
        let (Some(from), Some(to)) = (positional.first(), positional.get(1)) else {
          return fail("svn: copy needs SRC and DST");
        };
        let Some(tag) = to.strip_prefix(&tags_prefix) else {
          return fail("svn: unsupported copy target");
        };
        if *from != trunk_url || state.svn_tags.contains(tag) {
          return fail("svn: E160020: Path already exists");
        }
        state.svn_tags.insert(tag.to_string());
        ok("Committed revision 3.\n")
      }
      _ => fail("unsupported svn command"),
    }
  }
}

fn on_disk(work_copy: &Path) -> Result<BTreeSet<String>, String> {
  enumerate_excluding(work_copy, &[SVN_METADATA_DIR]).map_err(|e| e.to_string())
}

fn status_text(state: &FakeState, disk: &BTreeSet<String>) -> String {
  let mut lines = BTreeMap::new();

  for path in disk {
    let parent_versioned = parent_of(path).is_none_or(|parent| state.versioned.contains(parent));
    if !state.versioned.contains(path) && parent_versioned {
      lines.insert(path.clone(), '?');
    }
  }
  for path in &state.added {
    lines.insert(path.clone(), 'A');
  }
  for path in &state.versioned {
    if !disk.contains(path) {
      lines.insert(path.clone(), '!');
    }
  }
  for path in &state.deleted {
    lines.insert(path.clone(), 'D');
  }

  lines
    .into_iter()
    .map(|(path, marker)| format!("{}       {}\n", marker, path))
    .collect()
}

fn checkout_files(dest: &Path, files: &BTreeMap<String, Vec<u8>>) -> std::io::Result<()> {
  std::fs::create_dir_all(dest.join(SVN_METADATA_DIR))?;
  std::fs::write(dest.join(SVN_METADATA_DIR).join("wc.db"), b"fake")?;
  for (path, bytes) in files {
    let target = dest.join(path);
    if let Some(parent) = target.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(target, bytes)?;
  }
  Ok(())
}

fn write_zip(output: &Path, files: &[(String, Vec<u8>)]) -> zip::result::ZipResult<()> {
  let file = std::fs::File::create(output)?;
  let mut writer = zip::ZipWriter::new(file);
  let options = zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

  for (path, bytes) in files {
    writer.start_file(path.as_str(), options)?;
    writer.write_all(bytes)?;
  }

  writer.finish()?;
  Ok(())
}

impl CommandRunner for FakeRunner {
  fn run(&self, invocation: &Invocation) -> ReleaseResult<CommandOutput> {
    let mut state = self.state.borrow_mut();
    state.invocations.push(invocation.clone());

    let display = invocation.display();
    if state.failures.iter().any(|pattern| display.contains(pattern.as_str())) {
      return Ok(fail(format!("injected failure: {}", display)));
    }

    let args = invocation.arg_strings();
    let name = invocation
      .program
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();

    let output = if name.ends_with("git") {
      self.run_git(&mut state, &args)
    } else if name.ends_with("svn") {
      self.run_svn(&mut state, &args, &invocation.cwd)
    } else {
      fail(format!("unknown program {}", name))
    };

    Ok(output)
  }
}
