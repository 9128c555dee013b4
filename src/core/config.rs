//! Layered release.ini configuration
//!
//! Three sources are cascaded, lowest precedence first:
//!
//! 1. **default**: `release.ini` in the directory the tool runs from (mandatory)
//! 2. **ambient**: `release.ini` one level up, next to the source trees
//! 3. **project**: inside the source tree, searched in order: `release.ini`,
//!    `release/release.ini`, `bin/release.ini`
//!
//! A higher source only overrides a key when its value is non-blank, so a
//! template file that lists every key with empty values never wipes out a
//! setting made in a lower layer. After merging, every value is expanded with
//! the `{{tag}}`, `{{TAG}}` and `{{plugin-slug}}` placeholders.

use crate::core::error::{ConfigError, ReleaseError, ReleaseResult};
use crate::core::placeholders::Placeholders;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name used by every configuration layer
pub const CONFIG_FILE_NAME: &str = "release.ini";

/// Recognised setting keys
pub mod keys {
  pub const PLUGIN_SLUG: &str = "plugin-slug";
  pub const GIT_PATH: &str = "git-path";
  pub const SVN_PATH: &str = "svn-path";
  pub const SVN_URL: &str = "svn-url";
  pub const SVN_USERNAME: &str = "svn-username";
  pub const GIT_DO_NOT_TAG: &str = "git-do-not-tag";
  pub const SVN_DO_NOT_TAG: &str = "svn-do-not-tag";
  pub const GIT_TAG_MESSAGE: &str = "git-tag-message";
  pub const SVN_TAG_MESSAGE: &str = "svn-tag-message";
  pub const SVN_COMMIT_MESSAGE: &str = "svn-commit-message";
  pub const README_TEMPLATE: &str = "readme-template";
  pub const CHANGELOG: &str = "changelog";
  pub const DELETE_FILES: &str = "DeleteFiles";
  pub const DELETE_DIRS: &str = "DeleteDirs";
  pub const TEMP_DIR: &str = "temp-dir";
}

/// Flat key → value mapping from one INI file
pub type IniMap = BTreeMap<String, String>;

/// Precedence layer a source was loaded for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
  Default,
  Ambient,
  Project,
}

impl std::fmt::Display for SourceKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SourceKind::Default => write!(f, "default"),
      SourceKind::Ambient => write!(f, "local"),
      SourceKind::Project => write!(f, "plugin"),
    }
  }
}

/// One loaded configuration layer
#[derive(Debug, Clone)]
pub struct ConfigSource {
  pub kind: SourceKind,
  pub path: PathBuf,
  pub values: IniMap,
}

impl ConfigSource {
  /// Read and parse an INI file
  pub fn load(kind: SourceKind, path: &Path) -> ReleaseResult<Self> {
    let content = fs::read_to_string(path)?;
    let values = parse_ini(&content, path)?;
    Ok(Self {
      kind,
      path: path.to_path_buf(),
      values,
    })
  }
}

/// Parse INI text into a flat map.
///
/// Section headers are accepted and flattened away. Quoted values are taken
/// literally; unquoted values lose trailing `;` comments and have boolean
/// words normalised (`true/on/yes` → `1`, `false/off/no/none/null` → empty).
pub fn parse_ini(content: &str, path: &Path) -> ReleaseResult<IniMap> {
  let mut values = IniMap::new();

  for (idx, raw_line) in content.lines().enumerate() {
    let line = raw_line.trim();
    if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
      continue;
    }

    let parse_error = |message: &str| ConfigError::Parse {
      path: path.to_path_buf(),
      line: idx + 1,
      message: message.to_string(),
    };

    if line.starts_with('[') {
      if line.ends_with(']') {
        continue;
      }
      return Err(parse_error("unterminated section header").into());
    }

    let Some((key, value)) = line.split_once('=') else {
      return Err(parse_error("expected `key = value`").into());
    };

    let key = key.trim();
    if key.is_empty() {
      return Err(parse_error("empty key").into());
    }

    values.insert(key.to_string(), parse_ini_value(value.trim()));
  }

  Ok(values)
}

fn parse_ini_value(raw: &str) -> String {
  for quote in ['"', '\''] {
    if let Some(inner) = raw.strip_prefix(quote)
      && let Some(end) = inner.find(quote)
    {
      return inner[..end].to_string();
    }
  }

  let value = match raw.find(';') {
    Some(pos) => raw[..pos].trim_end(),
    None => raw,
  };

  match value.to_ascii_lowercase().as_str() {
    "true" | "on" | "yes" => "1".to_string(),
    "false" | "off" | "no" | "none" | "null" => String::new(),
    _ => value.to_string(),
  }
}

/// Merge layers over a base map.
///
/// The base is taken as-is (blank values included). Each overlay only
/// overrides a key when its value is non-blank after trimming.
pub fn cascade<'a>(base: &IniMap, overlays: impl IntoIterator<Item = &'a IniMap>) -> IniMap {
  let mut merged = base.clone();

  for layer in overlays {
    for (key, value) in layer {
      if !value.trim().is_empty() {
        merged.insert(key.clone(), value.clone());
      }
    }
  }

  merged
}

/// Slug derived from a directory name: lower-cased, spaces become dashes
pub fn derive_slug(source_path: &Path) -> String {
  source_path
    .file_name()
    .map(|name| name.to_string_lossy().to_lowercase().replace(' ', "-"))
    .unwrap_or_default()
}

/// Fully expanded settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
  values: IniMap,
}

impl Settings {
  pub fn new(values: IniMap) -> Self {
    Self { values }
  }

  /// Value for `key`, empty when not set
  pub fn get(&self, key: &str) -> &str {
    self.values.get(key).map(String::as_str).unwrap_or("")
  }

  /// Non-blank value for `key`
  pub fn non_blank(&self, key: &str) -> Option<&str> {
    let value = self.get(key).trim();
    (!value.is_empty()).then_some(value)
  }

  /// Boolean-ish flag: anything but blank or `0` is set
  pub fn flag(&self, key: &str) -> bool {
    !matches!(self.get(key).trim(), "" | "0")
  }

  /// Comma-separated list, entries trimmed, blanks dropped
  pub fn list(&self, key: &str) -> Vec<String> {
    self
      .get(key)
      .split(',')
      .map(str::trim)
      .filter(|entry| !entry.is_empty())
      .map(str::to_string)
      .collect()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
    self.values.iter()
  }
}

/// Immutable configuration for one release run
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
  /// Absolute path to the git working tree
  pub source_path: PathBuf,
  pub tag: String,
  pub slug: String,
  pub placeholders: Placeholders,
  pub settings: Settings,
  /// Directory the scratch dir/file are created in
  pub scratch_base: PathBuf,
  /// Destination account override
  pub username: Option<String>,
  /// Files that contributed, lowest precedence first
  pub sources: Vec<(SourceKind, PathBuf)>,
}

impl ResolvedConfig {
  pub fn git_program(&self) -> PathBuf {
    program_with_prefix(self.settings.get(keys::GIT_PATH), "git")
  }

  pub fn svn_program(&self) -> PathBuf {
    program_with_prefix(self.settings.get(keys::SVN_PATH), "svn")
  }

  /// Repository root URL without trailing slash
  pub fn svn_url(&self) -> &str {
    self.settings.get(keys::SVN_URL).trim().trim_end_matches('/')
  }

  pub fn trunk_url(&self) -> String {
    format!("{}/trunk", self.svn_url())
  }

  pub fn tag_url(&self) -> String {
    format!("{}/tags/{}", self.svn_url(), self.tag)
  }

  pub fn git_do_not_tag(&self) -> bool {
    self.settings.flag(keys::GIT_DO_NOT_TAG)
  }

  pub fn svn_do_not_tag(&self) -> bool {
    self.settings.flag(keys::SVN_DO_NOT_TAG)
  }

  pub fn git_tag_message(&self) -> &str {
    self.settings.get(keys::GIT_TAG_MESSAGE)
  }

  pub fn svn_tag_message(&self) -> &str {
    self.settings.get(keys::SVN_TAG_MESSAGE)
  }

  pub fn svn_commit_message(&self) -> &str {
    self.settings.get(keys::SVN_COMMIT_MESSAGE)
  }

  pub fn readme_template(&self) -> Option<&str> {
    self.settings.non_blank(keys::README_TEMPLATE)
  }

  pub fn changelog(&self) -> Option<&str> {
    self.settings.non_blank(keys::CHANGELOG)
  }

  pub fn delete_files(&self) -> Vec<String> {
    self.settings.list(keys::DELETE_FILES)
  }

  pub fn delete_dirs(&self) -> Vec<String> {
    self.settings.list(keys::DELETE_DIRS)
  }
}

fn program_with_prefix(prefix: &str, name: &str) -> PathBuf {
  PathBuf::from(format!("{}{}", prefix.trim(), name))
}

/// Locates and cascades the configuration layers
pub struct ConfigResolver {
  defaults_path: PathBuf,
  ambient_path: Option<PathBuf>,
}

impl ConfigResolver {
  /// Resolver for a tool running from `home_dir`
  pub fn new(home_dir: &Path) -> Self {
    Self {
      defaults_path: home_dir.join(CONFIG_FILE_NAME),
      ambient_path: home_dir.parent().map(|parent| parent.join(CONFIG_FILE_NAME)),
    }
  }

  /// Use a different file for the default layer
  pub fn with_defaults(mut self, path: PathBuf) -> Self {
    self.defaults_path = path;
    self
  }

  /// Find the project config in search order: release.ini, release/release.ini, bin/release.ini
  pub fn find_project_config(source_path: &Path) -> Option<PathBuf> {
    let candidates = [
      source_path.join(CONFIG_FILE_NAME),
      source_path.join("release").join(CONFIG_FILE_NAME),
      source_path.join("bin").join(CONFIG_FILE_NAME),
    ];

    candidates.into_iter().find(|p| p.is_file())
  }

  /// Load every layer, cascade, and expand placeholders
  pub fn resolve(&self, source_path: PathBuf, tag: &str, username: Option<String>) -> ReleaseResult<ResolvedConfig> {
    let default = ConfigSource::load(SourceKind::Default, &self.defaults_path).map_err(|e| match e {
      ReleaseError::Io(io) => ReleaseError::Config(ConfigError::Missing {
        path: self.defaults_path.clone(),
        reason: io.to_string(),
      }),
      other => other,
    })?;

    let mut overlays = Vec::new();
    if let Some(ambient) = self.ambient_path.as_deref().filter(|p| p.is_file() && p != &self.defaults_path.as_path()) {
      overlays.push(ConfigSource::load(SourceKind::Ambient, ambient)?);
    }
    if let Some(project) = Self::find_project_config(&source_path) {
      overlays.push(ConfigSource::load(SourceKind::Project, &project)?);
    }

    let merged = cascade(&default.values, overlays.iter().map(|source| &source.values));

    let slug = match merged.get(keys::PLUGIN_SLUG).map(|s| s.trim()) {
      Some(slug) if !slug.is_empty() => slug.to_string(),
      _ => derive_slug(&source_path),
    };

    let placeholders = Placeholders::new(tag, &slug);
    let settings = Settings::new(
      merged
        .iter()
        .map(|(key, value)| (key.clone(), placeholders.expand(value)))
        .collect(),
    );

    if settings.non_blank(keys::SVN_URL).is_none() {
      return Err(
        ConfigError::MissingField {
          field: keys::SVN_URL.to_string(),
        }
        .into(),
      );
    }

    let scratch_base = settings
      .non_blank(keys::TEMP_DIR)
      .map(PathBuf::from)
      .filter(|dir| dir.is_dir())
      .unwrap_or_else(std::env::temp_dir);

    let username = username
      .filter(|name| !name.trim().is_empty())
      .or_else(|| settings.non_blank(keys::SVN_USERNAME).map(str::to_string));

    let sources = std::iter::once(&default)
      .chain(overlays.iter())
      .map(|source| (source.kind, source.path.clone()))
      .collect();

    Ok(ResolvedConfig {
      source_path,
      tag: tag.to_string(),
      slug,
      placeholders,
      settings,
      scratch_base,
      username,
      sources,
    })
  }
}
