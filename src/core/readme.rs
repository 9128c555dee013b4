//! readme.txt generation from a template and a markdown changelog

use crate::core::error::{ReleaseResult, ResultExt};
use crate::core::placeholders::Placeholders;
use crate::core::tree::README_FILE_NAME;
use std::path::{Path, PathBuf};

/// Rewrite level-two markdown headings (`## x`) as `= x`.
///
/// Only lines starting with exactly two hashes are touched; `###` and deeper
/// headings pass through unchanged.
pub fn rewrite_changelog_headings(changelog: &str) -> String {
  let mut out = String::with_capacity(changelog.len());

  for line in changelog.split_inclusive('\n') {
    match line.strip_prefix("##") {
      Some(rest) if !rest.starts_with('#') => {
        out.push('=');
        out.push_str(rest);
      }
      _ => out.push_str(line),
    }
  }

  out
}

/// Template text with placeholders expanded and the changelog appended
pub fn render(template: &str, changelog: Option<&str>, placeholders: &Placeholders) -> String {
  let mut readme = placeholders.expand(template);

  if let Some(changelog) = changelog {
    if !readme.is_empty() && !readme.ends_with('\n') {
      readme.push('\n');
    }
    readme.push_str(&rewrite_changelog_headings(changelog));
  }

  readme
}

/// Generate `readme.txt` in `dest_dir`.
///
/// `template` and `changelog` are relative to `source_path`. Returns the path
/// written, or `None` when no template is configured or the file is absent.
pub fn generate(
  source_path: &Path,
  template: Option<&str>,
  changelog: Option<&str>,
  placeholders: &Placeholders,
  dest_dir: &Path,
) -> ReleaseResult<Option<PathBuf>> {
  let Some(template) = template else {
    return Ok(None);
  };

  let template_path = source_path.join(template);
  if !template_path.is_file() {
    tracing::warn!(path = %template_path.display(), "readme template not found, skipping readme.txt");
    return Ok(None);
  }

  let template_text = std::fs::read_to_string(&template_path)
    .with_context(|| format!("Failed to read readme template {}", template_path.display()))?;

  let changelog_text = match changelog.map(|rel| source_path.join(rel)) {
    Some(path) if path.is_file() => Some(
      std::fs::read_to_string(&path).with_context(|| format!("Failed to read changelog {}", path.display()))?,
    ),
    Some(path) => {
      tracing::warn!(path = %path.display(), "changelog not found, readme.txt gets the template only");
      None
    }
    None => None,
  };

  let readme_path = dest_dir.join(README_FILE_NAME);
  std::fs::write(&readme_path, render(&template_text, changelog_text.as_deref(), placeholders))
    .with_context(|| format!("Failed to write {}", readme_path.display()))?;

  Ok(Some(readme_path))
}
