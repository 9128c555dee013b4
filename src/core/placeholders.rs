//! `{{token}}` substitution for settings and the readme template

use serde::Serialize;
use std::collections::BTreeMap;

/// Fixed token set available to settings and templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placeholders {
  values: BTreeMap<String, String>,
}

impl Placeholders {
  /// Build the `{tag, TAG, plugin-slug}` mapping
  pub fn new(tag: &str, slug: &str) -> Self {
    let mut values = BTreeMap::new();
    values.insert("tag".to_string(), tag.to_string());
    values.insert("TAG".to_string(), tag.to_string());
    values.insert("plugin-slug".to_string(), slug.to_string());
    Self { values }
  }

  /// Look up a token value
  pub fn get(&self, token: &str) -> Option<&str> {
    self.values.get(token).map(String::as_str)
  }

  /// Replace every `{{token}}` with its value.
  ///
  /// Single left-to-right pass: substituted text is never rescanned, and
  /// anything that is not a known token (unknown names, stray braces) is
  /// copied through verbatim without hiding a real token after it.
  pub fn expand(&self, input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
      out.push_str(&rest[..start]);
      let candidate = &rest[start..];

      match self.token_at(candidate) {
        Some((value, consumed)) => {
          out.push_str(value);
          rest = &candidate[consumed..];
        }
        None => {
          out.push('{');
          rest = &candidate[1..];
        }
      }
    }

    out.push_str(rest);
    out
  }

  /// Known `{{token}}` at the start of `text`: its value and the bytes it spans
  fn token_at(&self, text: &str) -> Option<(&str, usize)> {
    let inner = text.strip_prefix("{{")?;
    self.values.iter().find_map(|(token, value)| {
      inner
        .strip_prefix(token.as_str())
        .filter(|after| after.starts_with("}}"))
        .map(|_| (value.as_str(), token.len() + 4))
    })
  }
}
