//! Progress indicators for per-path svn operations
//!
//! Uses `linya` for allocation-free progress bars

use linya::{Bar, Progress};

/// Progress bar over a fixed number of paths.
///
/// Hidden when there is at most one path; a single `svn add` does not need a bar.
pub struct PathProgress {
  inner: Option<(Progress, Bar)>,
}

impl PathProgress {
  /// Create a progress bar for `total` paths
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let inner = (total > 1).then(|| {
      let mut progress = Progress::new();
      let bar = progress.bar(total, label.into());
      (progress, bar)
    });
    Self { inner }
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    if let Some((progress, bar)) = self.inner.as_mut() {
      progress.inc_and_draw(bar, 1);
    }
  }

  #[cfg(test)]
  fn is_visible(&self) -> bool {
    self.inner.is_some()
  }
}
