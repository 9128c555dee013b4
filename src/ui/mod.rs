//! Terminal interaction: confirmation prompt and progress bars

pub mod progress;
pub mod prompt;
