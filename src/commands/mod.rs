//! CLI commands for svn-release
//!
//! - **publish**: Release one git tag to the configured SVN repository

pub mod publish;

pub use publish::{PublishArgs, run_publish};
