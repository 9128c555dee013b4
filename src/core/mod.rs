//! Core engine for svn-release
//!
//! - **source_path**: Resolve the user-supplied repository argument
//! - **config**: release.ini cascade (default, ambient, project) and typed settings
//! - **placeholders**: `{{tag}}` / `{{plugin-slug}}` expansion
//! - **context**: Scratch directory and file owned by one run
//! - **pipeline**: The staged release state machine
//! - **tree**: Directory enumeration and deletion-set reconciliation
//! - **archive**: Expansion of the exported git snapshot
//! - **readme**: readme.txt generation from template and changelog
//! - **error**: Error types with contextual help messages and exit codes
//! - **vcs**: git/svn command gateway

pub mod archive;
pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod placeholders;
pub mod readme;
pub mod source_path;
pub mod tree;
pub mod vcs;
