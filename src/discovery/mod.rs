//! Discovery layer for locating and staging configuration artifacts.
//!
//! This module handles:
//! - Directory traversal and file discovery
//! - Service file pattern matching
//! - Staging matched files into per-strategy temporary directories

pub mod patterns;
pub mod staging;
pub mod walker;

pub use patterns::{IncludeSyntax, ServicePattern};
pub use staging::{StagingArea, resolve_in_root};
pub use walker::{DirectoryWalker, WalkConfig, is_pruned_dir};
