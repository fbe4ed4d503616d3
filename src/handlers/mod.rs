//! CLI command handlers.
//!
//! Kept apart from main.rs so they can be unit tested.

mod scan;

pub use scan::run_normal_mode;
