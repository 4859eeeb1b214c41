//! CLI command implementations

pub mod utils;

pub mod checklist;
pub mod completions;
pub mod config;
pub mod export;
pub mod init;
pub mod stats;
pub mod store;
pub mod validate;
pub mod walk;
