//! Daily Walk: store inspection checklists
//!
//! Records daily store walks against a fixed compliance checklist, keeps them
//! as documents in a pluggable store (YAML files, SQLite, or memory), and
//! derives compliance and fix-rate statistics.

pub mod cli;
pub mod core;
pub mod entities;
pub mod schema;
pub mod store;
