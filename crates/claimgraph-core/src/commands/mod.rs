//! Commands module - all operations as library functions
//!
//! These commands are used by the CLI. Each takes a migrated pool and
//! builds the store it needs.

pub mod benchmark;
pub mod graph;
pub mod risk;
