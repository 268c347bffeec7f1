//! Claimgraph Core Library
//!
//! This crate provides the core functionality for claimgraph, including:
//! - Claims graph model (hospitals, doctors, diagnoses, claims)
//! - Market benchmark population and claim z-score scoring
//! - Hospital claiming-behavior analysis
//! - Entity risk profiles
//! - Storage (SQLite + JSONL import/export)

pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod storage;

pub use domain::{analysis, benchmark, risk};
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::GraphStore;
    pub use crate::error::{Error, Result};
    pub use crate::infrastructure::SqliteGraphStore;
    pub use crate::storage::{Database, DatabaseConfig};
}
