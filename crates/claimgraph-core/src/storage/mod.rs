//! Storage layer - SQLite + JSONL import/export
//!
//! # Architecture
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and automatic migration
//! - `jsonl`: JSONL files for seeding and backing up the graph
//!
//! # Usage
//!
//! ```ignore
//! use claimgraph_core::storage::Database;
//!
//! // Create an in-memory database for testing
//! let db = Database::in_memory().await?;
//! ```

pub mod database;
pub mod jsonl;
pub mod migrations;

// Re-export commonly used types
pub use database::{Database, DatabaseConfig, default_database_path};
pub use jsonl::{
    ExportMetadata, ExportResult, GRAPH_FILES, ImportResult, export_to_jsonl, import_from_jsonl,
};
pub use migrations::{CURRENT_VERSION, MigrationStatus, migration_status, run_migrations};
