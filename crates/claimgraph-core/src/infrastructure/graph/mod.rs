//! Claims graph infrastructure implementations
//!
//! Concrete SQLite implementation of the `GraphStore` trait plus the
//! filtered reads used by the list commands.

mod repository;

pub use repository::{
    ClaimFilter, DoctorFilter, GraphCounts, HospitalFilter, SqliteGraphStore,
};
