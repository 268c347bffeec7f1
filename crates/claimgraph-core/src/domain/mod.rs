//! Domain layer
//!
//! Contains the claims graph model and the statistics computed over it.

pub mod analysis;
pub mod benchmark;
pub mod graph;
pub mod risk;

pub use graph::GraphStore;
