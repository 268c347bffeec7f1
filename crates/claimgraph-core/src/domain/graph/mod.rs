//! Claims graph domain module
//!
//! Hospitals, doctors, diagnoses, procedures and claims form a small property graph:
//!
//! ```text
//! (Doctor)-[:WORKS_AT]->(Hospital)
//! (Claim)-[:SUBMITTED_AT]->(Hospital)
//! (Claim)-[:SUBMITTED_BY]->(Doctor)
//! (Claim)-[:CODED_AS]->(Diagnosis)
//! (Diagnosis)-[:REQUIRES]->(Procedure)
//! ```
//!
//! Every claim is coded as at most one diagnosis. Diagnoses carry a derived
//! market benchmark and claims a derived z-score, both written by
//! [`crate::domain::benchmark`].

mod entity;
mod repository;

pub use entity::{Claim, Diagnosis, Doctor, Hospital, OutlierStatus, Procedure};
pub use repository::{
    ClaimDeviation, DiagnosisCost, GraphStore, ScoredClaimSample, ScoringCandidate,
};
