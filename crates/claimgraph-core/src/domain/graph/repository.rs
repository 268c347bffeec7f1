//! Storage seam for the claims graph
//!
//! The benchmark calculator and the claiming-behavior analyzer only talk to
//! the graph through [`GraphStore`]. Each method maps to one read or write
//! against the store; the store owns persistence and transactions.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::domain::benchmark::{BenchmarkRun, ClaimScore, DiagnosisBenchmark};
use crate::error::Result;

use super::entity::OutlierStatus;

/// One billable claim cost, keyed by the diagnosis it is coded as
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosisCost {
    pub diagnosis_code: String,
    pub total_cost: f64,
}

/// A claim that can be scored once its diagnosis has a benchmark
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringCandidate {
    pub claim_id: String,
    pub diagnosis_code: String,
    pub total_cost: f64,
}

/// A scored claim with the benchmark it was scored against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredClaimSample {
    pub claim_id: String,
    pub total_cost: f64,
    pub diagnosis_code: String,
    pub diagnosis_name: String,
    pub market_avg_cost: f64,
    pub market_std_dev: f64,
    pub z_score: f64,
    pub outlier_status: Option<OutlierStatus>,
}

/// A claim at one hospital whose diagnosis is benchmarked
///
/// `z_score` is `None` for claims the scoring pass has not (yet) scored.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimDeviation {
    pub hospital_name: String,
    pub diagnosis_code: String,
    pub diagnosis_name: String,
    pub z_score: Option<f64>,
}

/// Storage operations used by the benchmark and analysis passes
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Stream every (diagnosis, cost) pair for claims coded as a diagnosis
    /// with a non-null, strictly positive `total_cost`
    fn claim_costs_by_diagnosis(&self) -> BoxStream<'_, Result<DiagnosisCost>>;

    /// Overwrite the market benchmark of each listed diagnosis and record the run
    ///
    /// Diagnoses not in `benchmarks` are left untouched. Returns the number
    /// of diagnoses updated.
    async fn write_benchmarks(
        &self,
        run: &BenchmarkRun,
        benchmarks: &[DiagnosisBenchmark],
    ) -> Result<u64>;

    /// Most recent benchmark run marker, if any run has been recorded
    async fn latest_benchmark_run(&self) -> Result<Option<BenchmarkRun>>;

    /// All diagnoses that currently carry a market benchmark
    async fn persisted_benchmarks(&self) -> Result<Vec<DiagnosisBenchmark>>;

    /// Claims coded as a diagnosis with a strictly positive `total_cost`
    async fn scoring_candidates(&self) -> Result<Vec<ScoringCandidate>>;

    /// Replace every claim score with `scores`
    ///
    /// Clears `z_score` / `outlier_status` on all claims and writes the given
    /// scores in one transaction, so claims no longer eligible carry no
    /// score. Returns the number of claims written.
    async fn write_scores(&self, scores: &[ClaimScore]) -> Result<u64>;

    /// Scored claims ordered by descending `|z_score|`
    async fn top_deviations(&self, limit: usize) -> Result<Vec<ScoredClaimSample>>;

    /// Claims submitted at `hospital_id` whose diagnosis has a market benchmark
    async fn hospital_claim_deviations(&self, hospital_id: &str) -> Result<Vec<ClaimDeviation>>;
}
