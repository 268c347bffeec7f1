//! Benchmark and hospital analysis commands
//!
//! Operator entry points over the benchmark passes: recompute everything,
//! run a single pass, spot-check results, and analyze one hospital.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::domain::analysis::{HospitalAnalysis, analyze_hospital_claiming_behavior};
use crate::domain::benchmark::{
    self, BenchmarkSet, OutlierBreakdown, Prerequisite, ScoreSet,
};
use crate::domain::graph::{GraphStore, ScoredClaimSample};
use crate::error::{Error, Result};
use crate::infrastructure::graph::SqliteGraphStore;

/// Outcome of a benchmark population pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulateSummary {
    pub run_id: Option<String>,
    pub computed_at: Option<DateTime<Utc>>,
    pub diagnoses_updated: u64,
    pub claims_observed: u64,
}

impl From<&BenchmarkSet> for PopulateSummary {
    fn from(set: &BenchmarkSet) -> Self {
        let run = set.run();
        Self {
            run_id: run.map(|r| r.id.clone()),
            computed_at: run.map(|r| r.computed_at),
            diagnoses_updated: run.map_or(set.len() as u64, |r| r.diagnoses_updated),
            claims_observed: run.map_or(0, |r| r.claims_observed),
        }
    }
}

/// Outcome of a scoring pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub prerequisite: Prerequisite,
    pub processed: u64,
    pub breakdown: OutlierBreakdown,
}

impl From<&ScoreSet> for ScoreSummary {
    fn from(scores: &ScoreSet) -> Self {
        Self {
            prerequisite: scores.prerequisite,
            processed: scores.processed,
            breakdown: scores.breakdown,
        }
    }
}

/// Full recompute report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub benchmarks: PopulateSummary,
    pub scores: ScoreSummary,
    /// Largest deviations, empty when verification was skipped
    pub samples: Vec<ScoredClaimSample>,
}

/// Recompute all benchmarks, then score every claim against them
///
/// With `verify_limit`, the largest deviations are read back afterwards.
pub async fn run(pool: &SqlitePool, verify_limit: Option<usize>) -> Result<BenchmarkReport> {
    let store = SqliteGraphStore::new(pool.clone());

    let benchmarks = benchmark::populate_market_benchmarks(&store).await?;
    let scores = benchmark::score_claims(&store, &benchmarks).await?;
    let samples = match verify_limit {
        Some(limit) => benchmark::verify_calculation_results(&store, limit).await?,
        None => Vec::new(),
    };

    info!(
        diagnoses = benchmarks.len(),
        claims = scores.processed,
        "Benchmark recompute finished"
    );

    Ok(BenchmarkReport {
        benchmarks: PopulateSummary::from(&benchmarks),
        scores: ScoreSummary::from(&scores),
        samples,
    })
}

/// Recompute market benchmarks only
pub async fn populate(pool: &SqlitePool) -> Result<PopulateSummary> {
    let store = SqliteGraphStore::new(pool.clone());
    let benchmarks = benchmark::populate_market_benchmarks(&store).await?;
    Ok(PopulateSummary::from(&benchmarks))
}

/// Score claims against the benchmarks already in the store
pub async fn score(pool: &SqlitePool) -> Result<ScoreSummary> {
    let store = SqliteGraphStore::new(pool.clone());
    let scores = benchmark::calculate_diagnosis_benchmarks(&store).await?;
    Ok(ScoreSummary::from(&scores))
}

/// Scored claims with the largest absolute z-score
pub async fn verify(pool: &SqlitePool, limit: usize) -> Result<Vec<ScoredClaimSample>> {
    let store = SqliteGraphStore::new(pool.clone());
    benchmark::verify_calculation_results(&store, limit).await
}

/// When benchmarks were last populated
pub async fn prerequisite(pool: &SqlitePool) -> Result<Prerequisite> {
    let store = SqliteGraphStore::new(pool.clone());
    let run = store.latest_benchmark_run().await?;
    let benchmarks = BenchmarkSet::new(run, store.persisted_benchmarks().await?);
    Ok(benchmarks.prerequisite())
}

/// Analyze a hospital's claiming behavior
///
/// An empty analysis becomes `HospitalNotFound` for an unknown hospital and
/// `NoAnalysisData` for a known one without scored, benchmarked claims.
pub async fn analyze_hospital(pool: &SqlitePool, hospital_id: &str) -> Result<HospitalAnalysis> {
    let store = SqliteGraphStore::new(pool.clone());
    let analysis = analyze_hospital_claiming_behavior(&store, hospital_id).await?;

    if !analysis.is_empty() {
        return Ok(analysis);
    }

    match store.get_hospital(hospital_id).await? {
        Some(_) => Err(Error::NoAnalysisData(hospital_id.to_string())),
        None => Err(Error::HospitalNotFound(hospital_id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::{Claim, Diagnosis, Hospital};
    use crate::storage::Database;

    async fn seeded() -> Database {
        let db = Database::in_memory().await.unwrap();
        let store = SqliteGraphStore::new(db.pool().clone());
        store.save_hospital(&Hospital::new("H1", "RS Harapan")).await.unwrap();
        store.save_hospital(&Hospital::new("H2", "RS Kosong")).await.unwrap();
        store.save_diagnosis(&Diagnosis::new("D1", "Flu")).await.unwrap();
        for (id, cost) in [("C1", 100.0), ("C2", 120.0), ("C3", 80.0)] {
            store
                .save_claim(&Claim::new(id).at_hospital("H1").coded_as("D1").with_cost(cost))
                .await
                .unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_run_reports_both_passes() {
        let db = seeded().await;

        let report = run(db.pool(), Some(2)).await.unwrap();
        assert_eq!(report.benchmarks.diagnoses_updated, 1);
        assert_eq!(report.benchmarks.claims_observed, 3);
        assert_eq!(report.scores.processed, 3);
        assert_eq!(report.scores.breakdown.normal_variance, 3);
        assert_eq!(report.samples.len(), 2);
        assert!(matches!(report.scores.prerequisite, Prerequisite::ComputedAt(_)));
    }

    #[tokio::test]
    async fn test_score_before_populate_reports_never_computed() {
        let db = seeded().await;

        assert_eq!(prerequisite(db.pool()).await.unwrap(), Prerequisite::NeverComputed);
        let summary = score(db.pool()).await.unwrap();
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.prerequisite, Prerequisite::NeverComputed);
    }

    #[tokio::test]
    async fn test_analyze_maps_empty_results() {
        let db = seeded().await;
        run(db.pool(), None).await.unwrap();

        let analysis = analyze_hospital(db.pool(), "H1").await.unwrap();
        assert_eq!(analysis.hospital_name.as_deref(), Some("RS Harapan"));
        assert_eq!(analysis.data.len(), 1);
        assert_eq!(analysis.data[0].total_claims, 3);

        let err = analyze_hospital(db.pool(), "H2").await.unwrap_err();
        assert!(matches!(err, Error::NoAnalysisData(_)));

        let err = analyze_hospital(db.pool(), "H404").await.unwrap_err();
        assert!(matches!(err, Error::HospitalNotFound(_)));
    }
}
