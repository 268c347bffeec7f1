//! Benchmark population and claim scoring passes
//!
//! Population groups every billable claim cost by diagnosis in memory and
//! writes the resulting [`BenchmarkSet`]. Scoring takes a `BenchmarkSet` and
//! writes a z-score and outlier label onto every eligible claim. The two
//! passes commit separately: a claim inserted between them is scored
//! against whatever benchmark its diagnosis had at population time.

use std::collections::BTreeMap;

use futures_util::TryStreamExt;
use tracing::{debug, info, warn};

use crate::domain::graph::{GraphStore, ScoredClaimSample};
use crate::error::Result;

use super::scoring::{ClaimScore, ScoreSet};
use super::set::{BenchmarkRun, BenchmarkSet, DiagnosisBenchmark, Prerequisite};
use super::stats::CostAccumulator;

/// Claims shown by [`verify_calculation_results`] unless configured otherwise
pub const DEFAULT_VERIFY_LIMIT: usize = 5;

/// Recompute the market benchmark of every diagnosis with billable claims
///
/// Diagnoses without a billable claim keep whatever they had. A run marker
/// is recorded even when nothing matched, so a later scoring pass can tell
/// an empty store from a store that was never benchmarked.
pub async fn populate_market_benchmarks<S>(store: &S) -> Result<BenchmarkSet>
where
    S: GraphStore + ?Sized,
{
    let mut groups: BTreeMap<String, CostAccumulator> = BTreeMap::new();
    let mut claims_observed = 0u64;

    let mut costs = store.claim_costs_by_diagnosis();
    while let Some(row) = costs.try_next().await? {
        if row.total_cost <= 0.0 {
            continue;
        }
        groups.entry(row.diagnosis_code).or_default().push(row.total_cost);
        claims_observed += 1;
    }
    // Release the pooled connection before writing
    drop(costs);

    let benchmarks: Vec<DiagnosisBenchmark> = groups
        .iter()
        .filter_map(|(code, costs)| DiagnosisBenchmark::from_costs(code.as_str(), costs))
        .collect();

    for benchmark in &benchmarks {
        debug!(
            diagnosis = %benchmark.diagnosis_code,
            avg = benchmark.market_avg_cost,
            std = benchmark.market_std_dev,
            "Computed market benchmark"
        );
    }

    let run = BenchmarkRun::new(benchmarks.len() as u64, claims_observed);
    let updated = store.write_benchmarks(&run, &benchmarks).await?;

    if updated == 0 {
        warn!(run_id = %run.id, "No billable claims found; no diagnosis benchmarks written");
    } else {
        info!(
            run_id = %run.id,
            diagnoses_updated = updated,
            claims_observed,
            "Market benchmarks populated"
        );
    }

    Ok(BenchmarkSet::new(Some(run), benchmarks))
}

/// Score every eligible claim against `benchmarks`
///
/// A claim is eligible when it has a strictly positive cost and its
/// diagnosis is in `benchmarks`. When nothing is eligible but benchmarks
/// have been populated, existing scores are cleared so none go stale.
pub async fn score_claims<S>(store: &S, benchmarks: &BenchmarkSet) -> Result<ScoreSet>
where
    S: GraphStore + ?Sized,
{
    let prerequisite = benchmarks.prerequisite();

    let scores: Vec<ClaimScore> = store
        .scoring_candidates()
        .await?
        .iter()
        .filter(|c| c.total_cost > 0.0)
        .filter_map(|c| {
            benchmarks
                .get(&c.diagnosis_code)
                .map(|benchmark| ClaimScore::compute(c, benchmark))
        })
        .collect();

    if scores.is_empty() {
        if prerequisite != Prerequisite::NeverComputed {
            store.write_scores(&[]).await?;
        }
        warn!(%prerequisite, "No eligible claims to score");
        return Ok(ScoreSet::empty(prerequisite));
    }

    let processed = store.write_scores(&scores).await?;
    let result = ScoreSet::new(prerequisite, processed, scores);

    info!(
        processed,
        high_outlier = result.breakdown.high_outlier,
        low_outlier = result.breakdown.low_outlier,
        normal_variance = result.breakdown.normal_variance,
        "Claim z-scores calculated"
    );

    Ok(result)
}

/// Score every eligible claim against the benchmarks currently in the store
///
/// Re-running without repopulating benchmarks yields identical scores.
pub async fn calculate_diagnosis_benchmarks<S>(store: &S) -> Result<ScoreSet>
where
    S: GraphStore + ?Sized,
{
    let run = store.latest_benchmark_run().await?;
    let benchmarks = BenchmarkSet::new(run, store.persisted_benchmarks().await?);
    debug!(diagnoses = benchmarks.len(), "Loaded persisted benchmarks");
    score_claims(store, &benchmarks).await
}

/// Scored claims with the largest absolute z-score, for spot checks
pub async fn verify_calculation_results<S>(store: &S, limit: usize) -> Result<Vec<ScoredClaimSample>>
where
    S: GraphStore + ?Sized,
{
    let samples = store.top_deviations(limit).await?;
    if samples.is_empty() {
        warn!("No scored claims to verify");
    }
    Ok(samples)
}
