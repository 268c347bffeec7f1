//! Market benchmarks and claim outlier scoring
//!
//! Two passes over the claims graph:
//!
//! 1. [`populate_market_benchmarks`] groups billable claim costs by
//!    diagnosis and writes each diagnosis' mean and sample standard
//!    deviation (15% of the mean when the deviation is zero or undefined).
//! 2. [`score_claims`] / [`calculate_diagnosis_benchmarks`] write
//!    `z = (cost - avg) / std` and an outlier label onto each eligible claim.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let benchmarks = populate_market_benchmarks(&store).await?;
//! let scores = score_claims(&store, &benchmarks).await?;
//! println!("{} claims scored", scores.processed);
//! ```

mod calculator;
mod scoring;
mod set;
mod stats;

pub use calculator::{
    DEFAULT_VERIFY_LIMIT, calculate_diagnosis_benchmarks, populate_market_benchmarks,
    score_claims, verify_calculation_results,
};
pub use scoring::{ClaimScore, OutlierBreakdown, ScoreSet};
pub use set::{BenchmarkRun, BenchmarkSet, DiagnosisBenchmark, Prerequisite};
pub use stats::{
    CostAccumulator, OUTLIER_THRESHOLD, STD_DEV_FALLBACK_RATIO, effective_std_dev, z_score,
};
