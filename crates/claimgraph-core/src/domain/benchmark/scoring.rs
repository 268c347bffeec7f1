//! Per-claim z-scores and outlier labels

use serde::{Deserialize, Serialize};

use crate::domain::graph::{OutlierStatus, ScoringCandidate};

use super::set::{DiagnosisBenchmark, Prerequisite};
use super::stats::z_score;

/// The score written onto one claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimScore {
    pub claim_id: String,
    pub diagnosis_code: String,
    pub z_score: f64,
    pub outlier_status: OutlierStatus,
}

impl ClaimScore {
    /// Score a candidate against its diagnosis benchmark
    pub fn compute(candidate: &ScoringCandidate, benchmark: &DiagnosisBenchmark) -> Self {
        let z = z_score(
            candidate.total_cost,
            benchmark.market_avg_cost,
            benchmark.market_std_dev,
        );
        Self {
            claim_id: candidate.claim_id.clone(),
            diagnosis_code: candidate.diagnosis_code.clone(),
            z_score: z,
            outlier_status: OutlierStatus::from_z_score(z),
        }
    }
}

/// Count of scored claims per outlier status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlierBreakdown {
    pub high_outlier: u64,
    pub low_outlier: u64,
    pub normal_variance: u64,
}

impl OutlierBreakdown {
    pub fn record(&mut self, status: OutlierStatus) {
        match status {
            OutlierStatus::HighOutlier => self.high_outlier += 1,
            OutlierStatus::LowOutlier => self.low_outlier += 1,
            OutlierStatus::NormalVariance => self.normal_variance += 1,
        }
    }

    pub fn get(&self, status: OutlierStatus) -> u64 {
        match status {
            OutlierStatus::HighOutlier => self.high_outlier,
            OutlierStatus::LowOutlier => self.low_outlier,
            OutlierStatus::NormalVariance => self.normal_variance,
        }
    }

    pub fn total(&self) -> u64 {
        self.high_outlier + self.low_outlier + self.normal_variance
    }
}

impl<'a> FromIterator<&'a ClaimScore> for OutlierBreakdown {
    fn from_iter<I: IntoIterator<Item = &'a ClaimScore>>(iter: I) -> Self {
        let mut breakdown = Self::default();
        for score in iter {
            breakdown.record(score.outlier_status);
        }
        breakdown
    }
}

/// Result of one scoring pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub prerequisite: Prerequisite,
    /// Claims scored and written
    pub processed: u64,
    pub breakdown: OutlierBreakdown,
    pub scores: Vec<ClaimScore>,
}

impl ScoreSet {
    /// A pass that found nothing eligible and wrote nothing
    pub fn empty(prerequisite: Prerequisite) -> Self {
        Self {
            prerequisite,
            processed: 0,
            breakdown: OutlierBreakdown::default(),
            scores: Vec::new(),
        }
    }

    pub fn new(prerequisite: Prerequisite, processed: u64, scores: Vec<ClaimScore>) -> Self {
        let breakdown = scores.iter().collect();
        Self {
            prerequisite,
            processed,
            breakdown,
            scores,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.processed == 0
    }

    pub fn get(&self, claim_id: &str) -> Option<&ClaimScore> {
        self.scores.iter().find(|s| s.claim_id == claim_id)
    }
}
