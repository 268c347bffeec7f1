//! Market benchmarks and the run that produced them

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stats::{CostAccumulator, effective_std_dev};

/// Market cost statistics for one diagnosis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisBenchmark {
    pub diagnosis_code: String,
    pub market_avg_cost: f64,
    /// Always strictly positive
    pub market_std_dev: f64,
}

impl DiagnosisBenchmark {
    /// Build a benchmark from grouped costs, `None` for an empty group
    pub fn from_costs(diagnosis_code: impl Into<String>, costs: &CostAccumulator) -> Option<Self> {
        let avg = costs.mean()?;
        Some(Self {
            diagnosis_code: diagnosis_code.into(),
            market_avg_cost: avg,
            market_std_dev: effective_std_dev(avg, costs.sample_std_dev()),
        })
    }
}

/// Marker recorded every time benchmarks are populated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRun {
    pub id: String,
    pub computed_at: DateTime<Utc>,
    pub diagnoses_updated: u64,
    pub claims_observed: u64,
}

impl BenchmarkRun {
    pub fn new(diagnoses_updated: u64, claims_observed: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            computed_at: Utc::now(),
            diagnoses_updated,
            claims_observed,
        }
    }
}

/// Whether scoring had benchmarks to work from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "computed_at", rename_all = "snake_case")]
pub enum Prerequisite {
    /// No benchmark run recorded and no diagnosis carries a benchmark
    NeverComputed,
    /// Diagnoses carry benchmarks but no run marker exists
    Unrecorded,
    /// Benchmarks were populated at this time (possibly matching nothing)
    ComputedAt(DateTime<Utc>),
}

impl std::fmt::Display for Prerequisite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NeverComputed => f.write_str("benchmarks never computed"),
            Self::Unrecorded => f.write_str("benchmarks present, run not recorded"),
            Self::ComputedAt(ts) => write!(f, "benchmarks computed at {}", ts.to_rfc3339()),
        }
    }
}

/// Benchmarks keyed by diagnosis code, the input of the scoring pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSet {
    run: Option<BenchmarkRun>,
    benchmarks: BTreeMap<String, DiagnosisBenchmark>,
}

impl BenchmarkSet {
    pub fn new(run: Option<BenchmarkRun>, benchmarks: impl IntoIterator<Item = DiagnosisBenchmark>) -> Self {
        Self {
            run,
            benchmarks: benchmarks
                .into_iter()
                .map(|b| (b.diagnosis_code.clone(), b))
                .collect(),
        }
    }

    pub fn get(&self, diagnosis_code: &str) -> Option<&DiagnosisBenchmark> {
        self.benchmarks.get(diagnosis_code)
    }

    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }

    /// Benchmarks in diagnosis code order
    pub fn iter(&self) -> impl Iterator<Item = &DiagnosisBenchmark> {
        self.benchmarks.values()
    }

    pub fn run(&self) -> Option<&BenchmarkRun> {
        self.run.as_ref()
    }

    pub fn prerequisite(&self) -> Prerequisite {
        match (&self.run, self.benchmarks.is_empty()) {
            (Some(run), _) => Prerequisite::ComputedAt(run.computed_at),
            (None, true) => Prerequisite::NeverComputed,
            (None, false) => Prerequisite::Unrecorded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benchmark_from_single_cost_uses_fallback() {
        let costs: CostAccumulator = [50.0].into_iter().collect();
        let benchmark = DiagnosisBenchmark::from_costs("D2", &costs).unwrap();
        assert_eq!(benchmark.market_avg_cost, 50.0);
        assert!((benchmark.market_std_dev - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_benchmark_from_empty_group_is_none() {
        assert!(DiagnosisBenchmark::from_costs("D3", &CostAccumulator::new()).is_none());
    }

    #[test]
    fn test_prerequisite_states() {
        assert_eq!(BenchmarkSet::default().prerequisite(), Prerequisite::NeverComputed);

        let benchmark = DiagnosisBenchmark {
            diagnosis_code: "D1".into(),
            market_avg_cost: 100.0,
            market_std_dev: 20.0,
        };
        let unrecorded = BenchmarkSet::new(None, vec![benchmark]);
        assert_eq!(unrecorded.prerequisite(), Prerequisite::Unrecorded);

        let run = BenchmarkRun::new(0, 0);
        let computed_at = run.computed_at;
        let empty_run = BenchmarkSet::new(Some(run), Vec::new());
        assert_eq!(empty_run.prerequisite(), Prerequisite::ComputedAt(computed_at));
    }

    #[test]
    fn test_set_is_keyed_by_code() {
        let set = BenchmarkSet::new(
            None,
            vec![
                DiagnosisBenchmark {
                    diagnosis_code: "J18".into(),
                    market_avg_cost: 10.0,
                    market_std_dev: 1.0,
                },
                DiagnosisBenchmark {
                    diagnosis_code: "A09".into(),
                    market_avg_cost: 20.0,
                    market_std_dev: 2.0,
                },
            ],
        );
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("A09").map(|b| b.market_avg_cost), Some(20.0));
        let codes: Vec<_> = set.iter().map(|b| b.diagnosis_code.as_str()).collect();
        assert_eq!(codes, vec!["A09", "J18"]);
    }
}
