//! Cost statistics for market benchmarks

/// Fraction of the mean used as the spread when the sample standard
/// deviation is zero or undefined
pub const STD_DEV_FALLBACK_RATIO: f64 = 0.15;

/// Z-score magnitude beyond which a claim is an outlier
pub const OUTLIER_THRESHOLD: f64 = 2.0;

/// Running mean and sum of squared deviations (Welford)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostAccumulator {
    count: u64,
    mean: f64,
    m2: f64,
}

impl CostAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one cost observation into the running statistics
    pub fn push(&mut self, cost: f64) {
        self.count += 1;
        let old_mean = self.mean;
        self.mean += (cost - old_mean) / self.count as f64;
        // M2_new = M2_old + (x - old_mean) * (x - new_mean)
        self.m2 += (cost - old_mean) * (cost - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Arithmetic mean, `None` before the first observation
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Sample (n - 1) standard deviation, `None` below two observations
    pub fn sample_std_dev(&self) -> Option<f64> {
        if self.count < 2 {
            return None;
        }
        Some((self.m2 / (self.count - 1) as f64).sqrt())
    }
}

impl Extend<f64> for CostAccumulator {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for cost in iter {
            self.push(cost);
        }
    }
}

impl FromIterator<f64> for CostAccumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Self::new();
        acc.extend(iter);
        acc
    }
}

/// Spread persisted as `market_std_dev`
///
/// A zero or undefined sample deviation is replaced by
/// `avg * STD_DEV_FALLBACK_RATIO` so that z-scores stay finite.
pub fn effective_std_dev(avg: f64, sample_std: Option<f64>) -> f64 {
    match sample_std {
        Some(std) if std != 0.0 => std,
        _ => avg * STD_DEV_FALLBACK_RATIO,
    }
}

/// Standardized deviation of `cost` from a benchmark
pub fn z_score(cost: f64, avg: f64, std: f64) -> f64 {
    (cost - avg) / std
}
