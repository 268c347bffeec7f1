//! Entity risk profiles
//!
//! Financial and case-mix flags for doctors, hospitals and single claims.
//! The financial z-score compares an entity's average claim cost with the
//! mean and sample deviation of every claim cost in the graph.

use serde::{Deserialize, Serialize};

use crate::config::RiskConfig;
use crate::domain::benchmark::CostAccumulator;
use crate::domain::graph::{OutlierStatus, Procedure};

/// Diagnoses listed in a case mix
pub const CASE_MIX_SIZE: usize = 3;

/// Financial standing of an entity's average claim cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinancialFlag {
    Normal,
    HighCost,
    ExtremeOutlier,
    StatisticalAnomaly,
}

impl FinancialFlag {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::HighCost => "High cost",
            Self::ExtremeOutlier => "Extreme outlier",
            Self::StatisticalAnomaly => "Statistical anomaly",
        }
    }

    /// Flag a doctor's average-cost z-score
    pub fn for_doctor(z: Option<f64>, config: &RiskConfig) -> Self {
        match z {
            Some(z) if z > config.doctor_extreme_z => Self::ExtremeOutlier,
            Some(z) if z > config.doctor_high_z => Self::HighCost,
            _ => Self::Normal,
        }
    }

    /// Flag a hospital's average-cost z-score
    pub fn for_hospital(z: Option<f64>, config: &RiskConfig) -> Self {
        match z {
            Some(z) if z > config.hospital_anomaly_z => Self::StatisticalAnomaly,
            _ => Self::Normal,
        }
    }
}

/// Upcoding assessment of a single claim against its diagnosis reference cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpcodingVerdict {
    HighRiskUpcoding,
    ModerateRisk,
    Normal,
    NoCostProvided,
    /// The diagnosis has no usable reference cost to compare against
    NoReferenceCost,
}

impl UpcodingVerdict {
    pub fn label(&self) -> &'static str {
        match self {
            Self::HighRiskUpcoding => "HIGH RISK (upcoding)",
            Self::ModerateRisk => "MODERATE RISK",
            Self::Normal => "NORMAL",
            Self::NoCostProvided => "no cost provided",
            Self::NoReferenceCost => "no reference cost",
        }
    }

    /// Classify a claim from its cost and its variance against the reference
    ///
    /// Thresholds are exclusive: a variance exactly at a threshold falls in
    /// the lower band.
    pub fn assess(cost: Option<f64>, variance_pct: Option<f64>, config: &RiskConfig) -> Self {
        if cost.is_none() {
            return Self::NoCostProvided;
        }
        match variance_pct {
            None => Self::NoReferenceCost,
            Some(v) if v > config.upcoding_high_pct => Self::HighRiskUpcoding,
            Some(v) if v > config.upcoding_moderate_pct => Self::ModerateRisk,
            Some(_) => Self::Normal,
        }
    }
}

/// Alerts raised on one case-mix entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseMixAlert {
    /// A general practitioner billing surgical diagnoses
    ScopeMismatch,
    /// One diagnosis dominates a doctor's volume
    ConcentrationRisk,
    /// One diagnosis dominates a hospital's volume
    SingleDiseaseDominance,
}

impl CaseMixAlert {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ScopeMismatch => "scope mismatch",
            Self::ConcentrationRisk => "concentration risk",
            Self::SingleDiseaseDominance => "single disease dominance",
        }
    }
}

/// One diagnosis in an entity's case mix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseMixEntry {
    pub diagnosis_name: String,
    pub claims: u64,
    /// Share of the entity's total claim volume, in percent
    pub share_pct: f64,
    pub alerts: Vec<CaseMixAlert>,
}

/// Volume and cost figures shared by doctor and hospital profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialProfile {
    pub volume: u64,
    pub avg_cost: Option<f64>,
    pub z_score: Option<f64>,
    pub flag: FinancialFlag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorRiskProfile {
    pub id: String,
    pub name: String,
    pub specialization: String,
    pub financial: FinancialProfile,
    pub case_mix: Vec<CaseMixEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalRiskProfile {
    pub id: String,
    pub name: String,
    pub specialties: Vec<String>,
    pub financial: FinancialProfile,
    pub case_mix: Vec<CaseMixEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRiskProfile {
    pub id: String,
    pub total_cost: Option<f64>,
    pub status: Option<String>,
    pub diagnosis_code: String,
    pub diagnosis_name: String,
    pub reference_cost: Option<f64>,
    /// Percent above (positive) or below the reference cost
    pub variance_pct: Option<f64>,
    pub verdict: UpcodingVerdict,
    /// Procedures the claim's diagnosis requires
    pub required_procedures: Vec<Procedure>,
    pub z_score: Option<f64>,
    pub outlier_status: Option<OutlierStatus>,
}

/// Z-score of an entity average against the global cost distribution
///
/// `None` when either side is missing or the global deviation is zero or
/// undefined.
pub fn financial_z_score(entity_avg: Option<f64>, global: &CostAccumulator) -> Option<f64> {
    let avg = entity_avg?;
    let global_avg = global.mean()?;
    let global_std = global.sample_std_dev().filter(|s| *s > 0.0)?;
    Some((avg - global_avg) / global_std)
}

/// Percentage of a cost above or below the reference cost
pub fn variance_pct(cost: Option<f64>, reference: Option<f64>) -> Option<f64> {
    let cost = cost?;
    let reference = reference.filter(|r| *r != 0.0)?;
    Some((cost - reference) / reference * 100.0)
}

/// Share of `claims` in `volume`, in percent
pub fn share_pct(claims: u64, volume: u64) -> f64 {
    if volume == 0 {
        return 0.0;
    }
    claims as f64 / volume as f64 * 100.0
}

/// Case-mix alerts for a doctor's diagnosis entry
pub fn doctor_case_mix_alerts(
    is_general_practitioner: bool,
    diagnosis_name: &str,
    share_pct: f64,
    config: &RiskConfig,
) -> Vec<CaseMixAlert> {
    let mut alerts = Vec::new();
    if is_general_practitioner && diagnosis_name.contains("Surgery") {
        alerts.push(CaseMixAlert::ScopeMismatch);
    }
    if share_pct > config.concentration_pct {
        alerts.push(CaseMixAlert::ConcentrationRisk);
    }
    alerts
}

/// Case-mix alerts for a hospital's diagnosis entry
pub fn hospital_case_mix_alerts(share_pct: f64, config: &RiskConfig) -> Vec<CaseMixAlert> {
    if share_pct > config.dominance_pct {
        vec![CaseMixAlert::SingleDiseaseDominance]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doctor_flags() {
        let config = RiskConfig::default();
        assert_eq!(FinancialFlag::for_doctor(Some(3.5), &config), FinancialFlag::ExtremeOutlier);
        assert_eq!(FinancialFlag::for_doctor(Some(3.0), &config), FinancialFlag::HighCost);
        assert_eq!(FinancialFlag::for_doctor(Some(1.5), &config), FinancialFlag::Normal);
        assert_eq!(FinancialFlag::for_doctor(None, &config), FinancialFlag::Normal);
    }

    #[test]
    fn test_hospital_flags() {
        let config = RiskConfig::default();
        assert_eq!(
            FinancialFlag::for_hospital(Some(2.6), &config),
            FinancialFlag::StatisticalAnomaly
        );
        assert_eq!(FinancialFlag::for_hospital(Some(2.5), &config), FinancialFlag::Normal);
    }

    #[test]
    fn test_financial_z_requires_spread() {
        let flat: CostAccumulator = [100.0, 100.0].into_iter().collect();
        assert!(financial_z_score(Some(150.0), &flat).is_none());

        let single: CostAccumulator = [100.0].into_iter().collect();
        assert!(financial_z_score(Some(150.0), &single).is_none());

        let spread: CostAccumulator = [100.0, 120.0, 80.0].into_iter().collect();
        let z = financial_z_score(Some(140.0), &spread).unwrap();
        assert!((z - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_variance_pct() {
        assert_eq!(variance_pct(Some(150.0), Some(100.0)), Some(50.0));
        assert_eq!(variance_pct(Some(80.0), Some(100.0)), Some(-20.0));
        assert!(variance_pct(Some(80.0), Some(0.0)).is_none());
        assert!(variance_pct(None, Some(100.0)).is_none());
    }

    #[test]
    fn test_upcoding_verdict_bands() {
        let config = RiskConfig::default();
        let verdict = |v: f64| UpcodingVerdict::assess(Some(1.0), Some(v), &config);

        assert_eq!(verdict(50.1), UpcodingVerdict::HighRiskUpcoding);
        assert_eq!(verdict(50.0), UpcodingVerdict::ModerateRisk);
        assert_eq!(verdict(20.1), UpcodingVerdict::ModerateRisk);
        assert_eq!(verdict(20.0), UpcodingVerdict::Normal);
        assert_eq!(verdict(-40.0), UpcodingVerdict::Normal);
    }

    #[test]
    fn test_upcoding_verdict_without_figures() {
        let config = RiskConfig::default();

        assert_eq!(
            UpcodingVerdict::assess(None, None, &config),
            UpcodingVerdict::NoCostProvided
        );
        assert_eq!(
            UpcodingVerdict::assess(Some(500.0), None, &config),
            UpcodingVerdict::NoReferenceCost
        );
    }

    #[test]
    fn test_upcoding_thresholds_follow_config() {
        let config = RiskConfig {
            upcoding_high_pct: 100.0,
            upcoding_moderate_pct: 75.0,
            ..RiskConfig::default()
        };

        assert_eq!(
            UpcodingVerdict::assess(Some(1.0), Some(80.0), &config),
            UpcodingVerdict::ModerateRisk
        );
        assert_eq!(
            UpcodingVerdict::assess(Some(1.0), Some(60.0), &config),
            UpcodingVerdict::Normal
        );
    }

    #[test]
    fn test_gp_surgery_scope_mismatch() {
        let config = RiskConfig::default();
        let alerts = doctor_case_mix_alerts(true, "Appendix Surgery", 70.0, &config);
        assert_eq!(alerts, vec![CaseMixAlert::ScopeMismatch, CaseMixAlert::ConcentrationRisk]);

        let specialist = doctor_case_mix_alerts(false, "Appendix Surgery", 10.0, &config);
        assert!(specialist.is_empty());
    }

    #[test]
    fn test_hospital_dominance_threshold() {
        let config = RiskConfig::default();
        assert!(hospital_case_mix_alerts(50.0, &config).is_empty());
        assert_eq!(
            hospital_case_mix_alerts(50.1, &config),
            vec![CaseMixAlert::SingleDiseaseDominance]
        );
    }

    #[test]
    fn test_share_pct() {
        assert_eq!(share_pct(0, 0), 0.0);
        assert_eq!(share_pct(3, 4), 75.0);
    }
}
