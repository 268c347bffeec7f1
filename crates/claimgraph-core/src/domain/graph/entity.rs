//! Node types of the claims graph
//!
//! Hospitals, doctors, diagnoses and claims, plus the categorical outlier
//! label the scoring pass writes onto claims. The same structs are the
//! JSONL record format used by `storage::jsonl`.

use serde::{Deserialize, Serialize};

use crate::domain::benchmark::OUTLIER_THRESHOLD;

/// A hospital claims are submitted at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub class_type: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub facilities: Vec<String>,
}

impl Hospital {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            class_type: None,
            latitude: None,
            longitude: None,
            specialties: Vec::new(),
            facilities: Vec::new(),
        }
    }

    pub fn with_class_type(mut self, class_type: impl Into<String>) -> Self {
        self.class_type = Some(class_type.into());
        self
    }

    pub fn with_specialties(mut self, specialties: Vec<String>) -> Self {
        self.specialties = specialties;
        self
    }
}

/// A doctor who submits claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub primary_hospital_id: Option<String>,
}

impl Doctor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            specialization: String::new(),
            primary_hospital_id: None,
        }
    }

    pub fn with_specialization(mut self, specialization: impl Into<String>) -> Self {
        self.specialization = specialization.into();
        self
    }

    pub fn at_hospital(mut self, hospital_id: impl Into<String>) -> Self {
        self.primary_hospital_id = Some(hospital_id.into());
        self
    }

    /// General practitioners are recorded as "GP"
    pub fn is_general_practitioner(&self) -> bool {
        self.specialization.eq_ignore_ascii_case("GP")
    }
}

/// A diagnosis (ICD-10 code) claims are coded as
///
/// `market_avg_cost` and `market_std_dev` are derived by the benchmark pass
/// and are `None` until a claim with a positive cost is coded as this
/// diagnosis and benchmarks have been populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub code: String,
    pub name: String,
    /// Catalogue reference cost
    #[serde(default)]
    pub reference_cost: Option<f64>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub market_avg_cost: Option<f64>,
    #[serde(default)]
    pub market_std_dev: Option<f64>,
    /// Codes of procedures this diagnosis requires (`REQUIRES` edges)
    #[serde(default)]
    pub required_procedures: Vec<String>,
}

impl Diagnosis {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            reference_cost: None,
            severity: None,
            market_avg_cost: None,
            market_std_dev: None,
            required_procedures: Vec::new(),
        }
    }

    pub fn with_reference_cost(mut self, cost: f64) -> Self {
        self.reference_cost = Some(cost);
        self
    }

    pub fn requires(mut self, procedure_code: impl Into<String>) -> Self {
        self.required_procedures.push(procedure_code.into());
        self
    }
}

/// A medical procedure a diagnosis can require
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub avg_cost: Option<f64>,
}

impl Procedure {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            avg_cost: None,
        }
    }

    pub fn with_avg_cost(mut self, cost: f64) -> Self {
        self.avg_cost = Some(cost);
        self
    }
}

/// An insurance claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: String,
    #[serde(default)]
    pub hospital_id: Option<String>,
    #[serde(default)]
    pub doctor_id: Option<String>,
    /// The single diagnosis this claim is coded as
    #[serde(default)]
    pub diagnosis_code: Option<String>,
    #[serde(default)]
    pub total_cost: Option<f64>,
    /// Adjudication label (e.g. FRAUD / NORMAL), absent until reviewed
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub z_score: Option<f64>,
    #[serde(default)]
    pub outlier_status: Option<OutlierStatus>,
}

impl Claim {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            hospital_id: None,
            doctor_id: None,
            diagnosis_code: None,
            total_cost: None,
            status: None,
            z_score: None,
            outlier_status: None,
        }
    }

    pub fn at_hospital(mut self, hospital_id: impl Into<String>) -> Self {
        self.hospital_id = Some(hospital_id.into());
        self
    }

    pub fn by_doctor(mut self, doctor_id: impl Into<String>) -> Self {
        self.doctor_id = Some(doctor_id.into());
        self
    }

    pub fn coded_as(mut self, diagnosis_code: impl Into<String>) -> Self {
        self.diagnosis_code = Some(diagnosis_code.into());
        self
    }

    pub fn with_cost(mut self, total_cost: f64) -> Self {
        self.total_cost = Some(total_cost);
        self
    }
}

/// Outlier classification of a claim's z-score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutlierStatus {
    /// z > 2.0
    HighOutlier,
    /// z < -2.0
    LowOutlier,
    /// -2.0 <= z <= 2.0
    NormalVariance,
}

impl OutlierStatus {
    /// Classify a z-score against the fixed ±2.0 bounds (exclusive)
    pub fn from_z_score(z: f64) -> Self {
        if z > OUTLIER_THRESHOLD {
            Self::HighOutlier
        } else if z < -OUTLIER_THRESHOLD {
            Self::LowOutlier
        } else {
            Self::NormalVariance
        }
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighOutlier => "HIGH_OUTLIER",
            Self::LowOutlier => "LOW_OUTLIER",
            Self::NormalVariance => "NORMAL_VARIANCE",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "HIGH_OUTLIER" => Some(Self::HighOutlier),
            "LOW_OUTLIER" => Some(Self::LowOutlier),
            "NORMAL_VARIANCE" => Some(Self::NormalVariance),
            _ => None,
        }
    }

    /// Get all statuses
    pub fn all() -> &'static [OutlierStatus] {
        &[Self::HighOutlier, Self::LowOutlier, Self::NormalVariance]
    }
}

impl std::fmt::Display for OutlierStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outlier_status_parse_roundtrip() {
        for status in OutlierStatus::all() {
            assert_eq!(OutlierStatus::parse(status.as_str()), Some(*status));
        }
        assert_eq!(OutlierStatus::parse("normal_variance"), Some(OutlierStatus::NormalVariance));
        assert_eq!(OutlierStatus::parse("FRAUD"), None);
    }

    #[test]
    fn test_classification_bounds_are_exclusive() {
        assert_eq!(OutlierStatus::from_z_score(2.0), OutlierStatus::NormalVariance);
        assert_eq!(OutlierStatus::from_z_score(-2.0), OutlierStatus::NormalVariance);
        assert_eq!(OutlierStatus::from_z_score(2.0001), OutlierStatus::HighOutlier);
        assert_eq!(OutlierStatus::from_z_score(-2.0001), OutlierStatus::LowOutlier);
        assert_eq!(OutlierStatus::from_z_score(0.0), OutlierStatus::NormalVariance);
    }

    #[test]
    fn test_outlier_status_serializes_as_label() {
        let json = serde_json::to_string(&OutlierStatus::HighOutlier).unwrap();
        assert_eq!(json, "\"HIGH_OUTLIER\"");
    }

    #[test]
    fn test_claim_record_defaults_missing_fields() {
        let claim: Claim = serde_json::from_str(r#"{"id":"C9","total_cost":125.5}"#).unwrap();
        assert_eq!(claim.total_cost, Some(125.5));
        assert!(claim.diagnosis_code.is_none());
        assert!(claim.outlier_status.is_none());
    }

    #[test]
    fn test_diagnosis_record_reads_requirements() {
        let diagnosis: Diagnosis = serde_json::from_str(
            r#"{"code":"I21.9","name":"Acute Myocardial Infarction","required_procedures":["89.52"]}"#,
        )
        .unwrap();
        assert_eq!(diagnosis.required_procedures, vec!["89.52"]);

        let bare: Diagnosis = serde_json::from_str(r#"{"code":"A90","name":"Dengue"}"#).unwrap();
        assert!(bare.required_procedures.is_empty());
    }

    #[test]
    fn test_doctor_gp_detection() {
        assert!(Doctor::new("DR1", "Dr. Budi").with_specialization("gp").is_general_practitioner());
        assert!(!Doctor::new("DR2", "Dr. Sari").with_specialization("Cardiology").is_general_practitioner());
    }
}
