//! Claiming-behavior analysis
//!
//! Aggregates already-computed claim z-scores at one hospital by diagnosis,
//! surfacing the diagnoses where the hospital bills furthest above market.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::graph::{ClaimDeviation, GraphStore};
use crate::error::Result;

/// Label carried on every analysis response
pub const ANALYSIS_TYPE: &str = "claiming_behavior_normal_distribution";

/// Average deviation of one diagnosis at a hospital
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisDeviation {
    pub diagnosis_id: String,
    pub diagnosis_name: String,
    pub total_claims: u64,
    /// Mean of the per-claim z-scores
    pub z_score: f64,
}

/// Per-diagnosis deviations at one hospital, highest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalAnalysis {
    pub hospital_id: String,
    pub hospital_name: Option<String>,
    pub analysis_type: String,
    pub data: Vec<DiagnosisDeviation>,
}

impl HospitalAnalysis {
    /// No benchmarked, scored claims matched the hospital
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Default)]
struct Group {
    name: String,
    total_claims: u64,
    z_sum: f64,
    scored: u64,
}

/// Group claim rows by diagnosis and order by average z-score, descending
///
/// `total_claims` counts every row in the group; the average only covers
/// rows with a z-score. Groups without any scored claim are dropped. Ties
/// are broken by diagnosis code so the order is stable.
pub fn aggregate_deviations(rows: &[ClaimDeviation]) -> Vec<DiagnosisDeviation> {
    let mut groups: HashMap<&str, Group> = HashMap::new();

    for row in rows {
        let group = groups.entry(row.diagnosis_code.as_str()).or_insert_with(|| Group {
            name: row.diagnosis_name.clone(),
            ..Default::default()
        });
        group.total_claims += 1;
        if let Some(z) = row.z_score {
            group.z_sum += z;
            group.scored += 1;
        }
    }

    let mut deviations: Vec<DiagnosisDeviation> = groups
        .into_iter()
        .filter(|(_, g)| g.scored > 0)
        .map(|(code, g)| DiagnosisDeviation {
            diagnosis_id: code.to_string(),
            diagnosis_name: g.name,
            total_claims: g.total_claims,
            z_score: g.z_sum / g.scored as f64,
        })
        .collect();

    deviations.sort_by(|a, b| {
        b.z_score
            .total_cmp(&a.z_score)
            .then_with(|| a.diagnosis_id.cmp(&b.diagnosis_id))
    });
    deviations
}

/// Analyze how far a hospital's claims deviate from market benchmarks
///
/// An unknown hospital or one without scored claims yields an empty
/// analysis; mapping that to "not found" is up to the caller.
pub async fn analyze_hospital_claiming_behavior<S>(
    store: &S,
    hospital_id: &str,
) -> Result<HospitalAnalysis>
where
    S: GraphStore + ?Sized,
{
    let rows = store.hospital_claim_deviations(hospital_id).await?;
    let hospital_name = rows.first().map(|r| r.hospital_name.clone());
    let data = aggregate_deviations(&rows);

    debug!(
        hospital_id = %hospital_id,
        claims = rows.len(),
        diagnoses = data.len(),
        "Analyzed hospital claiming behavior"
    );

    Ok(HospitalAnalysis {
        hospital_id: hospital_id.to_string(),
        hospital_name,
        analysis_type: ANALYSIS_TYPE.to_string(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, z: Option<f64>) -> ClaimDeviation {
        ClaimDeviation {
            hospital_name: "RS Sehat".into(),
            diagnosis_code: code.into(),
            diagnosis_name: format!("Diagnosis {code}"),
            z_score: z,
        }
    }

    #[test]
    fn test_groups_sorted_by_average_descending() {
        let rows = vec![
            row("A", Some(3.0)),
            row("A", Some(3.2)),
            row("B", Some(-1.0)),
            row("C", Some(0.4)),
        ];

        let result = aggregate_deviations(&rows);
        let order: Vec<_> = result.iter().map(|d| d.diagnosis_id.as_str()).collect();
        assert_eq!(order, vec!["A", "C", "B"]);
        assert!((result[0].z_score - 3.1).abs() < 1e-9);
        assert_eq!(result[0].total_claims, 2);
    }

    #[test]
    fn test_unscored_claims_count_but_do_not_average() {
        let rows = vec![row("A", Some(1.0)), row("A", None), row("A", Some(3.0))];
        let result = aggregate_deviations(&rows);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].total_claims, 3);
        assert!((result[0].z_score - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_group_without_scores_is_dropped() {
        let rows = vec![row("A", None), row("B", Some(0.5))];
        let result = aggregate_deviations(&rows);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].diagnosis_id, "B");
    }

    #[test]
    fn test_ties_break_on_diagnosis_code() {
        let rows = vec![row("Z", Some(1.0)), row("M", Some(1.0))];
        let result = aggregate_deviations(&rows);
        assert_eq!(result[0].diagnosis_id, "M");
        assert_eq!(result[1].diagnosis_id, "Z");
    }

    #[test]
    fn test_empty_rows() {
        assert!(aggregate_deviations(&[]).is_empty());
    }
}
