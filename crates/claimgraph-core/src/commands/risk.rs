//! Entity risk profile commands
//!
//! Doctors and hospitals are resolved by exact ID or exact name, claims by ID.

use futures_util::TryStreamExt;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::config::RiskConfig;
use crate::domain::benchmark::CostAccumulator;
use crate::domain::risk::{
    CASE_MIX_SIZE, CaseMixAlert, CaseMixEntry, ClaimRiskProfile, DoctorRiskProfile,
    FinancialFlag, FinancialProfile, HospitalRiskProfile, UpcodingVerdict, doctor_case_mix_alerts,
    financial_z_score, hospital_case_mix_alerts, share_pct, variance_pct,
};
use crate::error::{Error, Result};
use crate::infrastructure::graph::SqliteGraphStore;

/// Risk profile of a doctor
pub async fn doctor_profile(
    pool: &SqlitePool,
    query: &str,
    config: &RiskConfig,
) -> Result<DoctorRiskProfile> {
    let store = SqliteGraphStore::new(pool.clone());
    let doctor = store
        .find_doctor(query)
        .await?
        .ok_or_else(|| Error::DoctorNotFound(query.to_string()))?;

    let global = global_costs(pool).await?;
    let (volume, avg_cost) = entity_volume(pool, "doctor_id", &doctor.id).await?;
    let z_score = financial_z_score(avg_cost, &global);
    let gp = doctor.is_general_practitioner();

    let case_mix = case_mix(pool, "doctor_id", &doctor.id, volume, |name, share| {
        doctor_case_mix_alerts(gp, name, share, config)
    })
    .await?;

    debug!(doctor_id = %doctor.id, volume, "Doctor risk profile built");

    Ok(DoctorRiskProfile {
        id: doctor.id,
        name: doctor.name,
        specialization: doctor.specialization,
        financial: FinancialProfile {
            volume,
            avg_cost,
            z_score,
            flag: FinancialFlag::for_doctor(z_score, config),
        },
        case_mix,
    })
}

/// Risk profile of a hospital
pub async fn hospital_profile(
    pool: &SqlitePool,
    query: &str,
    config: &RiskConfig,
) -> Result<HospitalRiskProfile> {
    let store = SqliteGraphStore::new(pool.clone());
    let hospital = store
        .find_hospital(query)
        .await?
        .ok_or_else(|| Error::HospitalNotFound(query.to_string()))?;

    let global = global_costs(pool).await?;
    let (volume, avg_cost) = entity_volume(pool, "hospital_id", &hospital.id).await?;
    let z_score = financial_z_score(avg_cost, &global);

    let case_mix = case_mix(pool, "hospital_id", &hospital.id, volume, |_, share| {
        hospital_case_mix_alerts(share, config)
    })
    .await?;

    debug!(hospital_id = %hospital.id, volume, "Hospital risk profile built");

    Ok(HospitalRiskProfile {
        id: hospital.id,
        name: hospital.name,
        specialties: hospital.specialties,
        financial: FinancialProfile {
            volume,
            avg_cost,
            z_score,
            flag: FinancialFlag::for_hospital(z_score, config),
        },
        case_mix,
    })
}

/// Cost of one claim against its diagnosis reference cost
///
/// Also reports the upcoding verdict and the procedures the diagnosis
/// requires, so a reviewer can check them against the claim.
pub async fn claim_profile(
    pool: &SqlitePool,
    claim_id: &str,
    config: &RiskConfig,
) -> Result<ClaimRiskProfile> {
    let store = SqliteGraphStore::new(pool.clone());
    let claim = store
        .get_claim(claim_id)
        .await?
        .ok_or_else(|| Error::ClaimNotFound(claim_id.to_string()))?;

    let code = claim.diagnosis_code.clone().ok_or_else(|| {
        Error::InvalidInput(format!("Claim '{}' is not coded as a diagnosis", claim_id))
    })?;
    let diagnosis = store
        .get_diagnosis(&code)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Diagnosis '{}'", code)))?;
    let required_procedures = store.required_procedures(&code).await?;

    let variance = variance_pct(claim.total_cost, diagnosis.reference_cost);
    let verdict = UpcodingVerdict::assess(claim.total_cost, variance, config);
    debug!(claim = %claim.id, ?verdict, "Claim assessed");

    Ok(ClaimRiskProfile {
        id: claim.id,
        total_cost: claim.total_cost,
        status: claim.status,
        diagnosis_code: diagnosis.code,
        diagnosis_name: diagnosis.name,
        reference_cost: diagnosis.reference_cost,
        variance_pct: variance,
        verdict,
        required_procedures,
        z_score: claim.z_score,
        outlier_status: claim.outlier_status,
    })
}

/// Mean and sample deviation of every recorded claim cost
async fn global_costs(pool: &SqlitePool) -> Result<CostAccumulator> {
    let costs = sqlx::query_scalar::<_, f64>(
        "SELECT total_cost FROM claims WHERE total_cost IS NOT NULL",
    )
    .fetch(pool)
    .try_fold(CostAccumulator::new(), |mut acc, cost| async move {
        acc.push(cost);
        Ok(acc)
    })
    .await?;
    Ok(costs)
}

/// `column` is a fixed claims column name, never user input
async fn entity_volume(pool: &SqlitePool, column: &str, id: &str) -> Result<(u64, Option<f64>)> {
    let (volume, avg_cost): (i64, Option<f64>) = sqlx::query_as(&format!(
        "SELECT COUNT(*), AVG(total_cost) FROM claims WHERE {} = ?",
        column
    ))
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok((volume as u64, avg_cost))
}

#[derive(FromRow)]
struct CaseMixRow {
    diagnosis_name: String,
    claims: i64,
}

async fn case_mix<F>(
    pool: &SqlitePool,
    column: &str,
    id: &str,
    volume: u64,
    alerts: F,
) -> Result<Vec<CaseMixEntry>>
where
    F: Fn(&str, f64) -> Vec<CaseMixAlert>,
{
    let rows: Vec<CaseMixRow> = sqlx::query_as(&format!(
        r#"
        SELECT d.name AS diagnosis_name, COUNT(*) AS claims
        FROM claims c
        JOIN diagnoses d ON d.code = c.diagnosis_code
        WHERE c.{} = ?
        GROUP BY d.code, d.name
        ORDER BY claims DESC, d.name
        LIMIT ?
        "#,
        column
    ))
    .bind(id)
    .bind(CASE_MIX_SIZE as i64)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let claims = row.claims as u64;
            let share = share_pct(claims, volume);
            CaseMixEntry {
                alerts: alerts(&row.diagnosis_name, share),
                diagnosis_name: row.diagnosis_name,
                claims,
                share_pct: share,
            }
        })
        .collect())
}
