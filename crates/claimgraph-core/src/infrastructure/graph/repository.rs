//! SQLite implementation of the GraphStore
//!
//! Nodes are rows, edges are foreign-key columns. Each benchmark and scoring
//! pass commits its writes in a single transaction.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::domain::benchmark::{BenchmarkRun, ClaimScore, DiagnosisBenchmark};
use crate::domain::graph::{
    Claim, ClaimDeviation, Diagnosis, DiagnosisCost, Doctor, GraphStore, Hospital, OutlierStatus,
    Procedure, ScoredClaimSample, ScoringCandidate,
};
use crate::error::{Error, Result};

/// Filters for [`SqliteGraphStore::list_hospitals`]
#[derive(Debug, Clone, Default)]
pub struct HospitalFilter {
    pub class_type: Option<String>,
    /// Matches hospitals offering this specialty (case-insensitive)
    pub specialty: Option<String>,
}

/// Filters for [`SqliteGraphStore::list_doctors`]
#[derive(Debug, Clone, Default)]
pub struct DoctorFilter {
    pub specialization: Option<String>,
    pub hospital_id: Option<String>,
}

/// Filters for [`SqliteGraphStore::list_claims`]
#[derive(Debug, Clone, Default)]
pub struct ClaimFilter {
    pub status: Option<String>,
    pub hospital_id: Option<String>,
    pub doctor_id: Option<String>,
}

/// Row counts across the graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphCounts {
    pub hospitals: u64,
    pub doctors: u64,
    pub diagnoses: u64,
    pub procedures: u64,
    pub claims: u64,
    pub benchmarked_diagnoses: u64,
    pub scored_claims: u64,
}

/// SQLite-backed claims graph
#[derive(Clone)]
pub struct SqliteGraphStore {
    pool: SqlitePool,
}

impl SqliteGraphStore {
    /// Create a new store over an already-migrated pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ========== Node Writes ==========

    /// Insert or update a hospital
    pub async fn save_hospital(&self, hospital: &Hospital) -> Result<()> {
        let specialties = to_json(&hospital.specialties)?;
        let facilities = to_json(&hospital.facilities)?;
        let now = timestamp(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO hospitals (
                id, name, class_type, latitude, longitude, specialties, facilities,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                class_type = excluded.class_type,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                specialties = excluded.specialties,
                facilities = excluded.facilities,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&hospital.id)
        .bind(&hospital.name)
        .bind(&hospital.class_type)
        .bind(hospital.latitude)
        .bind(hospital.longitude)
        .bind(&specialties)
        .bind(&facilities)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!(hospital_id = %hospital.id, "Hospital saved");
        Ok(())
    }

    /// Insert or update a doctor
    pub async fn save_doctor(&self, doctor: &Doctor) -> Result<()> {
        let now = timestamp(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO doctors (id, name, specialization, primary_hospital_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                specialization = excluded.specialization,
                primary_hospital_id = excluded.primary_hospital_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&doctor.id)
        .bind(&doctor.name)
        .bind(&doctor.specialization)
        .bind(&doctor.primary_hospital_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!(doctor_id = %doctor.id, "Doctor saved");
        Ok(())
    }

    /// Insert or update a procedure
    pub async fn save_procedure(&self, procedure: &Procedure) -> Result<()> {
        let now = timestamp(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO procedures (code, name, avg_cost, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(code) DO UPDATE SET
                name = excluded.name,
                avg_cost = excluded.avg_cost,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&procedure.code)
        .bind(&procedure.name)
        .bind(procedure.avg_cost)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!(procedure = %procedure.code, "Procedure saved");
        Ok(())
    }

    /// Insert or update a diagnosis and replace its `REQUIRES` edges
    ///
    /// Market benchmark fields are owned by the benchmark pass and are never
    /// written here. An unknown required procedure rejects the whole record.
    pub async fn save_diagnosis(&self, diagnosis: &Diagnosis) -> Result<()> {
        let now = timestamp(Utc::now());
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO diagnoses (code, name, reference_cost, severity, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(code) DO UPDATE SET
                name = excluded.name,
                reference_cost = excluded.reference_cost,
                severity = excluded.severity,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&diagnosis.code)
        .bind(&diagnosis.name)
        .bind(diagnosis.reference_cost)
        .bind(&diagnosis.severity)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM diagnosis_requirements WHERE diagnosis_code = ?")
            .bind(&diagnosis.code)
            .execute(&mut *tx)
            .await?;

        for procedure_code in &diagnosis.required_procedures {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO diagnosis_requirements (diagnosis_code, procedure_code)
                VALUES (?, ?)
                "#,
            )
            .bind(&diagnosis.code)
            .bind(procedure_code)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(diagnosis = %diagnosis.code, "Diagnosis saved");
        Ok(())
    }

    /// Insert or update a claim
    ///
    /// Scores are owned by the scoring pass and are never written here.
    pub async fn save_claim(&self, claim: &Claim) -> Result<()> {
        let now = timestamp(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO claims (
                id, hospital_id, doctor_id, diagnosis_code, total_cost, status,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                hospital_id = excluded.hospital_id,
                doctor_id = excluded.doctor_id,
                diagnosis_code = excluded.diagnosis_code,
                total_cost = excluded.total_cost,
                status = excluded.status,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&claim.id)
        .bind(&claim.hospital_id)
        .bind(&claim.doctor_id)
        .bind(&claim.diagnosis_code)
        .bind(claim.total_cost)
        .bind(&claim.status)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!(claim_id = %claim.id, "Claim saved");
        Ok(())
    }

    // ========== Node Reads ==========

    /// Get a hospital by ID
    pub async fn get_hospital(&self, id: &str) -> Result<Option<Hospital>> {
        let row: Option<HospitalRow> = sqlx::query_as(&format!("{HOSPITAL_SELECT} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(HospitalRow::into_hospital).transpose()
    }

    /// Get a hospital by exact ID or exact name
    pub async fn find_hospital(&self, query: &str) -> Result<Option<Hospital>> {
        let row: Option<HospitalRow> = sqlx::query_as(&format!(
            "{HOSPITAL_SELECT} WHERE id = ? OR name = ? ORDER BY id = ? DESC, id LIMIT 1"
        ))
        .bind(query)
        .bind(query)
        .bind(query)
        .fetch_optional(&self.pool)
        .await?;

        row.map(HospitalRow::into_hospital).transpose()
    }

    /// Get a doctor by exact ID or exact name
    pub async fn find_doctor(&self, query: &str) -> Result<Option<Doctor>> {
        let row: Option<DoctorRow> = sqlx::query_as(&format!(
            "{DOCTOR_SELECT} WHERE id = ? OR name = ? ORDER BY id = ? DESC, id LIMIT 1"
        ))
        .bind(query)
        .bind(query)
        .bind(query)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DoctorRow::into_doctor))
    }

    /// Get a claim by ID
    pub async fn get_claim(&self, id: &str) -> Result<Option<Claim>> {
        let row: Option<ClaimRow> = sqlx::query_as(&format!("{CLAIM_SELECT} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ClaimRow::into_claim).transpose()
    }

    /// Get a diagnosis by code
    pub async fn get_diagnosis(&self, code: &str) -> Result<Option<Diagnosis>> {
        let row: Option<DiagnosisRow> =
            sqlx::query_as(&format!("{DIAGNOSIS_SELECT} WHERE code = ?"))
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let required: Vec<String> = sqlx::query_scalar(
            "SELECT procedure_code FROM diagnosis_requirements WHERE diagnosis_code = ? ORDER BY procedure_code",
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(row.into_diagnosis(required)))
    }

    /// Get a procedure by code
    pub async fn get_procedure(&self, code: &str) -> Result<Option<Procedure>> {
        let row: Option<ProcedureRow> =
            sqlx::query_as(&format!("{PROCEDURE_SELECT} WHERE code = ?"))
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(ProcedureRow::into_procedure))
    }

    /// Procedures a diagnosis requires, ordered by code
    pub async fn required_procedures(&self, diagnosis_code: &str) -> Result<Vec<Procedure>> {
        let rows: Vec<ProcedureRow> = sqlx::query_as(
            r#"
            SELECT p.code, p.name, p.avg_cost
            FROM diagnosis_requirements r
            JOIN procedures p ON p.code = r.procedure_code
            WHERE r.diagnosis_code = ?
            ORDER BY p.code
            "#,
        )
        .bind(diagnosis_code)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ProcedureRow::into_procedure).collect())
    }

    /// List hospitals ordered by ID
    pub async fn list_hospitals(&self, filter: &HospitalFilter) -> Result<Vec<Hospital>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("{HOSPITAL_SELECT} WHERE 1 = 1"));
        if let Some(class_type) = &filter.class_type {
            query.push(" AND class_type = ").push_bind(class_type.clone());
        }
        if let Some(specialty) = &filter.specialty {
            query
                .push(" AND EXISTS (SELECT 1 FROM json_each(hospitals.specialties) WHERE lower(json_each.value) = lower(")
                .push_bind(specialty.clone())
                .push("))");
        }
        query.push(" ORDER BY id");

        let rows: Vec<HospitalRow> = query.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(HospitalRow::into_hospital).collect()
    }

    /// List doctors ordered by ID
    pub async fn list_doctors(&self, filter: &DoctorFilter) -> Result<Vec<Doctor>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("{DOCTOR_SELECT} WHERE 1 = 1"));
        if let Some(specialization) = &filter.specialization {
            query
                .push(" AND lower(specialization) = lower(")
                .push_bind(specialization.clone())
                .push(")");
        }
        if let Some(hospital_id) = &filter.hospital_id {
            query
                .push(" AND primary_hospital_id = ")
                .push_bind(hospital_id.clone());
        }
        query.push(" ORDER BY id");

        let rows: Vec<DoctorRow> = query.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(DoctorRow::into_doctor).collect())
    }

    /// List claims ordered by ID
    pub async fn list_claims(&self, filter: &ClaimFilter) -> Result<Vec<Claim>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("{CLAIM_SELECT} WHERE 1 = 1"));
        if let Some(status) = &filter.status {
            query
                .push(" AND upper(status) = upper(")
                .push_bind(status.clone())
                .push(")");
        }
        if let Some(hospital_id) = &filter.hospital_id {
            query.push(" AND hospital_id = ").push_bind(hospital_id.clone());
        }
        if let Some(doctor_id) = &filter.doctor_id {
            query.push(" AND doctor_id = ").push_bind(doctor_id.clone());
        }
        query.push(" ORDER BY id");

        let rows: Vec<ClaimRow> = query.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(ClaimRow::into_claim).collect()
    }

    /// List diagnoses ordered by code
    pub async fn list_diagnoses(&self) -> Result<Vec<Diagnosis>> {
        let rows: Vec<DiagnosisRow> =
            sqlx::query_as(&format!("{DIAGNOSIS_SELECT} ORDER BY code"))
                .fetch_all(&self.pool)
                .await?;

        let edges: Vec<(String, String)> = sqlx::query_as(
            "SELECT diagnosis_code, procedure_code FROM diagnosis_requirements ORDER BY diagnosis_code, procedure_code",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut required: HashMap<String, Vec<String>> = HashMap::new();
        for (diagnosis_code, procedure_code) in edges {
            required.entry(diagnosis_code).or_default().push(procedure_code);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let procedures = required.remove(&row.code).unwrap_or_default();
                row.into_diagnosis(procedures)
            })
            .collect())
    }

    /// List procedures ordered by code
    pub async fn list_procedures(&self) -> Result<Vec<Procedure>> {
        let rows: Vec<ProcedureRow> =
            sqlx::query_as(&format!("{PROCEDURE_SELECT} ORDER BY code"))
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(ProcedureRow::into_procedure).collect())
    }

    /// Count nodes and derived fields
    pub async fn counts(&self) -> Result<GraphCounts> {
        let row: CountsRow = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM hospitals) AS hospitals,
                (SELECT COUNT(*) FROM doctors) AS doctors,
                (SELECT COUNT(*) FROM diagnoses) AS diagnoses,
                (SELECT COUNT(*) FROM procedures) AS procedures,
                (SELECT COUNT(*) FROM claims) AS claims,
                (SELECT COUNT(*) FROM diagnoses WHERE market_avg_cost IS NOT NULL) AS benchmarked_diagnoses,
                (SELECT COUNT(*) FROM claims WHERE z_score IS NOT NULL) AS scored_claims
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(GraphCounts {
            hospitals: row.hospitals as u64,
            doctors: row.doctors as u64,
            diagnoses: row.diagnoses as u64,
            procedures: row.procedures as u64,
            claims: row.claims as u64,
            benchmarked_diagnoses: row.benchmarked_diagnoses as u64,
            scored_claims: row.scored_claims as u64,
        })
    }
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    fn claim_costs_by_diagnosis(&self) -> BoxStream<'_, Result<DiagnosisCost>> {
        sqlx::query_as::<_, CostRow>(
            r#"
            SELECT diagnosis_code, total_cost FROM claims
            WHERE diagnosis_code IS NOT NULL AND total_cost IS NOT NULL AND total_cost > 0
            ORDER BY diagnosis_code, id
            "#,
        )
        .fetch(&self.pool)
        .map_ok(CostRow::into_cost)
        .map_err(Error::from)
        .boxed()
    }

    async fn write_benchmarks(
        &self,
        run: &BenchmarkRun,
        benchmarks: &[DiagnosisBenchmark],
    ) -> Result<u64> {
        let computed_at = timestamp(run.computed_at);
        let mut tx = self.pool.begin().await?;
        let mut updated = 0u64;

        for benchmark in benchmarks {
            let result = sqlx::query(
                r#"
                UPDATE diagnoses
                SET market_avg_cost = ?, market_std_dev = ?, benchmarked_at = ?, updated_at = ?
                WHERE code = ?
                "#,
            )
            .bind(benchmark.market_avg_cost)
            .bind(benchmark.market_std_dev)
            .bind(&computed_at)
            .bind(&computed_at)
            .bind(&benchmark.diagnosis_code)
            .execute(&mut *tx)
            .await?;
            updated += result.rows_affected();
        }

        sqlx::query(
            r#"
            INSERT INTO benchmark_runs (id, computed_at, diagnoses_updated, claims_observed)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&run.id)
        .bind(&computed_at)
        .bind(updated as i64)
        .bind(run.claims_observed as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(run_id = %run.id, diagnoses_updated = updated, "Benchmarks written");
        Ok(updated)
    }

    async fn latest_benchmark_run(&self) -> Result<Option<BenchmarkRun>> {
        let row: Option<BenchmarkRunRow> = sqlx::query_as(
            r#"
            SELECT id, computed_at, diagnoses_updated, claims_observed FROM benchmark_runs
            ORDER BY computed_at DESC, rowid DESC LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(BenchmarkRunRow::into_run).transpose()
    }

    async fn persisted_benchmarks(&self) -> Result<Vec<DiagnosisBenchmark>> {
        let rows: Vec<BenchmarkRow> = sqlx::query_as(
            r#"
            SELECT code, market_avg_cost, market_std_dev FROM diagnoses
            WHERE market_avg_cost IS NOT NULL AND market_std_dev IS NOT NULL
            ORDER BY code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BenchmarkRow::into_benchmark).collect())
    }

    async fn scoring_candidates(&self) -> Result<Vec<ScoringCandidate>> {
        let rows: Vec<CandidateRow> = sqlx::query_as(
            r#"
            SELECT id, diagnosis_code, total_cost FROM claims
            WHERE diagnosis_code IS NOT NULL AND total_cost IS NOT NULL AND total_cost > 0
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CandidateRow::into_candidate).collect())
    }

    async fn write_scores(&self, scores: &[ClaimScore]) -> Result<u64> {
        let scored_at = timestamp(Utc::now());
        let mut tx = self.pool.begin().await?;

        let cleared = sqlx::query(
            r#"
            UPDATE claims SET z_score = NULL, outlier_status = NULL, scored_at = NULL
            WHERE z_score IS NOT NULL OR outlier_status IS NOT NULL
            "#,
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let mut written = 0u64;
        for score in scores {
            let result = sqlx::query(
                "UPDATE claims SET z_score = ?, outlier_status = ?, scored_at = ? WHERE id = ?",
            )
            .bind(score.z_score)
            .bind(score.outlier_status.as_str())
            .bind(&scored_at)
            .bind(&score.claim_id)
            .execute(&mut *tx)
            .await?;
            written += result.rows_affected();
        }

        tx.commit().await?;

        debug!(cleared, written, "Claim scores replaced");
        Ok(written)
    }

    async fn top_deviations(&self, limit: usize) -> Result<Vec<ScoredClaimSample>> {
        let rows: Vec<SampleRow> = sqlx::query_as(
            r#"
            SELECT
                c.id AS claim_id, c.total_cost, d.code AS diagnosis_code,
                d.name AS diagnosis_name, d.market_avg_cost, d.market_std_dev,
                c.z_score, c.outlier_status
            FROM claims c
            JOIN diagnoses d ON d.code = c.diagnosis_code
            WHERE c.z_score IS NOT NULL
              AND c.total_cost IS NOT NULL
              AND d.market_avg_cost IS NOT NULL
              AND d.market_std_dev IS NOT NULL
            ORDER BY ABS(c.z_score) DESC, c.id
            LIMIT ?
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SampleRow::into_sample).collect()
    }

    async fn hospital_claim_deviations(&self, hospital_id: &str) -> Result<Vec<ClaimDeviation>> {
        let rows: Vec<DeviationRow> = sqlx::query_as(
            r#"
            SELECT
                h.name AS hospital_name, d.code AS diagnosis_code,
                d.name AS diagnosis_name, c.z_score
            FROM claims c
            JOIN hospitals h ON h.id = c.hospital_id
            JOIN diagnoses d ON d.code = c.diagnosis_code
            WHERE h.id = ? AND d.market_avg_cost IS NOT NULL
            ORDER BY d.code, c.id
            "#,
        )
        .bind(hospital_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DeviationRow::into_deviation).collect())
    }
}

// ========== Helpers ==========

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_json(values: &[String]) -> Result<String> {
    serde_json::to_string(values).map_err(|e| Error::Other(format!("Failed to serialize list: {}", e)))
}

fn from_json(column: &str, value: &str) -> Result<Vec<String>> {
    serde_json::from_str(value)
        .map_err(|e| Error::Parse(format!("Invalid {} list: {}", column, e)))
}

fn parse_outlier_status(value: Option<String>) -> Result<Option<OutlierStatus>> {
    value
        .map(|s| {
            OutlierStatus::parse(&s)
                .ok_or_else(|| Error::Parse(format!("Invalid outlier status: {}", s)))
        })
        .transpose()
}

const HOSPITAL_SELECT: &str =
    "SELECT id, name, class_type, latitude, longitude, specialties, facilities FROM hospitals";
const DOCTOR_SELECT: &str =
    "SELECT id, name, specialization, primary_hospital_id FROM doctors";
const DIAGNOSIS_SELECT: &str =
    "SELECT code, name, reference_cost, severity, market_avg_cost, market_std_dev FROM diagnoses";
const PROCEDURE_SELECT: &str = "SELECT code, name, avg_cost FROM procedures";
const CLAIM_SELECT: &str = "SELECT id, hospital_id, doctor_id, diagnosis_code, total_cost, status, z_score, outlier_status FROM claims";

// ========== Row Types ==========

#[derive(FromRow)]
struct HospitalRow {
    id: String,
    name: String,
    class_type: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    specialties: String,
    facilities: String,
}

impl HospitalRow {
    fn into_hospital(self) -> Result<Hospital> {
        Ok(Hospital {
            specialties: from_json("specialties", &self.specialties)?,
            facilities: from_json("facilities", &self.facilities)?,
            id: self.id,
            name: self.name,
            class_type: self.class_type,
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }
}

#[derive(FromRow)]
struct DoctorRow {
    id: String,
    name: String,
    specialization: String,
    primary_hospital_id: Option<String>,
}

impl DoctorRow {
    fn into_doctor(self) -> Doctor {
        Doctor {
            id: self.id,
            name: self.name,
            specialization: self.specialization,
            primary_hospital_id: self.primary_hospital_id,
        }
    }
}

#[derive(FromRow)]
struct DiagnosisRow {
    code: String,
    name: String,
    reference_cost: Option<f64>,
    severity: Option<String>,
    market_avg_cost: Option<f64>,
    market_std_dev: Option<f64>,
}

impl DiagnosisRow {
    fn into_diagnosis(self, required_procedures: Vec<String>) -> Diagnosis {
        Diagnosis {
            code: self.code,
            name: self.name,
            reference_cost: self.reference_cost,
            severity: self.severity,
            market_avg_cost: self.market_avg_cost,
            market_std_dev: self.market_std_dev,
            required_procedures,
        }
    }
}

#[derive(FromRow)]
struct ProcedureRow {
    code: String,
    name: String,
    avg_cost: Option<f64>,
}

impl ProcedureRow {
    fn into_procedure(self) -> Procedure {
        Procedure {
            code: self.code,
            name: self.name,
            avg_cost: self.avg_cost,
        }
    }
}

#[derive(FromRow)]
struct ClaimRow {
    id: String,
    hospital_id: Option<String>,
    doctor_id: Option<String>,
    diagnosis_code: Option<String>,
    total_cost: Option<f64>,
    status: Option<String>,
    z_score: Option<f64>,
    outlier_status: Option<String>,
}

impl ClaimRow {
    fn into_claim(self) -> Result<Claim> {
        Ok(Claim {
            id: self.id,
            hospital_id: self.hospital_id,
            doctor_id: self.doctor_id,
            diagnosis_code: self.diagnosis_code,
            total_cost: self.total_cost,
            status: self.status,
            z_score: self.z_score,
            outlier_status: parse_outlier_status(self.outlier_status)?,
        })
    }
}

#[derive(FromRow)]
struct CountsRow {
    hospitals: i64,
    doctors: i64,
    diagnoses: i64,
    procedures: i64,
    claims: i64,
    benchmarked_diagnoses: i64,
    scored_claims: i64,
}

#[derive(FromRow)]
struct CostRow {
    diagnosis_code: String,
    total_cost: f64,
}

impl CostRow {
    fn into_cost(self) -> DiagnosisCost {
        DiagnosisCost {
            diagnosis_code: self.diagnosis_code,
            total_cost: self.total_cost,
        }
    }
}

#[derive(FromRow)]
struct BenchmarkRunRow {
    id: String,
    computed_at: String,
    diagnoses_updated: i64,
    claims_observed: i64,
}

impl BenchmarkRunRow {
    fn into_run(self) -> Result<BenchmarkRun> {
        let computed_at = DateTime::parse_from_rfc3339(&self.computed_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Error::Parse(format!("Invalid benchmark run timestamp: {}", e)))?;

        Ok(BenchmarkRun {
            id: self.id,
            computed_at,
            diagnoses_updated: self.diagnoses_updated as u64,
            claims_observed: self.claims_observed as u64,
        })
    }
}

#[derive(FromRow)]
struct BenchmarkRow {
    code: String,
    market_avg_cost: f64,
    market_std_dev: f64,
}

impl BenchmarkRow {
    fn into_benchmark(self) -> DiagnosisBenchmark {
        DiagnosisBenchmark {
            diagnosis_code: self.code,
            market_avg_cost: self.market_avg_cost,
            market_std_dev: self.market_std_dev,
        }
    }
}

#[derive(FromRow)]
struct CandidateRow {
    id: String,
    diagnosis_code: String,
    total_cost: f64,
}

impl CandidateRow {
    fn into_candidate(self) -> ScoringCandidate {
        ScoringCandidate {
            claim_id: self.id,
            diagnosis_code: self.diagnosis_code,
            total_cost: self.total_cost,
        }
    }
}

#[derive(FromRow)]
struct SampleRow {
    claim_id: String,
    total_cost: f64,
    diagnosis_code: String,
    diagnosis_name: String,
    market_avg_cost: f64,
    market_std_dev: f64,
    z_score: f64,
    outlier_status: Option<String>,
}

impl SampleRow {
    fn into_sample(self) -> Result<ScoredClaimSample> {
        Ok(ScoredClaimSample {
            claim_id: self.claim_id,
            total_cost: self.total_cost,
            diagnosis_code: self.diagnosis_code,
            diagnosis_name: self.diagnosis_name,
            market_avg_cost: self.market_avg_cost,
            market_std_dev: self.market_std_dev,
            z_score: self.z_score,
            outlier_status: parse_outlier_status(self.outlier_status)?,
        })
    }
}

#[derive(FromRow)]
struct DeviationRow {
    hospital_name: String,
    diagnosis_code: String,
    diagnosis_name: String,
    z_score: Option<f64>,
}

impl DeviationRow {
    fn into_deviation(self) -> ClaimDeviation {
        ClaimDeviation {
            hospital_name: self.hospital_name,
            diagnosis_code: self.diagnosis_code,
            diagnosis_name: self.diagnosis_name,
            z_score: self.z_score,
        }
    }
}
