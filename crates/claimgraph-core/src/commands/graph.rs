//! Claims graph query commands
//!
//! Filtered reads over hospitals, doctors, claims and diagnoses.

use sqlx::SqlitePool;

use crate::domain::graph::{Claim, Diagnosis, Doctor, Hospital, Procedure};
use crate::error::{Error, Result};
use crate::infrastructure::graph::{
    ClaimFilter, DoctorFilter, GraphCounts, HospitalFilter, SqliteGraphStore,
};

/// List hospitals, optionally by class type and specialty
pub async fn list_hospitals(pool: &SqlitePool, filter: &HospitalFilter) -> Result<Vec<Hospital>> {
    SqliteGraphStore::new(pool.clone()).list_hospitals(filter).await
}

/// List doctors, optionally by specialization and primary hospital
pub async fn list_doctors(pool: &SqlitePool, filter: &DoctorFilter) -> Result<Vec<Doctor>> {
    SqliteGraphStore::new(pool.clone()).list_doctors(filter).await
}

/// List claims, optionally by status, hospital and doctor
pub async fn list_claims(pool: &SqlitePool, filter: &ClaimFilter) -> Result<Vec<Claim>> {
    SqliteGraphStore::new(pool.clone()).list_claims(filter).await
}

/// List diagnoses with their market benchmarks
pub async fn list_diagnoses(pool: &SqlitePool) -> Result<Vec<Diagnosis>> {
    SqliteGraphStore::new(pool.clone()).list_diagnoses().await
}

/// List procedures ordered by code
pub async fn list_procedures(pool: &SqlitePool) -> Result<Vec<Procedure>> {
    SqliteGraphStore::new(pool.clone()).list_procedures().await
}

/// Get one claim or fail with `ClaimNotFound`
pub async fn get_claim(pool: &SqlitePool, id: &str) -> Result<Claim> {
    SqliteGraphStore::new(pool.clone())
        .get_claim(id)
        .await?
        .ok_or_else(|| Error::ClaimNotFound(id.to_string()))
}

/// Row counts across the graph
pub async fn graph_counts(pool: &SqlitePool) -> Result<GraphCounts> {
    SqliteGraphStore::new(pool.clone()).counts().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    #[tokio::test]
    async fn test_get_claim_not_found() {
        let db = Database::in_memory().await.unwrap();
        let err = get_claim(db.pool(), "C404").await.unwrap_err();
        assert!(matches!(err, Error::ClaimNotFound(id) if id == "C404"));
    }

    #[tokio::test]
    async fn test_list_claims_by_status_ignores_case() {
        let db = Database::in_memory().await.unwrap();
        let store = SqliteGraphStore::new(db.pool().clone());

        let mut fraud = Claim::new("C1").with_cost(10.0);
        fraud.status = Some("FRAUD".into());
        store.save_claim(&fraud).await.unwrap();
        store.save_claim(&Claim::new("C2").with_cost(20.0)).await.unwrap();

        let claims = list_claims(
            db.pool(),
            &ClaimFilter {
                status: Some("fraud".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].id, "C1");

        let counts = graph_counts(db.pool()).await.unwrap();
        assert_eq!(counts.claims, 2);
    }
}
