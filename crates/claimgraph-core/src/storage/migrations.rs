//! Database migrations
//!
//! This module manages SQLite schema migrations for claimgraph.
//! Migrations are versioned and applied automatically on database connection.

use sqlx::SqlitePool;

/// Current schema version
pub const CURRENT_VERSION: i32 = 3;

/// SQL for creating the migrations tracking table
const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Migration 1: Claims graph
///
/// Nodes are tables keyed the way the graph keys them (hospital id, doctor id,
/// diagnosis code, claim id). Edges are foreign-key columns:
/// `SUBMITTED_AT` = claims.hospital_id, `SUBMITTED_BY` = claims.doctor_id,
/// `CODED_AS` = claims.diagnosis_code, `WORKS_AT` = doctors.primary_hospital_id.
const MIGRATION_V1: &str = r#"
    CREATE TABLE IF NOT EXISTS hospitals (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        class_type TEXT,
        latitude REAL,
        longitude REAL,
        specialties TEXT NOT NULL DEFAULT '[]',
        facilities TEXT NOT NULL DEFAULT '[]',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_hospitals_name ON hospitals(name);
    CREATE INDEX IF NOT EXISTS idx_hospitals_class_type ON hospitals(class_type);

    CREATE TABLE IF NOT EXISTS doctors (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        specialization TEXT NOT NULL DEFAULT '',
        primary_hospital_id TEXT REFERENCES hospitals(id) ON DELETE SET NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_doctors_name ON doctors(name);
    CREATE INDEX IF NOT EXISTS idx_doctors_primary_hospital_id ON doctors(primary_hospital_id);

    -- market_avg_cost / market_std_dev are a derived cache owned by the benchmark pass
    CREATE TABLE IF NOT EXISTS diagnoses (
        code TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        reference_cost REAL,
        severity TEXT,
        market_avg_cost REAL,
        market_std_dev REAL CHECK (market_std_dev IS NULL OR market_std_dev > 0),
        benchmarked_at TIMESTAMP,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS claims (
        id TEXT PRIMARY KEY NOT NULL,
        hospital_id TEXT REFERENCES hospitals(id) ON DELETE SET NULL,
        doctor_id TEXT REFERENCES doctors(id) ON DELETE SET NULL,
        diagnosis_code TEXT REFERENCES diagnoses(code) ON DELETE SET NULL,
        total_cost REAL,
        status TEXT,
        z_score REAL,
        outlier_status TEXT CHECK (outlier_status IS NULL OR outlier_status IN ('HIGH_OUTLIER', 'LOW_OUTLIER', 'NORMAL_VARIANCE')),
        scored_at TIMESTAMP,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_claims_hospital_id ON claims(hospital_id);
    CREATE INDEX IF NOT EXISTS idx_claims_doctor_id ON claims(doctor_id);
    CREATE INDEX IF NOT EXISTS idx_claims_diagnosis_code ON claims(diagnosis_code);
    CREATE INDEX IF NOT EXISTS idx_claims_status ON claims(status);
    CREATE INDEX IF NOT EXISTS idx_claims_outlier_status ON claims(outlier_status);
"#;

/// Migration 2: Benchmark run markers
const MIGRATION_V2: &str = r#"
    CREATE TABLE IF NOT EXISTS benchmark_runs (
        id TEXT PRIMARY KEY NOT NULL,
        computed_at TIMESTAMP NOT NULL,
        diagnoses_updated INTEGER NOT NULL DEFAULT 0,
        claims_observed INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_benchmark_runs_computed_at ON benchmark_runs(computed_at);
"#;

/// Migration 3: Procedures and `REQUIRES` edges
const MIGRATION_V3: &str = r#"
    CREATE TABLE IF NOT EXISTS procedures (
        code TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        avg_cost REAL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS diagnosis_requirements (
        diagnosis_code TEXT NOT NULL REFERENCES diagnoses(code) ON DELETE CASCADE,
        procedure_code TEXT NOT NULL REFERENCES procedures(code) ON DELETE CASCADE,
        PRIMARY KEY (diagnosis_code, procedure_code)
    );

    CREATE INDEX IF NOT EXISTS idx_diagnosis_requirements_procedure ON diagnosis_requirements(procedure_code);
"#;

/// Get the current schema version from the database
async fn get_current_version(pool: &SqlitePool) -> anyhow::Result<i32> {
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(pool).await?;

    // MAX() over an empty table yields a single NULL row
    let row: Option<(Option<i32>,)> = sqlx::query_as("SELECT MAX(version) FROM _migrations")
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(|(v,)| v).unwrap_or(0))
}

/// Record that a migration was applied
async fn record_migration(pool: &SqlitePool, version: i32) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    let current_version = get_current_version(pool).await?;

    tracing::info!(
        current_version = current_version,
        target_version = CURRENT_VERSION,
        "Checking database migrations"
    );

    if current_version >= CURRENT_VERSION {
        tracing::debug!("Database is up to date");
        return Ok(());
    }

    if current_version < 1 {
        tracing::info!("Applying migration v1: Claims graph");
        sqlx::raw_sql(MIGRATION_V1).execute(pool).await?;
        record_migration(pool, 1).await?;
    }

    if current_version < 2 {
        tracing::info!("Applying migration v2: Benchmark run markers");
        sqlx::raw_sql(MIGRATION_V2).execute(pool).await?;
        record_migration(pool, 2).await?;
    }

    if current_version < 3 {
        tracing::info!("Applying migration v3: Procedures");
        sqlx::raw_sql(MIGRATION_V3).execute(pool).await?;
        record_migration(pool, 3).await?;
    }

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Check if the database needs migrations
pub async fn needs_migration(pool: &SqlitePool) -> anyhow::Result<bool> {
    let current_version = get_current_version(pool).await?;
    Ok(current_version < CURRENT_VERSION)
}

/// Get migration status information
pub async fn migration_status(pool: &SqlitePool) -> anyhow::Result<MigrationStatus> {
    let current_version = get_current_version(pool).await?;
    Ok(MigrationStatus {
        current_version,
        target_version: CURRENT_VERSION,
        needs_migration: current_version < CURRENT_VERSION,
    })
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Current schema version in the database
    pub current_version: i32,
    /// Target schema version (latest)
    pub target_version: i32,
    /// Whether migrations need to be run
    pub needs_migration: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test pool")
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await;

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, 0);
        assert!(status.needs_migration);

        run_migrations(&pool).await.unwrap();

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, CURRENT_VERSION);
        assert!(!status.needs_migration);
        assert!(!needs_migration(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let pool = create_test_pool().await;

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_tables_created() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.unwrap();

        for table in [
            "hospitals",
            "doctors",
            "diagnoses",
            "claims",
            "benchmark_runs",
            "procedures",
            "diagnosis_requirements",
        ] {
            let result: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&pool)
                .await
                .unwrap_or_else(|_| panic!("Table {} should exist", table));
            assert_eq!(result.0, 0, "Table {} should be empty", table);
        }
    }

    #[tokio::test]
    async fn test_zero_std_dev_rejected() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.unwrap();

        let result = sqlx::query(
            "INSERT INTO diagnoses (code, name, market_avg_cost, market_std_dev) VALUES ('D1', 'Flu', 100.0, 0.0)",
        )
        .execute(&pool)
        .await;

        assert!(result.is_err(), "A zero market_std_dev must never be stored");
    }

    #[tokio::test]
    async fn test_unknown_outlier_status_rejected() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.unwrap();

        let result = sqlx::query("INSERT INTO claims (id, outlier_status) VALUES ('C1', 'WEIRD')")
            .execute(&pool)
            .await;

        assert!(result.is_err());
    }
}
