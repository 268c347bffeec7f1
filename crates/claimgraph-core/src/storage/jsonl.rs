//! JSONL import/export of the claims graph
//!
//! One file per node type, one record per line, sorted by key:
//!
//! ```text
//! <dir>/
//! ├── hospitals.jsonl
//! ├── doctors.jsonl
//! ├── procedures.jsonl
//! ├── diagnoses.jsonl
//! ├── claims.jsonl
//! └── _metadata.json
//! ```
//!
//! Exports include the derived benchmark and score fields so they can be
//! inspected, but imports ignore them: they are recomputed by the benchmark
//! pass.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::Result;
use crate::domain::graph::{Claim, Diagnosis, Doctor, Hospital, Procedure};
use crate::error::Error;
use crate::infrastructure::graph::{
    ClaimFilter, DoctorFilter, HospitalFilter, SqliteGraphStore,
};

/// Node files in dependency order (referenced nodes first)
pub const GRAPH_FILES: &[&str] = &["hospitals", "doctors", "procedures", "diagnoses", "claims"];

const METADATA_FILE: &str = "_metadata.json";

/// Summary written next to an export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub exported_at: DateTime<Utc>,
    pub schema_version: i32,
    pub record_counts: HashMap<String, usize>,
    pub total_records: usize,
}

/// Result of an export operation
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub dir: PathBuf,
    pub metadata: ExportMetadata,
    pub files_written: Vec<PathBuf>,
}

/// Result of an import operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportResult {
    /// Records imported per file
    pub record_counts: HashMap<String, usize>,
    pub total_records: usize,
    /// Missing files, unreadable files and rejected records
    pub warnings: Vec<String>,
}

// =============================================================================
// Export
// =============================================================================

/// Export every node to JSONL files in `dir`
pub async fn export_to_jsonl(store: &SqliteGraphStore, dir: &Path) -> Result<ExportResult> {
    fs::create_dir_all(dir).map_err(Error::Io)?;

    let mut record_counts = HashMap::new();
    let mut files_written = Vec::new();

    for name in GRAPH_FILES {
        let path = dir.join(format!("{}.jsonl", name));
        let count = match *name {
            "hospitals" => {
                let rows = store.list_hospitals(&HospitalFilter::default()).await?;
                write_records(&path, &rows)?
            }
            "doctors" => {
                let rows = store.list_doctors(&DoctorFilter::default()).await?;
                write_records(&path, &rows)?
            }
            "procedures" => {
                let rows = store.list_procedures().await?;
                write_records(&path, &rows)?
            }
            "diagnoses" => {
                let rows = store.list_diagnoses().await?;
                write_records(&path, &rows)?
            }
            "claims" => {
                let rows = store.list_claims(&ClaimFilter::default()).await?;
                write_records(&path, &rows)?
            }
            _ => return Err(Error::Other(format!("Unknown graph file: {}", name))),
        };
        record_counts.insert(name.to_string(), count);
        files_written.push(path);
    }

    let metadata = ExportMetadata {
        exported_at: Utc::now(),
        schema_version: crate::storage::CURRENT_VERSION,
        total_records: record_counts.values().sum(),
        record_counts,
    };

    let metadata_path = dir.join(METADATA_FILE);
    let metadata_file = File::create(&metadata_path).map_err(Error::Io)?;
    serde_json::to_writer_pretty(metadata_file, &metadata)
        .map_err(|e| Error::Other(format!("Failed to write metadata: {}", e)))?;
    files_written.push(metadata_path);

    info!(dir = %dir.display(), records = metadata.total_records, "Graph exported");

    Ok(ExportResult {
        dir: dir.to_path_buf(),
        metadata,
        files_written,
    })
}

fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<usize> {
    let file = File::create(path).map_err(Error::Io)?;
    let mut writer = BufWriter::new(file);

    for record in records {
        let line = serde_json::to_string(record)
            .map_err(|e| Error::Other(format!("Failed to serialize record: {}", e)))?;
        writeln!(writer, "{}", line).map_err(Error::Io)?;
    }

    writer.flush().map_err(Error::Io)?;
    Ok(records.len())
}

// =============================================================================
// Import
// =============================================================================

/// Import JSONL node files from `dir`, upserting by key
///
/// A missing or malformed file is reported as a warning and the remaining
/// files are still imported. Records the store rejects for a dangling
/// reference (for example a claim naming an unknown hospital) are skipped
/// with a warning. Any other store failure aborts the import.
pub async fn import_from_jsonl(store: &SqliteGraphStore, dir: &Path) -> Result<ImportResult> {
    if !dir.is_dir() {
        return Err(Error::NotFound(format!(
            "Import directory not found: {}",
            dir.display()
        )));
    }

    let mut result = ImportResult::default();

    for name in GRAPH_FILES {
        let path = dir.join(format!("{}.jsonl", name));
        if !path.exists() {
            result
                .warnings
                .push(format!("File not found: {}", path.display()));
            continue;
        }

        let imported = match *name {
            "hospitals" => import_file::<Hospital>(store, &path, &mut result.warnings).await?,
            "doctors" => import_file::<Doctor>(store, &path, &mut result.warnings).await?,
            "procedures" => import_file::<Procedure>(store, &path, &mut result.warnings).await?,
            "diagnoses" => import_file::<Diagnosis>(store, &path, &mut result.warnings).await?,
            "claims" => import_file::<Claim>(store, &path, &mut result.warnings).await?,
            _ => return Err(Error::Other(format!("Unknown graph file: {}", name))),
        };

        if let Some(count) = imported {
            result.record_counts.insert(name.to_string(), count);
            result.total_records += count;
        }
    }

    for warning in &result.warnings {
        warn!("{}", warning);
    }
    info!(records = result.total_records, warnings = result.warnings.len(), "Graph imported");

    Ok(result)
}

/// A node type that can be loaded from its JSONL file
#[async_trait]
trait GraphRecord: DeserializeOwned + Send + Sync {
    const KIND: &'static str;

    fn key(&self) -> &str;

    async fn save(&self, store: &SqliteGraphStore) -> Result<()>;
}

#[async_trait]
impl GraphRecord for Hospital {
    const KIND: &'static str = "hospital";

    fn key(&self) -> &str {
        &self.id
    }

    async fn save(&self, store: &SqliteGraphStore) -> Result<()> {
        store.save_hospital(self).await
    }
}

#[async_trait]
impl GraphRecord for Doctor {
    const KIND: &'static str = "doctor";

    fn key(&self) -> &str {
        &self.id
    }

    async fn save(&self, store: &SqliteGraphStore) -> Result<()> {
        store.save_doctor(self).await
    }
}

#[async_trait]
impl GraphRecord for Procedure {
    const KIND: &'static str = "procedure";

    fn key(&self) -> &str {
        &self.code
    }

    async fn save(&self, store: &SqliteGraphStore) -> Result<()> {
        store.save_procedure(self).await
    }
}

#[async_trait]
impl GraphRecord for Diagnosis {
    const KIND: &'static str = "diagnosis";

    fn key(&self) -> &str {
        &self.code
    }

    async fn save(&self, store: &SqliteGraphStore) -> Result<()> {
        store.save_diagnosis(self).await
    }
}

#[async_trait]
impl GraphRecord for Claim {
    const KIND: &'static str = "claim";

    fn key(&self) -> &str {
        &self.id
    }

    async fn save(&self, store: &SqliteGraphStore) -> Result<()> {
        store.save_claim(self).await
    }
}

/// Load one node file, returning `None` when the file itself is unusable
async fn import_file<T: GraphRecord>(
    store: &SqliteGraphStore,
    path: &Path,
    warnings: &mut Vec<String>,
) -> Result<Option<usize>> {
    let records = match read_records::<T>(path) {
        Ok(records) => records,
        Err(e) => {
            warnings.push(format!("Failed to import {}: {}", path.display(), e));
            return Ok(None);
        }
    };

    let mut count = 0;
    for record in &records {
        match record.save(store).await {
            Ok(()) => count += 1,
            Err(e) if is_dangling_reference(&e) => {
                warnings.push(format!("Skipped {} {}: {}", T::KIND, record.key(), e))
            }
            Err(e) => return Err(e),
        }
    }
    Ok(Some(count))
}

fn is_dangling_reference(error: &Error) -> bool {
    matches!(
        error,
        Error::DatabaseError(sqlx::Error::Database(db)) if db.is_foreign_key_violation()
    )
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(Error::Io)?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(Error::Io)?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .map_err(|e| Error::Parse(format!("line {}: {}", index + 1, e)))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use tempfile::TempDir;

    async fn setup_test_db() -> (SqliteGraphStore, TempDir) {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        (SqliteGraphStore::new(db.pool().clone()), temp_dir)
    }

    fn write_file(dir: &Path, name: &str, lines: &[&str]) {
        fs::write(dir.join(name), lines.join("\n")).unwrap();
    }

    #[tokio::test]
    async fn test_export_empty_database() {
        let (store, temp_dir) = setup_test_db().await;

        let result = export_to_jsonl(&store, temp_dir.path()).await.unwrap();

        assert_eq!(result.metadata.total_records, 0);
        for name in GRAPH_FILES {
            let path = temp_dir.path().join(format!("{}.jsonl", name));
            assert!(path.exists(), "Expected {} to exist", path.display());
        }
        assert!(temp_dir.path().join(METADATA_FILE).exists());
    }

    #[tokio::test]
    async fn test_import_then_export() {
        let (store, temp_dir) = setup_test_db().await;
        let dir = temp_dir.path();

        write_file(
            dir,
            "hospitals.jsonl",
            &[r#"{"id":"H1","name":"RS Harapan","specialties":["Cardiology"]}"#],
        );
        write_file(
            dir,
            "doctors.jsonl",
            &[r#"{"id":"DR1","name":"Dr. Budi","specialization":"GP","primary_hospital_id":"H1"}"#],
        );
        write_file(
            dir,
            "procedures.jsonl",
            &[r#"{"code":"P1","name":"Rapid flu test","avg_cost":40.0}"#],
        );
        write_file(
            dir,
            "diagnoses.jsonl",
            &[r#"{"code":"D1","name":"Flu","reference_cost":100.0,"required_procedures":["P1"]}"#],
        );
        write_file(
            dir,
            "claims.jsonl",
            &[
                r#"{"id":"C1","hospital_id":"H1","doctor_id":"DR1","diagnosis_code":"D1","total_cost":120.0}"#,
                "",
                r#"{"id":"C2","hospital_id":"H1","diagnosis_code":"D1","total_cost":80.0,"status":"NORMAL"}"#,
            ],
        );

        let result = import_from_jsonl(&store, dir).await.unwrap();
        assert_eq!(result.total_records, 6);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);

        let out = TempDir::new().unwrap();
        let export = export_to_jsonl(&store, out.path()).await.unwrap();
        assert_eq!(export.metadata.record_counts.get("claims"), Some(&2));
        assert_eq!(export.metadata.record_counts.get("procedures"), Some(&1));

        let claims: Vec<Claim> = read_records(&out.path().join("claims.jsonl")).unwrap();
        assert_eq!(claims[1].status.as_deref(), Some("NORMAL"));
        let diagnoses: Vec<Diagnosis> = read_records(&out.path().join("diagnoses.jsonl")).unwrap();
        assert_eq!(diagnoses[0].required_procedures, vec!["P1"]);
    }

    #[tokio::test]
    async fn test_unknown_required_procedure_is_a_warning() {
        let (store, temp_dir) = setup_test_db().await;
        let dir = temp_dir.path();

        write_file(
            dir,
            "diagnoses.jsonl",
            &[
                r#"{"code":"D1","name":"Flu"}"#,
                r#"{"code":"D2","name":"Appendicitis","required_procedures":["P404"]}"#,
            ],
        );

        let result = import_from_jsonl(&store, dir).await.unwrap();
        assert_eq!(result.record_counts.get("diagnoses"), Some(&1));
        assert!(result.warnings.iter().any(|w| w.contains("Skipped diagnosis D2")));
    }

    #[tokio::test]
    async fn test_store_failure_aborts_import() {
        let (store, temp_dir) = setup_test_db().await;
        let dir = temp_dir.path();

        write_file(dir, "hospitals.jsonl", &[r#"{"id":"H1","name":"RS Harapan"}"#]);
        store.pool().close().await;

        let err = import_from_jsonl(&store, dir).await.unwrap_err();
        assert!(matches!(err, Error::DatabaseError(_)));
    }

    #[tokio::test]
    async fn test_dangling_reference_is_a_warning() {
        let (store, temp_dir) = setup_test_db().await;
        let dir = temp_dir.path();

        write_file(dir, "hospitals.jsonl", &[r#"{"id":"H1","name":"RS Harapan"}"#]);
        write_file(
            dir,
            "claims.jsonl",
            &[
                r#"{"id":"C1","hospital_id":"H1","total_cost":10.0}"#,
                r#"{"id":"C2","hospital_id":"H404","total_cost":10.0}"#,
            ],
        );

        let result = import_from_jsonl(&store, dir).await.unwrap();
        assert_eq!(result.record_counts.get("claims"), Some(&1));
        assert!(result.warnings.iter().any(|w| w.contains("C2")));
        assert!(result.warnings.iter().any(|w| w.contains("doctors.jsonl")));
    }

    #[tokio::test]
    async fn test_malformed_file_does_not_abort_import() {
        let (store, temp_dir) = setup_test_db().await;
        let dir = temp_dir.path();

        write_file(dir, "hospitals.jsonl", &["{not json"]);
        write_file(dir, "diagnoses.jsonl", &[r#"{"code":"D1","name":"Flu"}"#]);

        let result = import_from_jsonl(&store, dir).await.unwrap();
        assert_eq!(result.record_counts.get("diagnoses"), Some(&1));
        assert!(result.warnings.iter().any(|w| w.contains("Failed to import") && w.contains("hospitals.jsonl")));
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let (store, temp_dir) = setup_test_db().await;
        let missing = temp_dir.path().join("nope");

        let err = import_from_jsonl(&store, &missing).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
