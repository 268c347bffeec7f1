//! Error types for claimgraph

use thiserror::Error;

/// Result type alias using claimgraph's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Claimgraph error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Entity errors (E001-E099)
    #[error("Hospital '{0}' not found. Run `claimgraph hospitals list` to see all hospitals.")]
    HospitalNotFound(String),

    #[error("Doctor '{0}' not found. Run `claimgraph doctors list` to see all doctors.")]
    DoctorNotFound(String),

    #[error("Claim '{0}' not found. Run `claimgraph claims list` to see all claims.")]
    ClaimNotFound(String),

    // Analysis errors (E100-E199)
    #[error("No scored claims found for hospital '{0}'. Run `claimgraph benchmark run` first.")]
    NoAnalysisData(String),

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::HospitalNotFound(_) => "E001",
            Self::DoctorNotFound(_) => "E002",
            Self::ClaimNotFound(_) => "E003",
            Self::NoAnalysisData(_) => "E100",
            Self::DatabaseError(_) => "E400",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Parse(_) => "E801",
            Self::NotFound(_) => "E802",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::HospitalNotFound(_) => Some("claimgraph hospitals list".to_string()),
            Self::DoctorNotFound(_) => Some("claimgraph doctors list".to_string()),
            Self::ClaimNotFound(_) => Some("claimgraph claims list".to_string()),
            Self::NoAnalysisData(_) => Some("claimgraph benchmark run".to_string()),
            Self::DatabaseError(_) => Some("claimgraph doctor".to_string()),
            Self::ConfigError(_) => Some("claimgraph config list".to_string()),
            _ => None,
        }
    }
}
