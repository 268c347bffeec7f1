//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Claimgraph configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub report: ReportConfig,
    pub risk: RiskConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Explicit database path; `None` means the platform default
    pub path: Option<PathBuf>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Rows shown by `benchmark verify`
    pub sample_size: usize,
}

/// Thresholds for entity risk profiles.
///
/// These only drive the doctor/hospital report flags. Claim outlier
/// classification uses fixed ±2.0 bounds and is not configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub doctor_extreme_z: f64,
    pub doctor_high_z: f64,
    pub hospital_anomaly_z: f64,
    /// Share (percent) of a doctor's volume in one diagnosis before it is flagged
    pub concentration_pct: f64,
    /// Share (percent) of a hospital's volume in one diagnosis before it is flagged
    pub dominance_pct: f64,
    /// Cost above the diagnosis reference (percent) flagged as likely upcoding
    pub upcoding_high_pct: f64,
    /// Cost above the diagnosis reference (percent) flagged as moderate risk
    pub upcoding_moderate_pct: f64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: 5,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { sample_size: 5 }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            doctor_extreme_z: 3.0,
            doctor_high_z: 1.5,
            hospital_anomaly_z: 2.5,
            concentration_pct: 60.0,
            dominance_pct: 50.0,
            upcoding_high_pct: 50.0,
            upcoding_moderate_pct: 20.0,
        }
    }
}

const KEYS: &[&str] = &[
    "database.path",
    "database.max_connections",
    "report.sample_size",
    "risk.doctor_extreme_z",
    "risk.doctor_high_z",
    "risk.hospital_anomaly_z",
    "risk.concentration_pct",
    "risk.dominance_pct",
    "risk.upcoding_high_pct",
    "risk.upcoding_moderate_pct",
];

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("CLAIMGRAPH_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("claimgraph")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or fall back to defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config = Self::from_toml(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.max_connections == 0 {
            return Err(anyhow!("database.max_connections must be at least 1"));
        }
        if !(1..=100).contains(&self.report.sample_size) {
            return Err(anyhow!("report.sample_size must be between 1 and 100"));
        }
        if self.risk.doctor_high_z > self.risk.doctor_extreme_z {
            return Err(anyhow!(
                "risk.doctor_high_z ({}) must not exceed risk.doctor_extreme_z ({})",
                self.risk.doctor_high_z,
                self.risk.doctor_extreme_z
            ));
        }
        for (key, pct) in [
            ("risk.concentration_pct", self.risk.concentration_pct),
            ("risk.dominance_pct", self.risk.dominance_pct),
        ] {
            if !(0.0..=100.0).contains(&pct) {
                return Err(anyhow!("{} must be between 0 and 100", key));
            }
        }
        if self.risk.upcoding_moderate_pct < 0.0 {
            return Err(anyhow!("risk.upcoding_moderate_pct must not be negative"));
        }
        if self.risk.upcoding_moderate_pct > self.risk.upcoding_high_pct {
            return Err(anyhow!(
                "risk.upcoding_moderate_pct ({}) must not exceed risk.upcoding_high_pct ({})",
                self.risk.upcoding_moderate_pct,
                self.risk.upcoding_high_pct
            ));
        }
        Ok(())
    }

    /// Resolve the database path: env, then explicit setting, then platform default
    pub fn database_path(&self) -> PathBuf {
        if let Ok(path) = env::var("CLAIMGRAPH_DATABASE") {
            return PathBuf::from(path);
        }
        self.database
            .path
            .clone()
            .unwrap_or_else(crate::storage::database::default_database_path)
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "database.path" => Ok(self.database_path().display().to_string()),
            "database.max_connections" => Ok(self.database.max_connections.to_string()),
            "report.sample_size" => Ok(self.report.sample_size.to_string()),
            "risk.doctor_extreme_z" => Ok(self.risk.doctor_extreme_z.to_string()),
            "risk.doctor_high_z" => Ok(self.risk.doctor_high_z.to_string()),
            "risk.hospital_anomaly_z" => Ok(self.risk.hospital_anomaly_z.to_string()),
            "risk.concentration_pct" => Ok(self.risk.concentration_pct.to_string()),
            "risk.dominance_pct" => Ok(self.risk.dominance_pct.to_string()),
            "risk.upcoding_high_pct" => Ok(self.risk.upcoding_high_pct.to_string()),
            "risk.upcoding_moderate_pct" => Ok(self.risk.upcoding_moderate_pct.to_string()),
            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `claimgraph config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut updated = self.clone();
        match key {
            "database.path" => {
                updated.database.path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "database.max_connections" => {
                updated.database.max_connections = value
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
            }
            "report.sample_size" => {
                updated.report.sample_size = value
                    .parse()
                    .with_context(|| format!("Invalid sample_size value: {}", value))?;
            }
            "risk.doctor_extreme_z" => updated.risk.doctor_extreme_z = parse_f64(key, value)?,
            "risk.doctor_high_z" => updated.risk.doctor_high_z = parse_f64(key, value)?,
            "risk.hospital_anomaly_z" => updated.risk.hospital_anomaly_z = parse_f64(key, value)?,
            "risk.concentration_pct" => updated.risk.concentration_pct = parse_f64(key, value)?,
            "risk.dominance_pct" => updated.risk.dominance_pct = parse_f64(key, value)?,
            "risk.upcoding_high_pct" => updated.risk.upcoding_high_pct = parse_f64(key, value)?,
            "risk.upcoding_moderate_pct" => {
                updated.risk.upcoding_moderate_pct = parse_f64(key, value)?
            }
            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `claimgraph config list` to see available keys.",
                    key
                ));
            }
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        KEYS.iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

fn parse_f64(key: &str, value: &str) -> anyhow::Result<f64> {
    let parsed: f64 = value
        .parse()
        .with_context(|| format!("Invalid value for {}: {}", key, value))?;
    if !parsed.is_finite() {
        return Err(anyhow!("{} must be a finite number", key));
    }
    Ok(parsed)
}
