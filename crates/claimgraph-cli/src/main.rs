//! Claimgraph CLI - market benchmarks and outlier scoring for insurance claims

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use claimgraph_core::analysis::HospitalAnalysis;
use claimgraph_core::commands::{benchmark, graph, risk};
use claimgraph_core::config::Config;
use claimgraph_core::domain::graph::ScoredClaimSample;
use claimgraph_core::domain::risk::{CaseMixEntry, FinancialProfile};
use claimgraph_core::infrastructure::graph::{ClaimFilter, DoctorFilter, HospitalFilter};
use claimgraph_core::infrastructure::SqliteGraphStore;
use claimgraph_core::storage::{self, Database, DatabaseConfig};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "claimgraph")]
#[command(author, version, about = "Market benchmarks and outlier scoring for insurance claims", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Database file (overrides config and CLAIMGRAPH_DATABASE)
    #[arg(long, global = true)]
    database: Option<PathBuf>,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Import hospitals, doctors, procedures, diagnoses and claims from JSONL files
    Import {
        /// Directory containing the .jsonl files
        dir: PathBuf,
    },

    /// Export the graph to JSONL files
    Export {
        /// Target directory
        dir: PathBuf,
    },

    /// Market benchmarks and claim scoring
    Benchmark {
        #[command(subcommand)]
        action: BenchmarkAction,
    },

    /// Claiming-behavior analysis
    Analyze {
        #[command(subcommand)]
        action: AnalyzeAction,
    },

    /// Entity risk profiles
    Risk {
        #[command(subcommand)]
        action: RiskAction,
    },

    /// Query hospitals
    Hospitals {
        #[command(subcommand)]
        action: HospitalAction,
    },

    /// Query doctors
    Doctors {
        #[command(subcommand)]
        action: DoctorAction,
    },

    /// Query claims
    Claims {
        #[command(subcommand)]
        action: ClaimAction,
    },

    /// Query diagnoses
    Diagnoses {
        #[command(subcommand)]
        action: DiagnosisAction,
    },

    /// Query procedures
    Procedures {
        #[command(subcommand)]
        action: ProcedureAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum BenchmarkAction {
    /// Recompute all benchmarks and scores
    Run {
        /// Skip reading back the largest deviations
        #[arg(long)]
        no_verify: bool,
        /// Number of deviations to show (defaults to report.sample_size)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Recompute market benchmarks only
    Populate,
    /// Score claims against the stored benchmarks
    Score,
    /// Show the claims with the largest absolute z-score
    Verify {
        /// Number of claims to show (defaults to report.sample_size)
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[derive(Subcommand)]
enum AnalyzeAction {
    /// Average claim deviation per diagnosis at a hospital
    Hospital {
        /// Hospital ID
        id: String,
    },
}

#[derive(Subcommand)]
enum RiskAction {
    /// Doctor risk profile (by ID or exact name)
    Doctor { query: String },
    /// Hospital risk profile (by ID or exact name)
    Hospital { query: String },
    /// Claim cost versus its diagnosis reference cost
    Claim { id: String },
}

#[derive(Subcommand)]
enum HospitalAction {
    /// List hospitals
    List {
        /// Filter by class type
        #[arg(long)]
        class_type: Option<String>,
        /// Filter by specialty
        #[arg(long)]
        specialty: Option<String>,
    },
}

#[derive(Subcommand)]
enum DoctorAction {
    /// List doctors
    List {
        /// Filter by specialization
        #[arg(long)]
        specialization: Option<String>,
        /// Filter by primary hospital ID
        #[arg(long)]
        hospital: Option<String>,
    },
}

#[derive(Subcommand)]
enum ClaimAction {
    /// List claims
    List {
        /// Filter by status (e.g. FRAUD)
        #[arg(long)]
        status: Option<String>,
        /// Filter by hospital ID
        #[arg(long)]
        hospital: Option<String>,
        /// Filter by doctor ID
        #[arg(long)]
        doctor: Option<String>,
    },
    /// Show a claim
    Show { id: String },
}

#[derive(Subcommand)]
enum DiagnosisAction {
    /// List diagnoses with their market benchmarks
    List,
}

#[derive(Subcommand)]
enum ProcedureAction {
    /// List procedures
    List,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "claimgraph=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        report_error(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let out = Output {
        format: cli.format,
        quiet: cli.quiet,
    };
    let database = cli.database.as_deref();

    match cli.command {
        Commands::Import { dir } => {
            let db = open_database(database).await?;
            cmd_import(&db, &dir, out).await
        }
        Commands::Export { dir } => {
            let db = open_database(database).await?;
            cmd_export(&db, &dir, out).await
        }
        Commands::Benchmark { action } => {
            let config = Config::load()?;
            let db = open_database(database).await?;
            cmd_benchmark(&db, &config, action, out).await
        }
        Commands::Analyze { action } => {
            let db = open_database(database).await?;
            cmd_analyze(&db, action, out).await
        }
        Commands::Risk { action } => {
            let config = Config::load()?;
            let db = open_database(database).await?;
            cmd_risk(&db, &config, action, out).await
        }
        Commands::Hospitals { action } => {
            let db = open_database(database).await?;
            cmd_hospitals(&db, action, out).await
        }
        Commands::Doctors { action } => {
            let db = open_database(database).await?;
            cmd_doctors(&db, action, out).await
        }
        Commands::Claims { action } => {
            let db = open_database(database).await?;
            cmd_claims(&db, action, out).await
        }
        Commands::Diagnoses { action } => {
            let db = open_database(database).await?;
            cmd_diagnoses(&db, action, out).await
        }
        Commands::Procedures { action } => {
            let db = open_database(database).await?;
            cmd_procedures(&db, action, out).await
        }
        Commands::Config { action } => cmd_config(action, out.quiet),
        Commands::Doctor => cmd_doctor(database, out.quiet).await,
    }
}

fn report_error(error: &anyhow::Error) {
    match error.downcast_ref::<claimgraph_core::Error>() {
        Some(core) => eprintln!("Error [{}]: {}", core.code(), core),
        None => eprintln!("Error: {:#}", error),
    }
}

async fn open_database(path: Option<&Path>) -> anyhow::Result<Database> {
    let config = Config::load()?;
    let mut db_config = DatabaseConfig::from_config(&config);
    if let Some(path) = path {
        db_config.path = path.to_path_buf();
    }
    debug!(path = %db_config.path.display(), "Opening database");
    Database::new(db_config).await
}

// ============================================================================
// Output
// ============================================================================

#[derive(Clone, Copy)]
struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    /// Print `value` as JSON, or run `text` to render it for humans
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => text(),
        }
        Ok(())
    }

    fn status(&self, message: &str) {
        if !self.quiet && matches!(self.format, OutputFormat::Text) {
            println!("{}", message);
        }
    }
}

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn money(value: Option<f64>) -> String {
    opt(value.map(|v| format!("{:.2}", v)))
}

fn z(value: Option<f64>) -> String {
    opt(value.map(|v| format!("{:+.3}", v)))
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_import(db: &Database, dir: &Path, out: Output) -> anyhow::Result<()> {
    let store = SqliteGraphStore::new(db.pool().clone());
    let result = storage::import_from_jsonl(&store, dir).await?;

    out.emit(&result, || {
        for name in storage::GRAPH_FILES {
            let count = result.record_counts.get(*name).copied().unwrap_or(0);
            println!("{:<10} {}", name, count);
        }
        if !out.quiet {
            for warning in &result.warnings {
                println!("warning: {}", warning);
            }
            println!("Imported {} records.", result.total_records);
        }
    })
}

async fn cmd_export(db: &Database, dir: &Path, out: Output) -> anyhow::Result<()> {
    let store = SqliteGraphStore::new(db.pool().clone());
    let result = storage::export_to_jsonl(&store, dir).await?;

    out.emit(&result.metadata, || {
        for path in &result.files_written {
            println!("{}", path.display());
        }
        if !out.quiet {
            println!(
                "Exported {} records to {}",
                result.metadata.total_records,
                result.dir.display()
            );
        }
    })
}

async fn cmd_benchmark(
    db: &Database,
    config: &Config,
    action: BenchmarkAction,
    out: Output,
) -> anyhow::Result<()> {
    let pool = db.pool();
    let default_limit = config.report.sample_size;

    match action {
        BenchmarkAction::Run { no_verify, limit } => {
            out.status("Recomputing market benchmarks and claim scores...");
            let verify_limit = (!no_verify).then(|| limit.unwrap_or(default_limit));
            let report = benchmark::run(pool, verify_limit).await?;

            out.emit(&report, || {
                print_populate(&report.benchmarks);
                print_scores(&report.scores);
                if !report.samples.is_empty() {
                    println!();
                    print_samples(&report.samples);
                }
            })
        }
        BenchmarkAction::Populate => {
            let summary = benchmark::populate(pool).await?;
            out.emit(&summary, || print_populate(&summary))
        }
        BenchmarkAction::Score => {
            let summary = benchmark::score(pool).await?;
            if summary.processed == 0 {
                warn!(prerequisite = %summary.prerequisite, "Nothing scored");
            }
            out.emit(&summary, || print_scores(&summary))
        }
        BenchmarkAction::Verify { limit } => {
            let samples = benchmark::verify(pool, limit.unwrap_or(default_limit)).await?;
            out.emit(&samples, || {
                if samples.is_empty() {
                    println!("No scored claims. Run `claimgraph benchmark run` first.");
                } else {
                    print_samples(&samples);
                }
            })
        }
    }
}

fn print_populate(summary: &benchmark::PopulateSummary) {
    println!(
        "Benchmarks: {} diagnoses updated from {} claims",
        summary.diagnoses_updated, summary.claims_observed
    );
    if let Some(at) = summary.computed_at {
        println!("  Computed at: {}", at.to_rfc3339());
    }
}

fn print_scores(summary: &benchmark::ScoreSummary) {
    println!("Scores: {} claims processed", summary.processed);
    println!("  HIGH_OUTLIER:    {}", summary.breakdown.high_outlier);
    println!("  LOW_OUTLIER:     {}", summary.breakdown.low_outlier);
    println!("  NORMAL_VARIANCE: {}", summary.breakdown.normal_variance);
    if summary.processed == 0 {
        println!("  ({})", summary.prerequisite);
    }
}

fn print_samples(samples: &[ScoredClaimSample]) {
    println!(
        "{:<12} {:<28} {:>12} {:>12} {:>10} {:>8}  STATUS",
        "CLAIM", "DIAGNOSIS", "COST", "MARKET AVG", "STD DEV", "Z"
    );
    for s in samples {
        println!(
            "{:<12} {:<28} {:>12.2} {:>12.2} {:>10.2} {:>8}  {}",
            s.claim_id,
            s.diagnosis_name,
            s.total_cost,
            s.market_avg_cost,
            s.market_std_dev,
            z(Some(s.z_score)),
            opt(s.outlier_status)
        );
    }
}

async fn cmd_analyze(db: &Database, action: AnalyzeAction, out: Output) -> anyhow::Result<()> {
    match action {
        AnalyzeAction::Hospital { id } => {
            let analysis = benchmark::analyze_hospital(db.pool(), &id).await?;
            out.emit(&analysis, || print_analysis(&analysis, out.quiet))
        }
    }
}

fn print_analysis(analysis: &HospitalAnalysis, quiet: bool) {
    if !quiet {
        println!(
            "{} ({}) - {}",
            analysis.hospital_name.as_deref().unwrap_or("?"),
            analysis.hospital_id,
            analysis.analysis_type
        );
        println!();
    }
    println!("{:<10} {:<32} {:>7} {:>9}", "DIAGNOSIS", "NAME", "CLAIMS", "AVG Z");
    for d in &analysis.data {
        println!(
            "{:<10} {:<32} {:>7} {:>9}",
            d.diagnosis_id,
            d.diagnosis_name,
            d.total_claims,
            z(Some(d.z_score))
        );
    }
}

async fn cmd_risk(
    db: &Database,
    config: &Config,
    action: RiskAction,
    out: Output,
) -> anyhow::Result<()> {
    let pool = db.pool();

    match action {
        RiskAction::Doctor { query } => {
            let profile = risk::doctor_profile(pool, &query, &config.risk).await?;
            out.emit(&profile, || {
                println!("Doctor risk report: {} ({})", profile.name, profile.id);
                println!("  Specialty: {}", profile.specialization);
                print_financial(&profile.financial);
                print_case_mix(&profile.case_mix);
            })
        }
        RiskAction::Hospital { query } => {
            let profile = risk::hospital_profile(pool, &query, &config.risk).await?;
            out.emit(&profile, || {
                println!("Hospital risk report: {} ({})", profile.name, profile.id);
                let specialties = if profile.specialties.is_empty() {
                    "General".to_string()
                } else {
                    profile.specialties.join(", ")
                };
                println!("  Specialties: {}", specialties);
                print_financial(&profile.financial);
                print_case_mix(&profile.case_mix);
            })
        }
        RiskAction::Claim { id } => {
            let profile = risk::claim_profile(pool, &id, &config.risk).await?;
            out.emit(&profile, || {
                println!("Claim {}: {}", profile.id, profile.diagnosis_name);
                println!(
                    "  Cost: {} (reference {})",
                    money(profile.total_cost),
                    money(profile.reference_cost)
                );
                println!(
                    "  Variance: {}",
                    opt(profile.variance_pct.map(|v| format!("{:+.1}%", v)))
                );
                println!("  Verdict: {}", profile.verdict.label());
                println!(
                    "  Z-score: {} ({})",
                    z(profile.z_score),
                    opt(profile.outlier_status)
                );
                println!("  Status: {}", opt(profile.status.as_deref()));
                if !profile.required_procedures.is_empty() {
                    println!("  Required procedures:");
                    for p in &profile.required_procedures {
                        println!("    {} {} (avg {})", p.code, p.name, money(p.avg_cost));
                    }
                }
            })
        }
    }
}

fn print_financial(financial: &FinancialProfile) {
    println!("  Volume: {} claims", financial.volume);
    println!("  Avg claim: {}", money(financial.avg_cost));
    println!("  Z-score: {}", z(financial.z_score));
    println!("  Flag: {}", financial.flag.label());
}

fn print_case_mix(case_mix: &[CaseMixEntry]) {
    println!("  Case mix:");
    for entry in case_mix {
        let alerts: Vec<&str> = entry.alerts.iter().map(|a| a.label()).collect();
        let suffix = if alerts.is_empty() {
            String::new()
        } else {
            format!(" [{}]", alerts.join(", "))
        };
        println!(
            "  - {}: {:.1}% ({} claims){}",
            entry.diagnosis_name, entry.share_pct, entry.claims, suffix
        );
    }
}

async fn cmd_hospitals(db: &Database, action: HospitalAction, out: Output) -> anyhow::Result<()> {
    match action {
        HospitalAction::List {
            class_type,
            specialty,
        } => {
            let filter = HospitalFilter {
                class_type,
                specialty,
            };
            let hospitals = graph::list_hospitals(db.pool(), &filter).await?;
            out.emit(&hospitals, || {
                for h in &hospitals {
                    println!(
                        "{:<10} {:<32} {:<4} {}",
                        h.id,
                        h.name,
                        opt(h.class_type.as_deref()),
                        h.specialties.join(", ")
                    );
                }
                if !out.quiet {
                    println!("{} hospitals", hospitals.len());
                }
            })
        }
    }
}

async fn cmd_doctors(db: &Database, action: DoctorAction, out: Output) -> anyhow::Result<()> {
    match action {
        DoctorAction::List {
            specialization,
            hospital,
        } => {
            let filter = DoctorFilter {
                specialization,
                hospital_id: hospital,
            };
            let doctors = graph::list_doctors(db.pool(), &filter).await?;
            out.emit(&doctors, || {
                for d in &doctors {
                    println!(
                        "{:<10} {:<28} {:<16} {}",
                        d.id,
                        d.name,
                        d.specialization,
                        opt(d.primary_hospital_id.as_deref())
                    );
                }
                if !out.quiet {
                    println!("{} doctors", doctors.len());
                }
            })
        }
    }
}

async fn cmd_claims(db: &Database, action: ClaimAction, out: Output) -> anyhow::Result<()> {
    match action {
        ClaimAction::List {
            status,
            hospital,
            doctor,
        } => {
            let filter = ClaimFilter {
                status,
                hospital_id: hospital,
                doctor_id: doctor,
            };
            let claims = graph::list_claims(db.pool(), &filter).await?;
            out.emit(&claims, || {
                for c in &claims {
                    println!(
                        "{:<10} {:<8} {:>12} {:>8} {:<16} {}",
                        c.id,
                        opt(c.diagnosis_code.as_deref()),
                        money(c.total_cost),
                        z(c.z_score),
                        opt(c.outlier_status),
                        opt(c.status.as_deref())
                    );
                }
                if !out.quiet {
                    println!("{} claims", claims.len());
                }
            })
        }
        ClaimAction::Show { id } => {
            let claim = graph::get_claim(db.pool(), &id).await?;
            out.emit(&claim, || {
                println!("Claim:     {}", claim.id);
                println!("Hospital:  {}", opt(claim.hospital_id.as_deref()));
                println!("Doctor:    {}", opt(claim.doctor_id.as_deref()));
                println!("Diagnosis: {}", opt(claim.diagnosis_code.as_deref()));
                println!("Cost:      {}", money(claim.total_cost));
                println!("Status:    {}", opt(claim.status.as_deref()));
                println!("Z-score:   {}", z(claim.z_score));
                println!("Outlier:   {}", opt(claim.outlier_status));
            })
        }
    }
}

async fn cmd_diagnoses(db: &Database, action: DiagnosisAction, out: Output) -> anyhow::Result<()> {
    match action {
        DiagnosisAction::List => {
            let diagnoses = graph::list_diagnoses(db.pool()).await?;
            out.emit(&diagnoses, || {
                for d in &diagnoses {
                    println!(
                        "{:<8} {:<32} {:>12} {:>12} {:>10}",
                        d.code,
                        d.name,
                        money(d.reference_cost),
                        money(d.market_avg_cost),
                        money(d.market_std_dev)
                    );
                }
                if !out.quiet {
                    println!("{} diagnoses", diagnoses.len());
                }
            })
        }
    }
}

async fn cmd_procedures(db: &Database, action: ProcedureAction, out: Output) -> anyhow::Result<()> {
    match action {
        ProcedureAction::List => {
            let procedures = graph::list_procedures(db.pool()).await?;
            out.emit(&procedures, || {
                for p in &procedures {
                    println!("{:<8} {:<40} {:>12}", p.code, p.name, money(p.avg_cost));
                }
                if !out.quiet {
                    println!("{} procedures", procedures.len());
                }
            })
        }
    }
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(database: Option<&Path>, quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("Claimgraph Health Check");
        println!("=======================");
        println!();
    }

    let mut all_ok = true;

    // Check configuration
    match Config::load() {
        Ok(_) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
            }
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Configuration: Error - {:#}", e);
            }
        }
    }

    // Check config file location
    if !quiet {
        match Config::config_path() {
            Ok(path) if path.exists() => println!("[OK] Config file: {}", path.display()),
            Ok(path) => println!("[--] Config file: {} (using defaults)", path.display()),
            Err(e) => println!("[!!] Config file: Error - {}", e),
        }
    }

    // Check database
    match open_database(database).await {
        Ok(db) => match db.health_check().await {
            Ok(()) => {
                if !quiet {
                    println!("[OK] Database: Connected");
                    println!("     Path: {}", db.path().display());
                }

                match db.migration_status().await {
                    Ok(status) if status.needs_migration => {
                        all_ok = false;
                        if !quiet {
                            println!(
                                "[!!] Database: Migrations pending (v{} -> v{})",
                                status.current_version, status.target_version
                            );
                        }
                    }
                    Ok(status) => {
                        if !quiet {
                            println!("[OK] Database: Schema v{}", status.current_version);
                        }
                    }
                    Err(e) => {
                        all_ok = false;
                        if !quiet {
                            println!("[!!] Database: Migration check failed - {:#}", e);
                        }
                    }
                }

                if !quiet {
                    if let Ok(counts) = graph::graph_counts(db.pool()).await {
                        println!(
                            "     Hospitals: {}  Doctors: {}  Diagnoses: {}  Procedures: {}  Claims: {}",
                            counts.hospitals,
                            counts.doctors,
                            counts.diagnoses,
                            counts.procedures,
                            counts.claims
                        );
                        println!(
                            "     Benchmarked diagnoses: {}  Scored claims: {}",
                            counts.benchmarked_diagnoses, counts.scored_claims
                        );
                    }
                    match benchmark::prerequisite(db.pool()).await {
                        Ok(prerequisite) => println!("[--] Benchmarks: {}", prerequisite),
                        Err(e) => println!("[!!] Benchmarks: {}", e),
                    }
                }
            }
            Err(e) => {
                all_ok = false;
                if !quiet {
                    println!("[!!] Database: Health check failed - {:#}", e);
                }
            }
        },
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Database: Failed to initialize - {:#}", e);
            }
        }
    }

    // Summary
    if !quiet {
        println!();
        if all_ok {
            println!("All checks passed!");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_benchmark_run_flags() {
        let cli = Cli::try_parse_from(["claimgraph", "benchmark", "run", "--no-verify"]).unwrap();
        match cli.command {
            Commands::Benchmark {
                action: BenchmarkAction::Run { no_verify, limit },
            } => {
                assert!(no_verify);
                assert!(limit.is_none());
            }
            _ => panic!("expected benchmark run"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "claimgraph",
            "analyze",
            "hospital",
            "H1",
            "--format",
            "json",
            "--database",
            "/tmp/claims.db",
        ])
        .unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/claims.db")));
    }

    #[test]
    fn test_formatting_helpers() {
        assert_eq!(money(Some(1234.5)), "1234.50");
        assert_eq!(money(None), "-");
        assert_eq!(z(Some(3.0)), "+3.000");
        assert_eq!(z(Some(-0.25)), "-0.250");
    }
}
