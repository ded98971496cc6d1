//! tvh - tabular verification harness
//!
//! Grades a candidate implementation of the load → clean → merge →
//! aggregate pipeline contract against a pair of CSV fixtures, printing
//! one report line per attempted stage. Exits 0 iff every attempted
//! stage passed.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tvh_candidate::{CandidateRegistry, ModuleLoader};
use tvh_core::RunContext;
use tvh_runner::PipelineRunner;

mod config;

#[derive(Parser, Debug)]
#[command(name = "tvh")]
#[command(version, about = "Verify a candidate tabular pipeline implementation")]
struct Cli {
    /// Path to the candidate source file
    candidate: PathBuf,

    /// Customers CSV fixture
    #[arg(long)]
    customers: PathBuf,

    /// Transactions CSV fixture
    #[arg(long)]
    transactions: PathBuf,

    /// Optional YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-stage watchdog budget in milliseconds (overrides config)
    #[arg(long)]
    stage_timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone())),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(all_passed) => {
            if all_passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("tvh: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let file_config = match &cli.config {
        Some(path) => config::FileConfig::load(path)?,
        None => config::FileConfig::default(),
    };
    let timeout_ms = cli.stage_timeout_ms.or(file_config.stage_timeout_ms);

    let mut ctx = RunContext::new(cli.customers.clone(), cli.transactions.clone());
    if let Some(ms) = timeout_ms {
        ctx = ctx.with_stage_timeout(Duration::from_millis(ms));
    }

    let registry = CandidateRegistry::with_samples();
    let loader = ModuleLoader::new(&registry);
    let report = match loader.load(&cli.candidate) {
        Ok(candidate) => PipelineRunner::new(&candidate, &ctx).run(),
        Err(err) => {
            // A candidate that cannot load still yields a visible report:
            // the one fatal Load line, nothing after it.
            let mut report = tvh_core::VerificationReport::new();
            report.push(tvh_core::StageResult::fail("Load", err.to_string()));
            report
        }
    };

    println!("{}", report.render());
    Ok(report.all_passed())
}
