use clap::Parser;
use client::prelude::*;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use syncer::{Settings, SyncDriver, SyncResult};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "allure-ado-sync")]
#[command(about = "Push Allure/ReportPortal test results into an Azure DevOps test run")]
struct Cli {
    /// Settings file (JSON, or TOML with a .toml extension). Prompts interactively when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Name of the test run to create
    #[arg(long)]
    run_name: Option<String>,
    /// HTTP request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Exit with a non-zero status when the sync fails
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let strict = cli.strict;

    if let Err(e) = run(cli).await {
        error!("Sync failed: {}", e);
        println!("[ERROR] {}", e);
        if strict {
            std::process::exit(1);
        }
    }
}

fn load_settings(cli: &Cli) -> SyncResult<Settings> {
    let mut settings = match &cli.config {
        Some(path) => {
            info!("Loading settings from {}", path.display());
            Settings::from_file(path)?
        }
        None => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut output = io::stdout();
            Settings::prompt(&mut input, &mut output)?
        }
    };

    if let Some(run_name) = &cli.run_name {
        settings = settings.with_run_name(run_name);
    }
    if let Some(secs) = cli.timeout_secs {
        settings = settings.with_timeout(Duration::from_secs(secs));
    }

    settings.validate()?;
    Ok(settings)
}

async fn run(cli: Cli) -> SyncResult<()> {
    let settings = load_settings(&cli)?;

    println!("Results URL: {}", settings.results_url);
    println!("ADO organization: {}", settings.organization_url);
    println!("ADO project: {}", settings.project);
    println!("ADO test plan: {}", settings.test_plan_id);
    println!("ADO test suite: {}", settings.test_suite_id);
    println!(
        "Statuses to update: {}",
        settings.statuses.iter().collect::<Vec<_>>().join(", ")
    );

    let source = AllureReportFetcher::new(settings.allure_config())?;
    let plans = AdoTestPlanClient::new(settings.ado_config())?;

    let driver = SyncDriver::new(&source, &plans, settings.sync_options());
    let report = driver.run().await?;

    println!("\n--- Sync Result ---");
    println!("{}", report);
    if !report.unmatched.is_empty() {
        println!("No result found for test cases: {:?}", report.unmatched);
    }
    if !report.failed_posts.is_empty() {
        println!("Failed to update test cases: {:?}", report.failed_posts);
    }

    Ok(())
}
