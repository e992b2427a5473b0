//! Demonstration worker over the step execution engine.
//!
//! Drives processes persisted in a JSON state file through the shipped
//! executors, with all outbound side effects replaced by dry-run ports.
//! One `run` invocation is one polling pass, mirroring how a scheduled
//! production worker would call the execution service.

mod dry_run;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use sk_core::config::loader::load_worker_config;
use sk_core::config::models::WorkerConfig;
use sk_core::executors::{
    ExecutorRegistry, IdpDeletionExecutor, MailingExecutor, ProcessTypeExecutor,
};
use sk_core::persistence::{InMemoryProcessRepository, StoreSnapshot};
use sk_core::service::ProcessExecutionService;
use sk_protocol::{Process, ProcessStep, ProcessStepTypeId, ProcessTypeId, StepStatus};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::dry_run::{DryRunIdpClient, DryRunIdpStore, DryRunMailDelivery, DryRunMailStore};

const DEFAULT_STATE_FILE: &str = "steps-state.json";
const DEFAULT_CONFIG_FILE: &str = "step-worker.toml";

#[derive(Parser)]
#[command(name = "step-worker")]
#[command(about = "Drives pending process steps through their executors", long_about = None)]
struct Cli {
    /// Path to the JSON state file (default: steps-state.json)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Path to an optional TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tracing filter directives, overriding RUST_LOG
    #[arg(long, global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a demonstration state file with two pending processes
    Seed,

    /// Execute one processing pass over all active processes
    Run,

    /// Print every process and its steps
    List,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = load_worker_config(&config_path)?;

    let filter = cli.log_filter.or_else(|| config.log_filter.clone());
    init_tracing(filter.as_deref());

    let state_path = cli
        .state
        .or_else(|| config.state_file.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE));

    match cli.command {
        Commands::Seed => seed(&state_path),
        Commands::Run => run(&state_path, &config).await,
        Commands::List => list(&state_path),
    }
}

/// Explicit filter beats `RUST_LOG`; without either, default to `info`.
fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn seed(state_path: &Path) -> anyhow::Result<()> {
    let snapshot = demo_snapshot();
    save_state(state_path, &snapshot)?;
    println!(
        "{} wrote {} processes to {}",
        "seeded:".green().bold(),
        snapshot.processes.len(),
        state_path.display()
    );
    Ok(())
}

async fn run(state_path: &Path, config: &WorkerConfig) -> anyhow::Result<()> {
    let snapshot = load_state(state_path)?;
    let repository = Arc::new(InMemoryProcessRepository::from_snapshot(snapshot));
    let registry = Arc::new(build_registry(config)?);
    let service = ProcessExecutionService::new(registry, repository.clone());

    let cancellation = CancellationToken::new();
    let signal_token = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let summary = service.execute(cancellation).await?;
    save_state(state_path, &repository.snapshot())?;

    println!(
        "{} {} processes, {} units of work, {} commits",
        "pass complete:".green().bold(),
        summary.processes,
        summary.units_of_work,
        summary.commits
    );
    Ok(())
}

fn list(state_path: &Path) -> anyhow::Result<()> {
    let snapshot = load_state(state_path)?;
    let repository = InMemoryProcessRepository::from_snapshot(snapshot);

    let processes = repository.processes();
    if processes.is_empty() {
        println!("no processes in {}", state_path.display());
        return Ok(());
    }
    for process in processes {
        println!(
            "{} {} ({})",
            "process".cyan().bold(),
            process.id,
            process.process_type
        );
        for step in repository.steps_of(process.id) {
            match &step.message {
                Some(message) => println!(
                    "  {:<40} {} {}",
                    step.step_type,
                    colored_status(step.status),
                    message.dimmed()
                ),
                None => println!("  {:<40} {}", step.step_type, colored_status(step.status)),
            }
        }
    }
    Ok(())
}

/// Wire every shipped executor over its dry-run ports, restricted to
/// the configured process types when the configuration lists any.
fn build_registry(config: &WorkerConfig) -> anyhow::Result<ExecutorRegistry> {
    let mut executors: Vec<Arc<dyn ProcessTypeExecutor>> = vec![
        Arc::new(IdpDeletionExecutor::new(
            Arc::new(DryRunIdpStore),
            Arc::new(DryRunIdpClient),
        )),
        Arc::new(MailingExecutor::new(
            Arc::new(DryRunMailStore),
            Arc::new(DryRunMailDelivery),
        )),
    ];
    if let Some(process_types) = &config.process_types {
        executors.retain(|executor| process_types.contains(&executor.process_type()));
    }
    Ok(ExecutorRegistry::new(executors)?)
}

/// One identity-provider deletion and one mailing process, each with its
/// first step pending.
fn demo_snapshot() -> StoreSnapshot {
    let idp_process = Process::new(ProcessTypeId::IdentityProviderDeletion);
    let mail_process = Process::new(ProcessTypeId::Mailing);
    let steps = vec![
        ProcessStep::new(idp_process.id, ProcessStepTypeId::DeleteIdpSharedRealm),
        ProcessStep::new(mail_process.id, ProcessStepTypeId::SendMail),
    ];
    StoreSnapshot {
        processes: vec![idp_process, mail_process],
        steps,
    }
}

fn load_state(path: &Path) -> anyhow::Result<StoreSnapshot> {
    if !path.exists() {
        anyhow::bail!(
            "state file {} does not exist, run `step-worker seed` first",
            path.display()
        );
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read state file {}", path.display()))?;
    let snapshot = serde_json::from_str(&raw)
        .with_context(|| format!("state file {} is not valid JSON", path.display()))?;
    Ok(snapshot)
}

fn save_state(path: &Path, snapshot: &StoreSnapshot) -> anyhow::Result<()> {
    let raw = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, raw)
        .with_context(|| format!("failed to write state file {}", path.display()))?;
    Ok(())
}

fn colored_status(status: StepStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        StepStatus::Todo => text.yellow(),
        StepStatus::Done => text.green(),
        StepStatus::Failed => text.red(),
        StepStatus::Skipped => text.blue(),
        StepStatus::Duplicate => text.dimmed(),
    }
}
