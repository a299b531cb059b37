// Copyright (c) 2025 - Cowboy AI, Inc.
//! Edge Provisioning CLI
//!
//! Plans and simulates the base stack, and checks a published stack
//! contract the way the deployment pass reads it.
//!
//! Run with: cargo run --bin edge-provision -- plan --config stack.yaml
//!
//! Subcommands:
//! - `plan` prints the desired-state plan as JSON
//! - `simulate` applies the plan against the in-memory engine and writes the
//!   resulting contract
//! - `check-contract` validates a contract file, optionally together with
//!   the deployment parameters

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edge_infrastructure::{
    plan_base_stack, provision_base_stack, BaseStackOutputs, ContractImporter, DeploymentConfig,
    DeploymentInputs, InMemoryEngine, StackConfig,
};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "edge-provision", version, about = "Provision the edge base stack")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the desired-state plan as JSON
    Plan(EngineArgs),
    /// Apply against the in-memory engine and write the stack contract
    Simulate {
        #[command(flatten)]
        engine: EngineArgs,
        /// Where to write the contract; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate a stack contract file
    CheckContract {
        #[arg(long)]
        contract: PathBuf,
        /// Deployment parameters; also derives the image references
        #[arg(long, env = "EDGE_DEPLOYMENT_CONFIG")]
        deployment: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct EngineArgs {
    /// Stack file
    #[arg(long, env = "EDGE_STACK_CONFIG")]
    config: PathBuf,
    /// Placement zones the in-memory engine reports
    #[arg(long, value_delimiter = ',', default_value = "local-1a,local-1b,local-1c")]
    zones: Vec<String>,
    /// Pending polls before the in-memory engine issues a certificate
    #[arg(long, default_value_t = 0)]
    issue_after_polls: u32,
}

impl EngineArgs {
    fn load(&self) -> Result<(StackConfig, InMemoryEngine)> {
        let config = StackConfig::load(&self.config)
            .with_context(|| format!("Failed to load stack config {}", self.config.display()))?;
        info!("📋 Configuration loaded:");
        info!("  - Project: {}", config.project_name);
        info!("  - Environment: {}", config.environment);
        info!("  - VPC CIDR: {}", config.vpc_cidr);
        info!("  - Hosted zone: {}", config.hosted_zone_name);

        let engine = InMemoryEngine::new()
            .with_zones(self.zones.iter().map(String::as_str))
            .issue_after_polls(self.issue_after_polls);
        Ok((config, engine))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Plan(args) => plan(args).await,
        Command::Simulate { engine, output } => simulate(engine, output).await,
        Command::CheckContract {
            contract,
            deployment,
        } => check_contract(contract, deployment),
    }
}

async fn plan(args: EngineArgs) -> Result<()> {
    let (config, engine) = args.load()?;
    let plan = plan_base_stack(&config, &engine)
        .await
        .context("Failed to plan base stack")?;

    let rendered = json!({
        "resources": plan.stack.describe(),
        "contract": plan.contract.preview(),
    });
    println!("{}", serde_json::to_string_pretty(&rendered)?);

    info!("✅ Planned {} resources", plan.stack.len());
    Ok(())
}

async fn simulate(args: EngineArgs, output: Option<PathBuf>) -> Result<()> {
    let (config, engine) = args.load()?;
    let outcome = provision_base_stack(&config, &engine)
        .await
        .context("Provisioning run failed")?;

    let contract = outcome.contract.to_json_pretty()?;
    match output {
        Some(path) => {
            std::fs::write(&path, contract)
                .with_context(|| format!("Failed to write contract to {}", path.display()))?;
            info!("💾 Contract written to {}", path.display());
        }
        None => println!("{}", contract),
    }

    info!(
        "✅ Run {} created {} resources in {} levels",
        outcome.run_id, outcome.report.resources, outcome.report.levels
    );
    Ok(())
}

fn check_contract(contract: PathBuf, deployment: Option<PathBuf>) -> Result<()> {
    let text = std::fs::read_to_string(&contract)
        .with_context(|| format!("Failed to read contract {}", contract.display()))?;
    let importer = ContractImporter::from_json_str(&text, &contract.display().to_string())?;

    let outputs = BaseStackOutputs::import(&importer).context("Base stack contract is invalid")?;
    info!("✅ Contract valid for VPC {}", outputs.vpc_id);

    if let Some(path) = deployment {
        let config = DeploymentConfig::load(&path)
            .with_context(|| format!("Failed to load deployment config {}", path.display()))?;
        let inputs = DeploymentInputs::import(&importer, &config)
            .context("Deployment inputs are invalid")?;
        println!("{}", serde_json::to_string_pretty(&inputs)?);
    }

    Ok(())
}
