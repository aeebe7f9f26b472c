//! CLI argument parsing for the provisioning workflow.
//!
//! The CLI only wires arguments into workflow steps; behavior lives in the
//! workflow modules.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 900;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "foundry",
    version,
    about = "Idempotent provisioning and validation of an Azure AI Foundry environment",
    after_help = "Commands:\n  provision [--dry-run]  Ensure every resource, secret and role, then validate\n  validate               Re-query the environment and report pass/fail checks\n  check                  Compare the resource group contents with the expected set\n  summary                Render the last persisted deployment and validation reports\n\nExamples:\n  foundry provision --dry-run\n  foundry provision --env-file prod.env --out-dir runs/prod\n  foundry validate --json\n  foundry summary --out-dir runs/prod",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level workflow commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Provision(ProvisionArgs),
    Validate(ValidateArgs),
    Check(CheckArgs),
    Summary(SummaryArgs),
}

impl Command {
    pub fn output(&self) -> &OutputArgs {
        match self {
            Command::Provision(args) => &args.settings.output,
            Command::Validate(args) => &args.settings.output,
            Command::Check(args) => &args.settings.output,
            Command::Summary(args) => &args.output,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Provision(_) => "provision",
            Command::Validate(_) => "validate",
            Command::Check(_) => "check",
            Command::Summary(_) => "summary",
        }
    }
}

/// Where artifacts go and how results are printed.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Directory for the log, reports, and history
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,

    /// Log at debug level
    #[arg(long)]
    pub verbose: bool,
}

/// Settings source and provider bounds shared by commands that talk to Azure.
#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
    /// Settings file in KEY=VALUE form (default: ./.env when present)
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Per-request timeout for Azure calls
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Upper bound for waiting on a long-running create
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_OPERATION_TIMEOUT_SECS)]
    pub operation_timeout_secs: u64,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Ensure every resource, secret and role assignment exists")]
pub struct ProvisionArgs {
    /// Validate configuration and print the plan without calling Azure
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Validate the deployed environment independently of any report")]
pub struct ValidateArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,
}

#[derive(Parser, Debug)]
#[command(about = "List the resource group and compare it with the expected resources")]
pub struct CheckArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Render the persisted deployment and validation reports")]
pub struct SummaryArgs {
    #[command(flatten)]
    pub output: OutputArgs,
}
