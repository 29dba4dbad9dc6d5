use crate::demo::{run_demo, DemoArgs};
use crate::server;
use crate::submit::{run_submit, run_zip_lookup, SubmitArgs, ZipArgs};
use clap::{Args, Parser, Subcommand};
use guarantor_intake::config::AppConfig;
use guarantor_intake::error::AppError;
use guarantor_intake::telemetry;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Guarantor Intake",
    about = "Validate, autofill and submit guarantor intake forms from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the local sandbox endpoint (default command)
    Sandbox(SandboxArgs),
    /// Validate a saved form, resolve its ZIP codes and submit it
    Submit(SubmitArgs),
    /// Look up the city/state candidates for a ZIP code
    Zip(ZipArgs),
    /// Walk through a complete two-guarantor intake against an in-memory endpoint
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct SandboxArgs {
    /// Override the configured host for the sandbox server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the sandbox server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// CSV with `zip,city,state,county` rows (defaults to a small built-in table)
    #[arg(long)]
    pub(crate) zip_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Sandbox(SandboxArgs::default()));

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match command {
        Command::Sandbox(args) => server::run(config, args).await,
        Command::Submit(args) => run_submit(&config, args).await,
        Command::Zip(args) => run_zip_lookup(&config, args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
